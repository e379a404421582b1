//! モデル定義
//!
//! 宣言ファイルで扱うプロジェクト、プロバイダー、スタック、フリートを定義します。

mod fleet;
mod project;
mod provider;
mod stack;

// Re-exports
pub use fleet::*;
pub use project::*;
pub use provider::*;
pub use stack::*;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProjectError;

    fn project_with_fleet(fleet: FleetConfig) -> Project {
        let mut project = Project::new("desktops");
        project.fleets.insert(fleet.name.clone(), fleet);
        project
    }

    #[test]
    fn test_provider_defaults_to_aws() {
        let project = Project::new("desktops");
        let provider = project.provider();
        assert_eq!(provider.name, "aws");
        assert!(provider.region.is_none());
    }

    #[test]
    fn test_validate_accepts_minimal_fleet() {
        let project = project_with_fleet(FleetConfig::new(
            "analysts",
            "stream.standard.small",
            "arn:aws:appstream:eu-west-1::image/Base",
        ));
        assert!(project.validate().is_ok());
    }

    #[test]
    fn test_validate_requires_image() {
        let project = project_with_fleet(FleetConfig::new("analysts", "stream.standard.small", ""));
        assert!(matches!(
            project.validate(),
            Err(ProjectError::MissingImage(name)) if name == "analysts"
        ));
    }

    #[test]
    fn test_validate_rejects_negative_capacity() {
        let mut fleet = FleetConfig::new("analysts", "stream.standard.small", "arn:image");
        fleet.desired_instances = -1;
        assert!(matches!(
            project_with_fleet(fleet).validate(),
            Err(ProjectError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_unknown_permission() {
        let mut project = Project::new("desktops");
        let mut stack = StackConfig::new("analysts");
        stack.user_settings.file_upload = Some("SOMETIMES".to_string());
        project.stacks.insert("analysts".to_string(), stack);

        let err = project.validate().unwrap_err();
        assert!(err.to_string().contains("SOMETIMES"));
    }

    #[test]
    fn test_validate_rejects_zero_poll_interval() {
        let mut project = Project::new("desktops");
        let mut provider = ProviderConfig::named("aws");
        provider.poll_interval = Some(0);
        project.providers.insert("aws".to_string(), provider);

        let err = project.validate().unwrap_err();
        assert!(matches!(
            &err,
            ProjectError::InvalidValue { field, .. } if field == "poll-interval"
        ));
    }

    #[test]
    fn test_validate_leaves_state_to_convergence() {
        let mut fleet = FleetConfig::new("analysts", "stream.standard.small", "arn:image");
        fleet.state = Some("STOPPING".to_string());
        assert!(project_with_fleet(fleet).validate().is_ok());
    }

    #[test]
    fn test_split_ids_trims_and_skips_empty() {
        assert_eq!(
            VpcConfig::split_ids(" subnet-1, subnet-2 ,,"),
            vec!["subnet-1".to_string(), "subnet-2".to_string()]
        );
    }

    #[test]
    fn test_user_settings_actions() {
        let settings = UserSettings {
            file_download: Some("ENABLED".to_string()),
            copy_to_local: Some("DISABLED".to_string()),
            ..Default::default()
        };
        assert_eq!(
            settings.actions(),
            vec![
                ("FILE_DOWNLOAD", "ENABLED"),
                ("CLIPBOARD_COPY_TO_LOCAL_DEVICE", "DISABLED"),
            ]
        );
        assert!(UserSettings::default().is_empty());
    }

    #[test]
    fn test_fleet_serialization_roundtrip() {
        let mut fleet = FleetConfig::new("analysts", "stream.standard.small", "arn:image");
        fleet.tags.insert("team".to_string(), "data".to_string());

        let json = serde_json::to_value(&fleet).unwrap();
        assert_eq!(json["instance_type"], "stream.standard.small");

        let back: FleetConfig = serde_json::from_value(json).unwrap();
        assert_eq!(back, fleet);
    }
}
