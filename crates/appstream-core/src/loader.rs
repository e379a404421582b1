//! 統合ローダー
//!
//! パースと検証をまとめて行う

use crate::error::Result;
use crate::model::Project;
use crate::parser::parse_kdl_file;
use std::path::Path;
use tracing::{info, instrument};

/// 宣言ファイルを読み込み、検証済みの Project を返す
#[instrument(skip(path), fields(path = %path.display()))]
pub fn load_project(path: &Path) -> Result<Project> {
    let project = parse_kdl_file(path)?;
    project.validate()?;
    info!(
        stacks = project.stacks.len(),
        fleets = project.fleets.len(),
        "Project loaded successfully"
    );
    Ok(project)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProjectError;

    #[test]
    fn test_load_project_validates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("appstream.kdl");
        std::fs::write(&path, r#"fleet "a" { instance-type "stream.standard.small" }"#).unwrap();

        let result = load_project(&path);
        assert!(matches!(result, Err(ProjectError::MissingImage(name)) if name == "a"));
    }

    #[test]
    fn test_load_project() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("appstream.kdl");
        std::fs::write(
            &path,
            r#"
            project "desktops"
            fleet "a" {
                instance-type "stream.standard.small"
                image-arn "arn:image"
            }
            "#,
        )
        .unwrap();

        let project = load_project(&path).unwrap();
        assert_eq!(project.name, "desktops");
        assert_eq!(project.fleets.len(), 1);
    }
}
