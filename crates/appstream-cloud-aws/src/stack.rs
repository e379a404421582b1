//! Stack resource mapper

use crate::api::{AppStreamApi, StackDescription, StackUpdate, sync_tags};
use appstream_cloud::{CloudError, Result, TagDiff, Tags};
use appstream_core::{StackConfig, StorageConnectorConfig, UserSettings};

/// A stack with its tags
#[derive(Debug, Clone, PartialEq)]
pub struct StackRecord {
    pub stack: StackDescription,
    pub tags: Tags,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StackChanges {
    pub update: StackUpdate,
    pub tags: TagDiff,
}

impl StackChanges {
    pub fn changed_fields(&self) -> Vec<String> {
        let mut fields = self.update.changed_fields();
        if !self.tags.is_empty() {
            fields.push("tags".to_string());
        }
        fields
    }

    pub fn is_empty(&self) -> bool {
        self.changed_fields().is_empty()
    }
}

/// Compare a declared stack with its remote counterpart
pub fn diff_stack(config: &StackConfig, remote: &StackRecord) -> StackChanges {
    let stack = &remote.stack;
    let mut update = StackUpdate::new(&config.name);

    update.description = changed(&config.description, &stack.description);
    update.display_name = changed(&config.display_name, &stack.display_name);
    update.feedback_url = changed(&config.feedback_url, &stack.feedback_url);
    update.redirect_url = changed(&config.redirect_url, &stack.redirect_url);

    if !config.storage_connectors.is_empty()
        && sorted_connectors(&config.storage_connectors) != sorted_connectors(&stack.storage_connectors)
    {
        update.storage_connectors = Some(config.storage_connectors.clone());
    }
    if !settings_match(&config.user_settings, &stack.user_settings) {
        update.user_settings = Some(config.user_settings.clone());
    }

    StackChanges {
        update,
        tags: TagDiff::between(&remote.tags, &Tags::from(config.tags.clone())),
    }
}

fn changed(declared: &Option<String>, remote: &Option<String>) -> Option<String> {
    match declared {
        Some(value) if remote.as_ref() != Some(value) => Some(value.clone()),
        _ => None,
    }
}

fn sorted_connectors(connectors: &[StorageConnectorConfig]) -> Vec<(String, Option<String>)> {
    let mut keyed: Vec<_> = connectors
        .iter()
        .map(|c| (c.connector_type.clone(), c.resource_identifier.clone()))
        .collect();
    keyed.sort();
    keyed
}

/// Every declared permission is already in effect remotely
fn settings_match(declared: &UserSettings, remote: &UserSettings) -> bool {
    let remote = remote.actions();
    declared
        .actions()
        .iter()
        .all(|(action, permission)| remote.iter().any(|(a, p)| a == action && p == permission))
}

/// Stack CRUD against an [`AppStreamApi`]
pub struct StackMapper<'a> {
    api: &'a dyn AppStreamApi,
}

impl<'a> StackMapper<'a> {
    pub fn new(api: &'a dyn AppStreamApi) -> Self {
        Self { api }
    }

    pub async fn read(&self, name: &str) -> Result<Option<StackRecord>> {
        let Some(stack) = self.api.describe_stack(name).await? else {
            return Ok(None);
        };
        let tags = match &stack.arn {
            Some(arn) => self.api.list_tags(arn).await?.ignore_aws(),
            None => Tags::new(),
        };
        Ok(Some(StackRecord { stack, tags }))
    }

    pub async fn create(&self, config: &StackConfig) -> Result<StackRecord> {
        tracing::info!("Creating stack: {}", config.name);
        let created = self.api.create_stack(config).await?;

        let tags = Tags::from(config.tags.clone()).ignore_aws();
        if !tags.is_empty() {
            let arn = created
                .arn
                .clone()
                .ok_or_else(|| CloudError::ApiError(format!("stack {} has no ARN", config.name)))?;
            sync_tags(self.api, &arn, &TagDiff::between(&Tags::new(), &tags)).await?;
        }

        self.read(&config.name)
            .await?
            .ok_or_else(|| CloudError::ResourceNotFound(config.name.clone()))
    }

    pub async fn update(&self, config: &StackConfig) -> Result<StackRecord> {
        let record = self
            .read(&config.name)
            .await?
            .ok_or_else(|| CloudError::ResourceNotFound(config.name.clone()))?;
        let changes = diff_stack(config, &record);
        if changes.is_empty() {
            tracing::debug!("Stack {} is up to date", config.name);
            return Ok(record);
        }

        if !changes.update.is_empty() {
            tracing::info!(
                "Updating stack {}: {}",
                config.name,
                changes.update.changed_fields().join(", ")
            );
            self.api.update_stack(&changes.update).await?;
        }
        if !changes.tags.is_empty()
            && let Some(arn) = &record.stack.arn
        {
            sync_tags(self.api, arn, &changes.tags).await?;
        }

        self.read(&config.name)
            .await?
            .ok_or_else(|| CloudError::ResourceNotFound(config.name.clone()))
    }

    /// Returns `false` when the stack did not exist
    pub async fn delete(&self, name: &str) -> Result<bool> {
        if self.api.describe_stack(name).await?.is_none() {
            tracing::debug!("Stack {} does not exist, nothing to delete", name);
            return Ok(false);
        }
        tracing::info!("Deleting stack: {}", name);
        self.api.delete_stack(name).await?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{MockAppStream, stack_description};

    fn connector(kind: &str) -> StorageConnectorConfig {
        StorageConnectorConfig {
            connector_type: kind.to_string(),
            resource_identifier: None,
        }
    }

    #[tokio::test]
    async fn test_create_tags_after_create() {
        let api = MockAppStream::new();
        let mapper = StackMapper::new(&api);

        let mut config = StackConfig::new("analysts");
        config.redirect_url = Some("https://example.com/bye".to_string());
        config.tags.insert("team".to_string(), "data".to_string());

        let record = mapper.create(&config).await.unwrap();

        assert_eq!(api.calls(), vec!["CreateStack analysts", "TagResource analysts"]);
        assert_eq!(
            record.stack.redirect_url.as_deref(),
            Some("https://example.com/bye")
        );
        assert_eq!(api.stack_tags("analysts").get("team"), Some("data"));
    }

    #[tokio::test]
    async fn test_update_changes_only_declared_fields() {
        let mut remote = stack_description("analysts");
        remote.description = Some("kept".to_string());
        let api = MockAppStream::new().with_stack(remote);
        let mapper = StackMapper::new(&api);

        let mut config = StackConfig::new("analysts");
        config.storage_connectors = vec![connector("HOMEFOLDERS")];
        config.user_settings.file_download = Some("DISABLED".to_string());

        let record = mapper.update(&config).await.unwrap();

        assert_eq!(api.calls(), vec!["UpdateStack analysts"]);
        assert_eq!(record.stack.description.as_deref(), Some("kept"));
        assert_eq!(record.stack.storage_connectors, vec![connector("HOMEFOLDERS")]);
    }

    #[tokio::test]
    async fn test_update_in_sync_makes_no_calls() {
        let mut remote = stack_description("analysts");
        remote.storage_connectors = vec![connector("ONE_DRIVE"), connector("HOMEFOLDERS")];
        remote.user_settings.file_upload = Some("ENABLED".to_string());
        remote.user_settings.file_download = Some("ENABLED".to_string());
        let api = MockAppStream::new().with_stack(remote);
        let mapper = StackMapper::new(&api);

        let mut config = StackConfig::new("analysts");
        config.storage_connectors = vec![connector("HOMEFOLDERS"), connector("ONE_DRIVE")];
        config.user_settings.file_upload = Some("ENABLED".to_string());

        mapper.update(&config).await.unwrap();
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn test_delete_missing_stack_is_noop() {
        let api = MockAppStream::new();
        let mapper = StackMapper::new(&api);

        assert!(!mapper.delete("ghost").await.unwrap());
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn test_delete_existing_stack() {
        let api = MockAppStream::new().with_stack(stack_description("analysts"));
        let mapper = StackMapper::new(&api);

        assert!(mapper.delete("analysts").await.unwrap());
        assert_eq!(api.calls(), vec!["DeleteStack analysts"]);
        assert!(api.stack("analysts").is_none());
    }

    #[test]
    fn test_diff_reports_tags() {
        let record = StackRecord {
            stack: stack_description("analysts"),
            tags: [("team", "data")].into_iter().collect(),
        };
        let config = StackConfig::new("analysts");

        let changes = diff_stack(&config, &record);
        assert_eq!(changes.changed_fields(), vec!["tags"]);
        assert_eq!(changes.tags.remove, vec!["team".to_string()]);
    }
}
