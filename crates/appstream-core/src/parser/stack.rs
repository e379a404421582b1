//! stack ノードのパース

use super::{first_string, node_name, parse_tags};
use crate::error::Result;
use crate::model::{StackConfig, StorageConnectorConfig, UserSettings};
use kdl::KdlNode;

/// stack ノードをパース
pub fn parse_stack(node: &KdlNode) -> Result<(String, StackConfig)> {
    let name = node_name(node, "stack")?;

    let mut stack = StackConfig::new(name.clone());

    if let Some(children) = node.children() {
        for child in children.nodes() {
            match child.name().value() {
                "description" => stack.description = first_string(child),
                "display-name" | "display_name" => stack.display_name = first_string(child),
                "feedback-url" | "feedback_url" => stack.feedback_url = first_string(child),
                "redirect-url" | "redirect_url" => stack.redirect_url = first_string(child),
                "storage-connector" | "storage_connector" => {
                    // 例: storage-connector "ONE_DRIVE" resource-identifier="corp.example.com"
                    if let Some(connector_type) = first_string(child) {
                        let resource_identifier = child
                            .get("resource-identifier")
                            .and_then(|v| v.as_string())
                            .map(|s| s.to_string());
                        stack.storage_connectors.push(StorageConnectorConfig {
                            connector_type,
                            resource_identifier,
                        });
                    }
                }
                "user-settings" | "user_settings" => {
                    stack.user_settings = parse_user_settings(child);
                }
                "tags" => stack.tags = parse_tags(child),
                other => {
                    tracing::debug!("Unknown stack attribute '{}' in {}", other, name);
                }
            }
        }
    }

    Ok((name, stack))
}

/// user-settings ブロックをパース
fn parse_user_settings(node: &KdlNode) -> UserSettings {
    let mut settings = UserSettings::default();
    if let Some(children) = node.children() {
        for child in children.nodes() {
            let permission = first_string(child).map(|p| p.to_ascii_uppercase());
            match child.name().value() {
                "file-download" | "file_download" => settings.file_download = permission,
                "file-upload" | "file_upload" => settings.file_upload = permission,
                "copy-from-local" | "copy_from_local" => settings.copy_from_local = permission,
                "copy-to-local" | "copy_to_local" => settings.copy_to_local = permission,
                "allow-local-device-printing" | "allow_local_device_printing" => {
                    settings.allow_local_device_printing = permission;
                }
                _ => {}
            }
        }
    }
    settings
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_stack() {
        let kdl = r#"
            stack "analysts" {
                description "Analyst desktop"
                display-name "Analysts"
                feedback-url "https://example.com/feedback"
                redirect-url "https://example.com"
                storage-connector "HOMEFOLDERS"
                storage-connector "ONE_DRIVE" resource-identifier="corp.example.com"
                user-settings {
                    file-download "enabled"
                    copy-to-local "DISABLED"
                }
                tags {
                    team "data"
                }
            }
        "#;
        let doc: kdl::KdlDocument = kdl.parse().unwrap();
        let (name, stack) = parse_stack(doc.nodes().first().unwrap()).unwrap();

        assert_eq!(name, "analysts");
        assert_eq!(stack.description.as_deref(), Some("Analyst desktop"));
        assert_eq!(stack.display_name.as_deref(), Some("Analysts"));
        assert_eq!(
            stack.feedback_url.as_deref(),
            Some("https://example.com/feedback")
        );
        assert_eq!(stack.redirect_url.as_deref(), Some("https://example.com"));
        assert_eq!(stack.storage_connectors.len(), 2);
        assert_eq!(stack.storage_connectors[0].connector_type, "HOMEFOLDERS");
        assert_eq!(
            stack.storage_connectors[1].resource_identifier.as_deref(),
            Some("corp.example.com")
        );
        assert_eq!(stack.user_settings.file_download.as_deref(), Some("ENABLED"));
        assert_eq!(stack.user_settings.copy_to_local.as_deref(), Some("DISABLED"));
        assert!(stack.user_settings.file_upload.is_none());
        assert_eq!(stack.tags.get("team"), Some(&"data".to_string()));
    }

    #[test]
    fn test_parse_empty_stack() {
        let doc: kdl::KdlDocument = r#"stack "bare""#.parse().unwrap();
        let (_, stack) = parse_stack(doc.nodes().first().unwrap()).unwrap();
        assert!(stack.storage_connectors.is_empty());
        assert!(stack.user_settings.is_empty());
    }
}
