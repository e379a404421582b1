//! provider ノードのパース

use super::{first_string, first_u64, node_name};
use crate::error::Result;
use crate::model::ProviderConfig;
use kdl::KdlNode;

/// provider ノードをパース
pub fn parse_provider(node: &KdlNode) -> Result<(String, ProviderConfig)> {
    let name = node_name(node, "provider")?;

    let mut provider = ProviderConfig::named(name.clone());

    if let Some(children) = node.children() {
        for child in children.nodes() {
            match child.name().value() {
                "region" => provider.region = first_string(child),
                "poll-interval" | "poll_interval" => {
                    provider.poll_interval = first_u64(child, &name)?;
                }
                "converge-timeout" | "converge_timeout" => {
                    provider.converge_timeout = first_u64(child, &name)?;
                }
                "max-attempts" | "max_attempts" => {
                    provider.max_attempts = first_u64(child, &name)?
                        .map(|v| u32::try_from(v).unwrap_or(u32::MAX));
                }
                "observation-retries" | "observation_retries" => {
                    provider.observation_retries = first_u64(child, &name)?
                        .map(|v| u32::try_from(v).unwrap_or(u32::MAX));
                }
                // 追加設定はconfigに保存
                other => {
                    if let Some(value) = first_string(child) {
                        provider.config.insert(other.to_string(), value);
                    }
                }
            }
        }
    }

    Ok((name, provider))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_provider() {
        let kdl = r#"
            provider "aws" {
                region "eu-west-1"
                poll-interval 10
                converge-timeout 600
                max-attempts 30
                observation-retries 2
                profile "ops"
            }
        "#;
        let doc: kdl::KdlDocument = kdl.parse().unwrap();
        let node = doc.nodes().first().unwrap();

        let (name, provider) = parse_provider(node).unwrap();
        assert_eq!(name, "aws");
        assert_eq!(provider.region, Some("eu-west-1".to_string()));
        assert_eq!(provider.poll_interval, Some(10));
        assert_eq!(provider.converge_timeout, Some(600));
        assert_eq!(provider.max_attempts, Some(30));
        assert_eq!(provider.observation_retries, Some(2));
        assert_eq!(provider.config.get("profile"), Some(&"ops".to_string()));
    }

    #[test]
    fn test_parse_provider_rejects_negative_interval() {
        let doc: kdl::KdlDocument = r#"provider "aws" { poll-interval -5 }"#.parse().unwrap();
        let node = doc.nodes().first().unwrap();

        assert!(parse_provider(node).is_err());
    }
}
