//! fleet ノードのパース

use super::{first_bool, first_i32, first_string, node_name, parse_tags, string_arguments};
use crate::error::Result;
use crate::model::{DomainJoinInfo, FleetConfig, VpcConfig};
use kdl::KdlNode;

/// fleet ノードをパース
pub fn parse_fleet(node: &KdlNode) -> Result<(String, FleetConfig)> {
    let name = node_name(node, "fleet")?;

    let mut fleet = FleetConfig {
        name: name.clone(),
        desired_instances: 1,
        ..Default::default()
    };

    if let Some(children) = node.children() {
        for child in children.nodes() {
            match child.name().value() {
                "instance-type" | "instance_type" => {
                    fleet.instance_type = first_string(child).unwrap_or_default();
                }
                "image-arn" | "image_arn" => {
                    fleet.image_arn = first_string(child).unwrap_or_default();
                }
                "desired-instances" | "desired_instances" => {
                    if let Some(value) = first_i32(child, &name)? {
                        fleet.desired_instances = value;
                    }
                }
                "fleet-type" | "fleet_type" => fleet.fleet_type = first_string(child),
                "description" => fleet.description = first_string(child),
                "display-name" | "display_name" => fleet.display_name = first_string(child),
                "disconnect-timeout" | "disconnect_timeout" => {
                    fleet.disconnect_timeout = first_i32(child, &name)?;
                }
                "max-user-duration" | "max_user_duration" => {
                    fleet.max_user_duration = first_i32(child, &name)?;
                }
                "enable-default-internet-access" | "enable_default_internet_access" => {
                    fleet.enable_default_internet_access = first_bool(child);
                }
                "stack" | "stack-name" | "stack_name" => fleet.stack_name = first_string(child),
                "state" => fleet.state = first_string(child),
                "vpc" | "vpc-config" | "vpc_config" => fleet.vpc = Some(parse_vpc(child)),
                "domain" | "domain-info" | "domain_info" => {
                    fleet.domain = Some(parse_domain(child));
                }
                "tags" => fleet.tags = parse_tags(child),
                other => {
                    tracing::debug!("Unknown fleet attribute '{}' in {}", other, name);
                }
            }
        }
    }

    Ok((name, fleet))
}

/// vpc ブロックをパース
///
/// ID はカンマ区切りの文字列でも、複数の引数でも指定できる
fn parse_vpc(node: &KdlNode) -> VpcConfig {
    let mut vpc = VpcConfig::default();
    if let Some(children) = node.children() {
        for child in children.nodes() {
            let ids: Vec<String> = string_arguments(child)
                .iter()
                .flat_map(|arg| VpcConfig::split_ids(arg))
                .collect();
            match child.name().value() {
                "subnet-ids" | "subnet_ids" => vpc.subnet_ids = ids,
                "security-group-ids" | "security_group_ids" => vpc.security_group_ids = ids,
                _ => {}
            }
        }
    }
    vpc
}

/// domain ブロックをパース
fn parse_domain(node: &KdlNode) -> DomainJoinInfo {
    let mut domain = DomainJoinInfo::default();
    if let Some(children) = node.children() {
        for child in children.nodes() {
            match child.name().value() {
                "directory-name" | "directory_name" => domain.directory_name = first_string(child),
                "ou" | "organizational-unit" | "organizational_unit_distinguished_name" => {
                    domain.organizational_unit = first_string(child);
                }
                _ => {}
            }
        }
    }
    domain
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(kdl: &str) -> (String, FleetConfig) {
        let doc: kdl::KdlDocument = kdl.parse().unwrap();
        parse_fleet(doc.nodes().first().unwrap()).unwrap()
    }

    #[test]
    fn test_parse_fleet() {
        let (name, fleet) = parse(
            r#"
            fleet "analysts" {
                instance-type "stream.standard.medium"
                image-arn "arn:aws:appstream:eu-west-1::image/Base"
                fleet-type "ON_DEMAND"
                desired-instances 2
                disconnect-timeout 900
                max-user-duration 7200
                enable-default-internet-access #false
                stack "analysts"
                state "RUNNING"
            }
        "#,
        );
        assert_eq!(name, "analysts");
        assert_eq!(fleet.instance_type, "stream.standard.medium");
        assert_eq!(fleet.image_arn, "arn:aws:appstream:eu-west-1::image/Base");
        assert_eq!(fleet.fleet_type.as_deref(), Some("ON_DEMAND"));
        assert_eq!(fleet.desired_instances, 2);
        assert_eq!(fleet.disconnect_timeout, Some(900));
        assert_eq!(fleet.max_user_duration, Some(7200));
        assert_eq!(fleet.enable_default_internet_access, Some(false));
        assert_eq!(fleet.stack_name.as_deref(), Some("analysts"));
        assert_eq!(fleet.state.as_deref(), Some("RUNNING"));
    }

    #[test]
    fn test_desired_instances_defaults_to_one() {
        let (_, fleet) = parse(r#"fleet "a" { instance-type "t"; image-arn "i" }"#);
        assert_eq!(fleet.desired_instances, 1);
        assert!(fleet.state.is_none());
    }

    #[test]
    fn test_parse_vpc_comma_separated_and_arguments() {
        let (_, fleet) = parse(
            r#"
            fleet "analysts" {
                vpc {
                    subnet-ids "subnet-1, subnet-2"
                    security-group-ids "sg-1" "sg-2"
                }
            }
        "#,
        );
        let vpc = fleet.vpc.unwrap();
        assert_eq!(vpc.subnet_ids, vec!["subnet-1", "subnet-2"]);
        assert_eq!(vpc.security_group_ids, vec!["sg-1", "sg-2"]);
    }

    #[test]
    fn test_parse_domain_and_tags() {
        let (_, fleet) = parse(
            r#"
            fleet "analysts" {
                domain {
                    directory-name "corp.example.com"
                    ou "OU=desktops,DC=corp"
                }
                tags {
                    team "data"
                    env "prod"
                }
            }
        "#,
        );
        let domain = fleet.domain.unwrap();
        assert_eq!(domain.directory_name.as_deref(), Some("corp.example.com"));
        assert_eq!(
            domain.organizational_unit.as_deref(),
            Some("OU=desktops,DC=corp")
        );
        assert_eq!(fleet.tags.get("team"), Some(&"data".to_string()));
        assert_eq!(fleet.tags.len(), 2);
    }

    #[test]
    fn test_fleet_requires_name() {
        let doc: kdl::KdlDocument = r#"fleet { instance-type "t" }"#.parse().unwrap();
        assert!(parse_fleet(doc.nodes().first().unwrap()).is_err());
    }
}
