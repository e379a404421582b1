use super::*;
use crate::error::ProjectError;

const FULL: &str = r#"
project "desktops"

provider "aws" {
    region "eu-west-1"
    poll-interval 20
    converge-timeout 3600
}

stack "analysts" {
    description "Analyst desktop"
    storage-connector "HOMEFOLDERS"
    user-settings {
        file-download "ENABLED"
    }
}

fleet "analysts" {
    instance-type "stream.standard.medium"
    image-arn "arn:aws:appstream:eu-west-1::image/Base"
    desired-instances 2
    stack "analysts"
    state "RUNNING"
}

fleet "batch" {
    instance-type "stream.standard.small"
    image-arn "arn:aws:appstream:eu-west-1::image/Base"
    state "STOPPED"
}
"#;

#[test]
fn test_parse_full_project() {
    let project = parse_kdl_string(FULL, "fallback".to_string()).unwrap();

    assert_eq!(project.name, "desktops");
    assert_eq!(project.provider().region.as_deref(), Some("eu-west-1"));
    assert_eq!(project.stacks.len(), 1);
    assert_eq!(project.fleets.len(), 2);

    let names: Vec<&String> = project.fleets.keys().collect();
    assert_eq!(names, vec!["analysts", "batch"]);
    assert_eq!(
        project.fleet("analysts").unwrap().stack_name.as_deref(),
        Some("analysts")
    );
    assert!(project.validate().is_ok());
}

#[test]
fn test_project_name_falls_back_to_default() {
    let project = parse_kdl_string(r#"stack "s""#, "fallback".to_string()).unwrap();
    assert_eq!(project.name, "fallback");
}

#[test]
fn test_duplicate_fleet_is_rejected() {
    let kdl = r#"
        fleet "a" { instance-type "t"; image-arn "i" }
        fleet "a" { instance-type "t"; image-arn "i" }
    "#;
    let result = parse_kdl_string(kdl, "test".to_string());
    assert!(matches!(
        result,
        Err(ProjectError::Duplicate { kind: "fleet", .. })
    ));
}

#[test]
fn test_unknown_nodes_are_skipped() {
    let kdl = r#"
        variables { region "x" }
        stack "s"
    "#;
    let project = parse_kdl_string(kdl, "test".to_string()).unwrap();
    assert_eq!(project.stacks.len(), 1);
}

#[test]
fn test_invalid_kdl_is_a_parse_error() {
    let result = parse_kdl_string("fleet \"a\" {", "test".to_string());
    assert!(matches!(result, Err(ProjectError::KdlParse(_))));
}

#[test]
fn test_parse_kdl_file_uses_directory_name() {
    let dir = tempfile::tempdir().unwrap();
    let project_dir = dir.path().join("desktops");
    std::fs::create_dir(&project_dir).unwrap();
    let path = project_dir.join("appstream.kdl");
    std::fs::write(&path, r#"stack "s""#).unwrap();

    let project = parse_kdl_file(&path).unwrap();
    assert_eq!(project.name, "desktops");
}

#[test]
fn test_parse_missing_file() {
    let result = parse_kdl_file("/nonexistent/appstream.kdl");
    assert!(matches!(result, Err(ProjectError::IoError { .. })));
}
