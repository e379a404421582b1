//! KDLパーサー
//!
//! AppStream の宣言ファイル（KDL）をパースします。
//! 各ノードタイプのパース処理はモジュールに分離されています。

mod fleet;
mod provider;
mod stack;

use fleet::parse_fleet;
use provider::parse_provider;
use stack::parse_stack;

use crate::error::{ProjectError, Result};
use crate::model::Project;
use kdl::{KdlDocument, KdlNode};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// KDLファイルをパースしてProjectを生成
pub fn parse_kdl_file<P: AsRef<Path>>(path: P) -> Result<Project> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|e| ProjectError::IoError {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    let name = path
        .parent()
        .and_then(|p| p.file_name())
        .and_then(|n| n.to_str())
        .unwrap_or("unnamed")
        .to_string();
    parse_kdl_string(&content, name)
}

/// KDL文字列をパース
pub fn parse_kdl_string(content: &str, default_name: String) -> Result<Project> {
    let doc: KdlDocument = content.parse()?;

    let mut project = Project::new(default_name);

    for node in doc.nodes() {
        match node.name().value() {
            "project" => {
                if let Some(name) = first_string(node) {
                    project.name = name;
                }
            }
            "provider" => {
                let (name, provider) = parse_provider(node)?;
                project.providers.insert(name, provider);
            }
            "stack" => {
                let (name, stack) = parse_stack(node)?;
                insert_unique(&mut project.stacks, "stack", name, stack)?;
            }
            "fleet" => {
                let (name, fleet) = parse_fleet(node)?;
                insert_unique(&mut project.fleets, "fleet", name, fleet)?;
            }
            other => {
                // 不明なノードはスキップ
                tracing::debug!("Skipping unknown node: {}", other);
            }
        }
    }

    Ok(project)
}

fn insert_unique<T>(
    map: &mut BTreeMap<String, T>,
    kind: &'static str,
    name: String,
    value: T,
) -> Result<()> {
    if map.contains_key(&name) {
        return Err(ProjectError::Duplicate { kind, name });
    }
    map.insert(name, value);
    Ok(())
}

/// ノードの名前引数（`fleet "name" { ... }` の "name"）を取得
fn node_name(node: &KdlNode, kind: &str) -> Result<String> {
    first_string(node)
        .filter(|name| !name.trim().is_empty())
        .ok_or_else(|| ProjectError::InvalidConfig(format!("{} requires a name", kind)))
}

/// 最初の位置引数を文字列として取得
fn first_string(node: &KdlNode) -> Option<String> {
    node.entries()
        .iter()
        .find(|e| e.name().is_none())
        .and_then(|e| e.value().as_string())
        .map(|s| s.to_string())
}

/// 最初の位置引数を i32 として取得
fn first_i32(node: &KdlNode, resource: &str) -> Result<Option<i32>> {
    let Some(value) = node
        .entries()
        .iter()
        .find(|e| e.name().is_none())
        .and_then(|e| e.value().as_integer())
    else {
        return Ok(None);
    };
    i32::try_from(value)
        .map(Some)
        .map_err(|_| ProjectError::InvalidValue {
            resource: resource.to_string(),
            field: node.name().value().to_string(),
            message: format!("{} is out of range", value),
        })
}

/// 最初の位置引数を非負整数として取得
fn first_u64(node: &KdlNode, resource: &str) -> Result<Option<u64>> {
    let Some(value) = node
        .entries()
        .iter()
        .find(|e| e.name().is_none())
        .and_then(|e| e.value().as_integer())
    else {
        return Ok(None);
    };
    u64::try_from(value)
        .map(Some)
        .map_err(|_| ProjectError::InvalidValue {
            resource: resource.to_string(),
            field: node.name().value().to_string(),
            message: format!("{} is out of range", value),
        })
}

/// 最初の位置引数を bool として取得
fn first_bool(node: &KdlNode) -> Option<bool> {
    node.entries()
        .iter()
        .find(|e| e.name().is_none())
        .and_then(|e| e.value().as_bool())
}

/// 位置引数をすべて文字列として取得
fn string_arguments(node: &KdlNode) -> Vec<String> {
    node.entries()
        .iter()
        .filter(|e| e.name().is_none())
        .filter_map(|e| e.value().as_string().map(|s| s.to_string()))
        .collect()
}

/// `tags { key "value" }` ブロックをパース
fn parse_tags(node: &KdlNode) -> BTreeMap<String, String> {
    let mut tags = BTreeMap::new();
    if let Some(children) = node.children() {
        for tag in children.nodes() {
            if let Some(value) = first_string(tag) {
                tags.insert(tag.name().value().to_string(), value);
            }
        }
    }
    tags
}

#[cfg(test)]
mod tests;
