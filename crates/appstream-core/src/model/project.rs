//! Project定義

use super::fleet::FleetConfig;
use super::provider::{DEFAULT_PROVIDER, ProviderConfig};
use super::stack::StackConfig;
use crate::error::{ProjectError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Project - 宣言ファイル全体
///
/// スタックとフリート、それらを管理するプロバイダーの設定をまとめたもの。
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Project {
    /// プロジェクト名
    pub name: String,

    /// プロバイダー設定
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,

    /// スタック（名前順）
    #[serde(default)]
    pub stacks: BTreeMap<String, StackConfig>,

    /// フリート（名前順）
    #[serde(default)]
    pub fleets: BTreeMap<String, FleetConfig>,
}

impl Project {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// AWS プロバイダー設定を取得（未宣言ならデフォルト）
    pub fn provider(&self) -> ProviderConfig {
        self.providers
            .get(DEFAULT_PROVIDER)
            .cloned()
            .unwrap_or_else(|| ProviderConfig::named(DEFAULT_PROVIDER))
    }

    pub fn fleet(&self, name: &str) -> Option<&FleetConfig> {
        self.fleets.get(name)
    }

    pub fn stack(&self, name: &str) -> Option<&StackConfig> {
        self.stacks.get(name)
    }

    /// 必須項目と値の範囲を検証
    ///
    /// `state` の値はここでは検証しない。RUNNING / STOPPED 以外は
    /// 収束処理で UnsupportedState として扱われる。
    pub fn validate(&self) -> Result<()> {
        for (name, provider) in &self.providers {
            if name != DEFAULT_PROVIDER {
                return Err(ProjectError::ProviderNotFound(name.clone()));
            }
            for (field, value) in [
                ("poll-interval", provider.poll_interval),
                ("converge-timeout", provider.converge_timeout),
            ] {
                if value == Some(0) {
                    return Err(ProjectError::InvalidValue {
                        resource: name.clone(),
                        field: field.to_string(),
                        message: "1 以上の秒数を指定してください".to_string(),
                    });
                }
            }
        }

        for (name, fleet) in &self.fleets {
            if fleet.instance_type.trim().is_empty() {
                return Err(ProjectError::MissingInstanceType(name.clone()));
            }
            if fleet.image_arn.trim().is_empty() {
                return Err(ProjectError::MissingImage(name.clone()));
            }
            if fleet.desired_instances < 0 {
                return Err(ProjectError::InvalidValue {
                    resource: name.clone(),
                    field: "desired-instances".to_string(),
                    message: "0 以上を指定してください".to_string(),
                });
            }
            if let Some(stack) = &fleet.stack_name
                && !self.stacks.contains_key(stack)
            {
                tracing::debug!(
                    fleet = %name,
                    stack = %stack,
                    "Associated stack is not declared in this project"
                );
            }
        }

        for (name, stack) in &self.stacks {
            for (action, permission) in stack.user_settings.actions() {
                if permission != "ENABLED" && permission != "DISABLED" {
                    return Err(ProjectError::InvalidValue {
                        resource: name.clone(),
                        field: action.to_string(),
                        message: format!(
                            "ENABLED または DISABLED を指定してください（指定値: {}）",
                            permission
                        ),
                    });
                }
            }
        }

        Ok(())
    }
}
