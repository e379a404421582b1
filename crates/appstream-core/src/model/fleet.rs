//! フリートリソースモデル

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// AppStream フリート設定
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FleetConfig {
    /// フリート名（一意）
    pub name: String,

    /// インスタンスタイプ（stream.standard.medium など）
    pub instance_type: String,

    /// イメージ ARN
    pub image_arn: String,

    /// 希望インスタンス数
    pub desired_instances: i32,

    /// ON_DEMAND / ALWAYS_ON
    #[serde(default)]
    pub fleet_type: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub display_name: Option<String>,

    /// 切断後にセッションを保持する秒数
    #[serde(default)]
    pub disconnect_timeout: Option<i32>,

    /// セッションの最大秒数
    #[serde(default)]
    pub max_user_duration: Option<i32>,

    #[serde(default)]
    pub enable_default_internet_access: Option<bool>,

    /// 関連付けるスタック名
    #[serde(default)]
    pub stack_name: Option<String>,

    /// 希望するライフサイクル状態（RUNNING / STOPPED）。未指定なら遷移しない
    #[serde(default)]
    pub state: Option<String>,

    #[serde(default)]
    pub vpc: Option<VpcConfig>,

    #[serde(default)]
    pub domain: Option<DomainJoinInfo>,

    #[serde(default)]
    pub tags: BTreeMap<String, String>,
}

impl FleetConfig {
    pub fn new(
        name: impl Into<String>,
        instance_type: impl Into<String>,
        image_arn: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            instance_type: instance_type.into(),
            image_arn: image_arn.into(),
            desired_instances: 1,
            ..Default::default()
        }
    }
}

/// VPC 設定
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VpcConfig {
    #[serde(default)]
    pub subnet_ids: Vec<String>,

    #[serde(default)]
    pub security_group_ids: Vec<String>,
}

impl VpcConfig {
    /// "subnet-1, subnet-2" 形式の ID リストを分割する
    ///
    /// 空要素は無視される
    pub fn split_ids(value: &str) -> Vec<String> {
        value
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }
}

/// ドメイン参加設定
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainJoinInfo {
    #[serde(default)]
    pub directory_name: Option<String>,

    /// OU の識別名（OU=...,DC=...）
    #[serde(default)]
    pub organizational_unit: Option<String>,
}
