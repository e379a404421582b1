//! プロバイダー設定
//!
//! `provider "aws" { ... }` ブロックで宣言される接続先とポーリング設定

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// デフォルトのプロバイダー名
pub const DEFAULT_PROVIDER: &str = "aws";

/// クラウドプロバイダー設定
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// プロバイダー名（現在は aws のみ）
    pub name: String,

    /// リージョン（eu-west-1 など）。未指定時は SDK のデフォルトチェーンに従う
    pub region: Option<String>,

    /// フリート状態のポーリング間隔（秒）
    pub poll_interval: Option<u64>,

    /// 状態遷移を待つ最大時間（秒）
    pub converge_timeout: Option<u64>,

    /// ポーリングの最大回数
    pub max_attempts: Option<u32>,

    /// ポーリング中に許容する観測エラーの回数
    pub observation_retries: Option<u32>,

    /// 追加設定（プロバイダー固有）
    #[serde(default)]
    pub config: HashMap<String, String>,
}

impl ProviderConfig {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}
