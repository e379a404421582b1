//! スタックリソースモデル

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// AppStream スタック設定
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StackConfig {
    /// スタック名（一意）
    pub name: String,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub display_name: Option<String>,

    #[serde(default)]
    pub feedback_url: Option<String>,

    /// セッション終了後のリダイレクト先
    #[serde(default)]
    pub redirect_url: Option<String>,

    #[serde(default)]
    pub storage_connectors: Vec<StorageConnectorConfig>,

    #[serde(default)]
    pub user_settings: UserSettings,

    #[serde(default)]
    pub tags: BTreeMap<String, String>,
}

impl StackConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

/// ストレージコネクタ
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConnectorConfig {
    /// HOMEFOLDERS / GOOGLE_DRIVE / ONE_DRIVE
    pub connector_type: String,

    #[serde(default)]
    pub resource_identifier: Option<String>,
}

/// ユーザー設定（各値は ENABLED / DISABLED）
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSettings {
    #[serde(default)]
    pub file_download: Option<String>,

    #[serde(default)]
    pub file_upload: Option<String>,

    #[serde(default)]
    pub copy_from_local: Option<String>,

    #[serde(default)]
    pub copy_to_local: Option<String>,

    #[serde(default)]
    pub allow_local_device_printing: Option<String>,
}

impl UserSettings {
    /// 指定された設定を (AppStream のアクション名, 権限) の組で返す
    pub fn actions(&self) -> Vec<(&'static str, &str)> {
        [
            ("FILE_DOWNLOAD", &self.file_download),
            ("FILE_UPLOAD", &self.file_upload),
            ("CLIPBOARD_COPY_FROM_LOCAL_DEVICE", &self.copy_from_local),
            ("CLIPBOARD_COPY_TO_LOCAL_DEVICE", &self.copy_to_local),
            ("PRINTING_TO_LOCAL_DEVICE", &self.allow_local_device_printing),
        ]
        .into_iter()
        .filter_map(|(action, permission)| permission.as_deref().map(|p| (action, p)))
        .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.actions().is_empty()
    }
}
