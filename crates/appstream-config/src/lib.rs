pub mod error;

pub use error::*;

use std::path::{Path, PathBuf};

/// 設定ファイルのパスを直接指定する環境変数
pub const CONFIG_PATH_ENV: &str = "APPSTREAM_CONFIG_PATH";

/// プロジェクトローカルの作業ディレクトリ名
pub const PROJECT_DIR: &str = ".appstream";

const CANDIDATES: [&str; 4] = [
    "appstream.local.kdl",
    ".appstream.local.kdl",
    "appstream.kdl",
    ".appstream.kdl",
];

/// ユーザー設定ディレクトリ（~/.config/appstream）を取得
pub fn get_config_dir() -> Result<PathBuf> {
    let config_dir = dirs::config_dir()
        .ok_or(ConfigError::ConfigDirNotFound)?
        .join("appstream");

    if !config_dir.exists() {
        std::fs::create_dir_all(&config_dir)?;
    }

    Ok(config_dir)
}

/// 宣言ファイルを探す
///
/// 以下の優先順位で設定ファイルを検索:
/// 1. 環境変数 APPSTREAM_CONFIG_PATH (直接パス指定)
/// 2. カレントディレクトリ: appstream.local.kdl, .appstream.local.kdl, appstream.kdl, .appstream.kdl
/// 3. ./.appstream/ ディレクトリ内: 同様の順序
/// 4. ~/.config/appstream/appstream.kdl (グローバル設定)
pub fn find_config_file() -> Result<PathBuf> {
    // 1. 環境変数で直接指定
    if let Ok(config_path) = std::env::var(CONFIG_PATH_ENV) {
        let path = PathBuf::from(config_path);
        if path.exists() {
            return Ok(path);
        }
    }

    let current_dir = std::env::current_dir()?;

    // 2. カレントディレクトリで検索
    if let Some(path) = first_existing(&current_dir) {
        return Ok(path);
    }

    // 3. ./.appstream/ ディレクトリで検索
    let project_dir = current_dir.join(PROJECT_DIR);
    if project_dir.is_dir()
        && let Some(path) = first_existing(&project_dir)
    {
        return Ok(path);
    }

    // 4. グローバル設定ファイル
    if let Some(config_dir) = dirs::config_dir() {
        let global_config = config_dir.join("appstream").join("appstream.kdl");
        if global_config.exists() {
            return Ok(global_config);
        }
    }

    Err(ConfigError::ConfigFileNotFound)
}

/// 明示的に指定されたパスを優先して宣言ファイルを解決
pub fn resolve_config_file(explicit: Option<&Path>) -> Result<PathBuf> {
    match explicit {
        Some(path) if path.exists() => Ok(path.to_path_buf()),
        Some(path) => Err(ConfigError::ExplicitPathNotFound(path.to_path_buf())),
        None => find_config_file(),
    }
}

/// 宣言ファイルに対応するプロジェクトルート（状態ファイルの置き場所）
///
/// `.appstream/` 内のファイルならその親ディレクトリを返す
pub fn project_root_for(config_file: &Path) -> PathBuf {
    let parent = config_file
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    if parent.file_name().and_then(|n| n.to_str()) == Some(PROJECT_DIR) {
        parent.parent().unwrap_or(parent).to_path_buf()
    } else {
        parent.to_path_buf()
    }
}

fn first_existing(dir: &Path) -> Option<PathBuf> {
    CANDIDATES
        .iter()
        .map(|filename| dir.join(filename))
        .find(|path| path.exists())
}
