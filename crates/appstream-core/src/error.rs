use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProjectError {
    #[error("KDLパースエラー: {0}")]
    KdlParse(#[from] kdl::KdlError),

    #[error("ファイル読み込みエラー: {0}")]
    Io(#[from] std::io::Error),

    #[error("IO エラー: {path}\n理由: {message}")]
    IoError { path: PathBuf, message: String },

    #[error("無効な設定: {0}")]
    InvalidConfig(String),

    #[error("'{resource}' の値が不正です: {field}\n理由: {message}")]
    InvalidValue {
        resource: String,
        field: String,
        message: String,
    },

    #[error("{kind} '{name}' が重複して定義されています")]
    Duplicate { kind: &'static str, name: String },

    #[error("フリート '{0}' に instance-type が指定されていません")]
    MissingInstanceType(String),

    #[error("フリート '{0}' に image-arn が指定されていません")]
    MissingImage(String),

    #[error("プロバイダーが見つかりません: {0}")]
    ProviderNotFound(String),
}

pub type Result<T> = std::result::Result<T, ProjectError>;
