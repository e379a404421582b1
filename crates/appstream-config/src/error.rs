use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("設定ディレクトリが見つかりません")]
    ConfigDirNotFound,

    #[error(
        "設定ファイルが見つかりません。以下の場所を確認してください:\n\
        - カレントディレクトリ: appstream.local.kdl, .appstream.local.kdl, appstream.kdl, .appstream.kdl\n\
        - ./.appstream/ ディレクトリ\n\
        - ~/.config/appstream/appstream.kdl\n\
        または APPSTREAM_CONFIG_PATH 環境変数で直接指定できます"
    )]
    ConfigFileNotFound,

    #[error("指定された設定ファイルが存在しません: {0}")]
    ExplicitPathNotFound(std::path::PathBuf),

    #[error("IO エラー: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ConfigError>;
