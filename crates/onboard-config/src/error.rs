use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error(
        "設定ファイルが見つかりません。以下の場所を確認してください:\n\
        - カレントディレクトリ: onboard.local.yml, onboard.yml\n\
        - ~/.config/onboard/onboard.yml\n\
        または --config / ONBOARD_CONFIG で直接指定できます"
    )]
    ConfigFileNotFound,

    #[error("config file {0} does not exist")]
    ExplicitPathMissing(PathBuf),

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid configuration: {0}")]
    Invalid(String),

    #[error("template {path} not found")]
    TemplateNotFound { path: PathBuf },

    #[error("failed to render template {name}: {message}")]
    Render { name: String, message: String },

    #[error("template {name} is not valid JSON: {source}")]
    Json {
        name: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("IO エラー: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ConfigError>;
