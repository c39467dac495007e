pub mod cloudformation;
pub mod error;
pub mod model;
pub mod templates;

pub use error::*;
pub use model::{OnboardConfig, Subnet, WaitSettings};
pub use templates::{PolicyTemplates, RegionalTemplate, TemplateVars};

use std::path::{Path, PathBuf};

/// Environment variable naming the configuration file directly
pub const CONFIG_ENV: &str = "ONBOARD_CONFIG";

const CANDIDATES: [&str; 2] = ["onboard.local.yml", "onboard.yml"];

/// onboard.yml を探す
///
/// 以下の優先順位で設定ファイルを検索:
/// 1. 明示的なパス (--config / ONBOARD_CONFIG)
/// 2. カレントディレクトリ: onboard.local.yml, onboard.yml
/// 3. ~/.config/onboard/onboard.yml (グローバル設定)
pub fn find_config_file(explicit: Option<&Path>) -> Result<PathBuf> {
    // 1. 直接指定。存在しなければ他を探さずにエラー
    let from_env = std::env::var_os(CONFIG_ENV).map(PathBuf::from);
    if let Some(path) = explicit.map(Path::to_path_buf).or(from_env) {
        if path.is_file() {
            return Ok(path);
        }
        return Err(ConfigError::ExplicitPathMissing(path));
    }

    // 2. カレントディレクトリで検索
    let current_dir = std::env::current_dir()?;
    for filename in &CANDIDATES {
        let path = current_dir.join(filename);
        if path.is_file() {
            return Ok(path);
        }
    }

    // 3. グローバル設定ファイル
    if let Some(config_dir) = dirs::config_dir() {
        let global_config = config_dir.join("onboard").join("onboard.yml");
        if global_config.is_file() {
            return Ok(global_config);
        }
    }

    Err(ConfigError::ConfigFileNotFound)
}

/// Read and parse a configuration file
pub fn load_config(path: &Path) -> Result<OnboardConfig> {
    tracing::debug!("Loading configuration from {}", path.display());
    let content = std::fs::read_to_string(path)?;
    OnboardConfig::from_yaml(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Discover, parse and validate
pub fn load(explicit: Option<&Path>) -> Result<(PathBuf, OnboardConfig)> {
    let path = find_config_file(explicit)?;
    let config = load_config(&path)?;
    config.validate()?;
    Ok((path, config))
}
