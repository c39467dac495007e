pub mod generate;
pub mod run;
pub mod validate;

use crate::GlobalArgs;
use colored::Colorize;
use onboard_config::OnboardConfig;
use std::path::PathBuf;

/// Discover and validate `onboard.yml`, then apply `--profile` / `--region`
pub fn load_config(global: &GlobalArgs) -> anyhow::Result<(PathBuf, OnboardConfig)> {
    let (path, config) = onboard_config::load(global.config.as_deref())?;
    let config = config.with_overrides(global.profile.clone(), global.region.clone());
    println!("📄 設定ファイル: {}", path.display().to_string().cyan());
    Ok((path, config))
}
