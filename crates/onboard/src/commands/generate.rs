use super::load_config;
use crate::GlobalArgs;
use colored::Colorize;
use onboard_config::PolicyTemplates;
use onboard_config::cloudformation;

pub fn handle(global: &GlobalArgs) -> anyhow::Result<bool> {
    let (_, config) = load_config(global)?;
    let templates = PolicyTemplates::new(&global.templates);

    println!("{}", "CloudFormation テンプレートを生成中...".blue());
    let written = cloudformation::generate(&config, &templates, &global.cloudformation_dir)?;
    for path in &written {
        println!("  {} {}", "✓".green(), path.display().to_string().cyan());
    }
    Ok(true)
}
