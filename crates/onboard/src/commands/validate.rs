use super::load_config;
use crate::GlobalArgs;
use crate::wiring::{self, Step};
use colored::Colorize;
use onboard_cloud::StackKind;
use onboard_cloud::nacl::derive_rules;
use onboard_cloud::pipeline::stacks::template_path;
use onboard_config::PolicyTemplates;

pub fn handle(global: &GlobalArgs) -> anyhow::Result<bool> {
    println!("{}", "設定を検証中...".blue());

    let config = match load_config(global) {
        Ok((_, config)) => config,
        Err(e) => {
            eprintln!();
            eprintln!("{}", "✗ 設定エラー".red().bold());
            eprintln!("  {:#}", e);
            return Ok(false);
        }
    };

    let templates = PolicyTemplates::new(&global.templates);
    let mut ok = true;
    println!();
    println!("サマリー:");
    println!(
        "  アカウント: {} ({})",
        config.account_moniker.cyan(),
        config.account_number
    );
    println!("  リージョン: {}", config.region.cyan());
    println!("  プロファイル: {}", config.profile.cyan());
    println!("  Config バケット: {}", config.config_bucket_name().cyan());

    let rules = derive_rules(&config.nacls)?;
    println!("  NACL ルール: {}個", rules.len());
    for rule in &rules {
        println!(
            "    - #{} {} proto {} {} {}",
            rule.rule_number,
            if rule.egress { "egress " } else { "ingress" },
            rule.protocol,
            rule.action.as_str(),
            rule.cidr_block
        );
    }

    println!("  テンプレート ({}):", templates.dir().display());
    for step in Step::ALL {
        match wiring::concern(step, &config, &templates, &global.cloudformation_dir) {
            Ok(concern) => println!("    {} {}", "✓".green(), concern.name()),
            Err(e) => {
                ok = false;
                println!("    {} {:?}: {:#}", "✗".red(), step, e);
            }
        }
    }

    println!(
        "  CloudFormation ({}):",
        global.cloudformation_dir.display()
    );
    let context = config.context();
    for kind in StackKind::ALL {
        let path = template_path(&global.cloudformation_dir, &context.monikered(kind.suffix()));
        if path.is_file() {
            println!("    {} {}", "✓".green(), path.display());
        } else {
            // 無ければ stacks はスキップされるだけなのでエラーにはしない
            println!("    {} {} (未生成)", "↷".yellow(), path.display());
        }
    }

    println!();
    if ok {
        println!("{}", "✓ 設定ファイルは正常です！".green().bold());
    } else {
        eprintln!("{}", "✗ テンプレートにエラーがあります".red().bold());
    }
    Ok(ok)
}

