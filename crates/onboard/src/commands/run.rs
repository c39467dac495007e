use super::load_config;
use crate::GlobalArgs;
use crate::prompt::TerminalPrompt;
use crate::report;
use crate::wiring::{self, Step};
use colored::Colorize;
use onboard_cloud::{AssumeYes, Confirm, Sequencer, Session};
use onboard_cloud_aws::AwsProvider;
use onboard_config::PolicyTemplates;
use std::sync::Arc;

/// Run the given pipelines against the configured account.
///
/// Returns `false` when a step failed; the report is printed either way.
pub async fn handle(global: &GlobalArgs, steps: &[Step], yes: bool) -> anyhow::Result<bool> {
    let (_, config) = load_config(global)?;
    let templates = PolicyTemplates::new(&global.templates);
    let concerns = wiring::concerns(steps, &config, &templates, &global.cloudformation_dir)?;

    println!(
        "アカウント {} ({}) / {} / profile {}",
        config.account_moniker.cyan(),
        config.account_number,
        config.region.cyan(),
        config.profile.cyan()
    );

    let provider = AwsProvider::load(&config.profile, &config.region).await;
    let session = Session::new(Arc::new(provider), config.context(), config.wait_config());

    let confirm: &dyn Confirm = if yes { &AssumeYes } else { &TerminalPrompt };
    let sequencer = Sequencer::new(&session, confirm);
    let result = sequencer.run(&concerns).await;
    let report = sequencer.into_report();

    report::print_report(&report);
    match result {
        Ok(()) => Ok(true),
        Err(e) => {
            report::print_failure(&report, &e);
            Ok(false)
        }
    }
}
