use colored::{ColoredString, Colorize};
use onboard_cloud::{CloudError, Outcome, RunReport, StepResult};

fn mark(outcome: &Outcome) -> ColoredString {
    match outcome {
        Outcome::Created => "✓".green(),
        Outcome::Repaired => "↻".blue(),
        Outcome::AlreadySatisfied => "=".dimmed(),
        Outcome::Skipped(_) => "↷".yellow(),
        Outcome::Failed(_) => "✗".red(),
    }
}

fn step_line(step: &StepResult) -> String {
    let outcome = match &step.outcome {
        Outcome::Failed(reason) => format!("failed: {}", reason).red().to_string(),
        other => other.to_string().dimmed().to_string(),
    };
    format!("  {} {} {}", mark(&step.outcome), step.descriptor, outcome)
}

pub fn print_report(report: &RunReport) {
    println!();
    for step in &report.steps {
        println!("{}", step_line(step));
    }
    println!();

    let summary = report.summary();
    let elapsed = report.duration_ms as f64 / 1000.0;
    if report.is_success() {
        println!(
            "{} {} ({:.1}s)",
            "✓ 完了".green().bold(),
            summary,
            elapsed
        );
    } else {
        println!("{} {} ({:.1}s)", "✗ 中断".red().bold(), summary, elapsed);
    }
}

/// Why the run stopped, naming the resource, region and stack when known
pub fn print_failure(report: &RunReport, error: &CloudError) {
    eprintln!();
    eprintln!("{}", "✗ 実行を中断しました".red().bold());
    if let Some(step) = report.failure() {
        eprintln!("  resource: {}", step.descriptor.to_string().cyan());
        if let Some(region) = step.descriptor.region() {
            eprintln!("  region:   {}", region.cyan());
        }
    }
    eprintln!("  {}", error);

    match error {
        CloudError::StackRolledBack { stack }
        | CloudError::StackDeleteFailed { stack, .. }
        | CloudError::StackUnhealthy { stack, .. } => {
            eprintln!();
            eprintln!(
                "CloudFormation コンソールでスタック {} のイベントを確認してください",
                stack.yellow()
            );
        }
        CloudError::TransientRace { .. } => {
            eprintln!();
            eprintln!("しばらく待ってから再実行してください");
        }
        _ => {}
    }
}
