mod commands;
mod prompt;
mod report;
mod wiring;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use wiring::Step;

#[derive(Parser)]
#[command(name = "onboard")]
#[command(about = "新しい AWS アカウントをベースラインのセキュリティ構成へ。何度実行しても同じ結果に。", long_about = None)]
pub struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

/// 全コマンド共通のオプション
#[derive(clap::Args, Debug, Clone)]
pub struct GlobalArgs {
    /// 設定ファイル (省略時は ONBOARD_CONFIG, ./onboard.local.yml, ./onboard.yml, ~/.config/onboard/onboard.yml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// 認証プロファイル (設定ファイルの profile を上書き)
    #[arg(long, global = true, env = "ONBOARD_PROFILE")]
    profile: Option<String>,

    /// ホームリージョン (設定ファイルの region を上書き)
    #[arg(long, global = true, env = "ONBOARD_REGION")]
    region: Option<String>,

    /// ポリシーテンプレートのディレクトリ
    #[arg(long, global = true, default_value = "templates")]
    templates: PathBuf,

    /// CloudFormation テンプレートのディレクトリ
    #[arg(long, global = true, default_value = "cloudformation")]
    cloudformation_dir: PathBuf,

    /// 詳細ログを出力
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// 監査スタックと VPC スタックを適用 (対話式)
    Stacks {
        /// 確認なしで実行
        #[arg(short, long)]
        yes: bool,
    },
    /// 全リージョンで AWS Config の記録を有効化
    ConfigService,
    /// 全リージョンの VPC でフローログを有効化
    FlowLogs,
    /// 全リージョンのデフォルト NACL を設定どおりに書き換え
    Nacls,
    /// SAML プロバイダー、管理ロール、アカウントエイリアス、パスワードポリシー
    Identity,
    /// すべてを順に実行 (stacks → config-service → flow-logs → nacls → identity)
    All {
        /// 確認なしで実行
        #[arg(short, long)]
        yes: bool,
    },
    /// CloudFormation テンプレートを生成
    Generate,
    /// 設定とテンプレートを検証 (AWS には接続しない)
    Validate,
    /// バージョン情報を表示
    Version,
}

fn init_tracing(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    let default_filter = format!(
        "warn,onboard={level},onboard_cloud={level},onboard_cloud_aws={level},onboard_config={level}"
    );
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.global.verbose);

    let success = match cli.command {
        Commands::Version => {
            println!("onboard {}", env!("CARGO_PKG_VERSION"));
            true
        }
        Commands::Validate => commands::validate::handle(&cli.global)?,
        Commands::Generate => commands::generate::handle(&cli.global)?,
        Commands::Stacks { yes } => commands::run::handle(&cli.global, &[Step::Stacks], yes).await?,
        Commands::ConfigService => {
            commands::run::handle(&cli.global, &[Step::ConfigService], false).await?
        }
        Commands::FlowLogs => commands::run::handle(&cli.global, &[Step::FlowLogs], false).await?,
        Commands::Nacls => commands::run::handle(&cli.global, &[Step::Nacls], false).await?,
        Commands::Identity => commands::run::handle(&cli.global, &[Step::Identity], false).await?,
        Commands::All { yes } => commands::run::handle(&cli.global, &Step::ALL, yes).await?,
    };

    if !success {
        std::process::exit(1);
    }
    Ok(())
}
