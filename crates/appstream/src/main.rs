mod commands;
mod context;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "appstream")]
#[command(about = "AppStream 2.0 のフリートとスタックを宣言的に管理する", long_about = None)]
struct Cli {
    /// 設定ファイルのパス（省略時は自動検出）
    #[arg(short, long, global = true, env = "APPSTREAM_CONFIG_PATH")]
    config: Option<PathBuf>,

    /// AWS リージョン（provider ブロックの region より優先）
    #[arg(long, global = true, env = "AWS_REGION")]
    region: Option<String>,

    /// デバッグログを出力
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 設定を検証
    Validate,
    /// 宣言と AWS 上のリソースの差分を表示
    Plan,
    /// 差分を適用し、フリートを宣言された状態まで収束させる
    Apply {
        /// 確認なしで実行
        #[arg(short, long)]
        yes: bool,
    },
    /// 管理対象のリソースを削除
    Destroy {
        /// 確認なしで実行
        #[arg(short, long)]
        yes: bool,
        /// 指定したフリートのみ削除
        #[arg(long, conflicts_with = "stack")]
        fleet: Option<String>,
        /// 指定したスタックのみ削除
        #[arg(long)]
        stack: Option<String>,
    },
    /// フリートの起動・停止
    #[command(subcommand)]
    Fleet(FleetCommands),
    /// ローカルの状態ファイルに記録されたリソースを表示
    State,
    /// バージョン情報を表示
    Version,
}

#[derive(Subcommand)]
enum FleetCommands {
    /// フリートを起動し RUNNING になるまで待つ
    Start {
        /// フリート名
        name: String,
        #[command(flatten)]
        wait: WaitArgs,
    },
    /// フリートを停止し STOPPED になるまで待つ
    Stop {
        /// フリート名
        name: String,
        #[command(flatten)]
        wait: WaitArgs,
    },
}

#[derive(clap::Args, Debug, Clone, Copy)]
struct WaitArgs {
    /// 待機の上限（秒）
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    timeout: Option<u64>,
    /// ポーリング間隔（秒）
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    interval: Option<u64>,
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        tracing_subscriber::EnvFilter::new("debug")
    } else {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    // Versionコマンドは設定ファイル不要
    if matches!(cli.command, Commands::Version) {
        println!("appstream {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let config = cli.config.as_deref();
    let region = cli.region.as_deref();

    match cli.command {
        Commands::Validate => commands::validate::handle(config)?,
        Commands::Plan => commands::plan::handle(config, region).await?,
        Commands::Apply { yes } => commands::apply::handle(config, region, yes).await?,
        Commands::Destroy { yes, fleet, stack } => {
            let target = match (fleet, stack) {
                (Some(name), _) => commands::destroy::Target::Fleet(name),
                (_, Some(name)) => commands::destroy::Target::Stack(name),
                _ => commands::destroy::Target::All,
            };
            commands::destroy::handle(config, region, target, yes).await?;
        }
        Commands::Fleet(FleetCommands::Start { name, wait }) => {
            commands::fleet::handle(
                config,
                region,
                &name,
                appstream_cloud::DesiredState::Running,
                wait.timeout,
                wait.interval,
            )
            .await?;
        }
        Commands::Fleet(FleetCommands::Stop { name, wait }) => {
            commands::fleet::handle(
                config,
                region,
                &name,
                appstream_cloud::DesiredState::Stopped,
                wait.timeout,
                wait.interval,
            )
            .await?;
        }
        Commands::State => commands::state::handle(config).await?,
        Commands::Version => {
            unreachable!("Version is handled before config loading");
        }
    }

    Ok(())
}
