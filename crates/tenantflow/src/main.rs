mod commands;
mod utils;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tenantflow_cloud::ResourceKind;

#[derive(Parser)]
#[command(name = "tenantflow")]
#[command(about = "テナントのクラウドリソースを作成し、準備完了まで待つ", long_about = None)]
struct Cli {
    /// AWS リージョン (REGION / AWS_REGION 環境変数より優先)
    #[arg(long, global = true)]
    region: Option<String>,

    /// AWS アカウント ID (AWS_ACC_ID 環境変数より優先)
    #[arg(long, global = true)]
    account_id: Option<String>,

    /// aws CLI のプロファイル (未指定なら AWS_PROFILE / default)
    #[arg(long, global = true)]
    profile: Option<String>,

    /// デバッグログを表示 (RUST_LOG が優先)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// リソースを1つ作成して準備完了まで待つ
    Create {
        /// リソース種別 (data-set, dashboard, iam-role, ...)
        kind: ResourceKind,
        /// 作成パラメータのファイル (JSON / YAML)。`-` で標準入力
        #[arg(short, long)]
        params: String,
        /// ステータス確認の間隔 (ミリ秒)
        #[arg(long)]
        interval_ms: Option<u64>,
        /// ステータス確認の最大回数
        #[arg(long)]
        max_attempts: Option<u32>,
    },
    /// プランファイルのリソースを順番に作成
    Apply {
        /// プランファイル (.json または .yaml)
        plan: PathBuf,
    },
    /// 対応しているリソース種別と待機設定を表示
    Kinds,
    /// バージョン情報を表示
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // ログはstderrに出力
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Version => {
            println!("tenantflow {}", env!("CARGO_PKG_VERSION"));
        }
        Commands::Kinds => {
            let settings = utils::load_settings(cli.account_id, cli.region)?;
            let table = utils::probe_table(&settings)?;
            commands::kinds::handle(&table);
        }
        Commands::Create {
            kind,
            params,
            interval_ms,
            max_attempts,
        } => {
            let params = utils::read_params(&params).await?;
            let settings = utils::load_settings(cli.account_id, cli.region)?;
            let reconciler = utils::connect(&settings, cli.profile.as_deref()).await?;
            commands::create::handle(&reconciler, kind, params, interval_ms, max_attempts)
                .await?;
        }
        Commands::Apply { plan } => {
            let settings = utils::load_settings(cli.account_id, cli.region)?;
            let plan = commands::apply::load_plan(&plan).await?;
            let reconciler = utils::connect(&settings, cli.profile.as_deref()).await?;
            commands::apply::handle(&reconciler, plan).await?;
        }
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
