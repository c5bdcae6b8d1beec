//! AMM trade bot CLI

use amm_trade_bot::chain::ChainConnector;
use amm_trade_bot::logging::setup_logging;
use amm_trade_bot::report::{EmailReporter, LogReporter, ReportSink};
use amm_trade_bot::wallet::SecureWallet;
use amm_trade_bot::{Bot, Config, Result, Settings, StateStore};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "amm-trade")]
#[command(about = "Scheduled AMM volume trader and farm-reward compounder")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to JSON config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the bot until stopped
    Run,

    /// Show the effective configuration
    Config,

    /// Show the persisted trade record
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (ignore if not found)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    setup_logging(cli.verbose, cli.json_logs);

    let config = Config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Run => run_bot(config).await?,
        Commands::Config => {
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
        Commands::Status => {
            let record = StateStore::new(&config.state_file).load().await?;
            println!("{}", serde_json::to_string_pretty(&record)?);
        }
    }

    Ok(())
}

async fn run_bot(config: Config) -> Result<()> {
    let settings = Settings::from_env()?;

    let wallet = SecureWallet::from_secret(&settings.private_key)?;
    wallet.ensure_address(settings.wallet_address)?;
    tracing::info!(address = %wallet.address(), rpc = %settings.rpc_url, "Wallet loaded");

    let sink: Arc<dyn ReportSink> = match &settings.email {
        Some(email) => {
            tracing::info!(recipient = %email.recipient, "Reports will be emailed");
            Arc::new(EmailReporter::new(email)?)
        }
        None => Arc::new(LogReporter),
    };

    let connector = ChainConnector::new(
        &settings,
        wallet.clone(),
        config.router,
        Duration::from_secs(config.confirmation_timeout_secs),
    );

    tracing::info!(
        strategy = ?config.strategy,
        interval_hours = config.schedule.interval_hours,
        "Starting trade bot"
    );

    let mut bot = Bot::new(&config, connector, sink, wallet.address()).await?;
    bot.run().await;
    Ok(())
}
