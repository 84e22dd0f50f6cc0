//! Fear & greed index notification bot
//!
//! # Usage
//!
//! ```bash
//! export TELEGRAM_BOT_TOKEN="123456:ABC..."
//! export TELEGRAM_CHAT_ID="987654321"
//!
//! # Run the bot
//! cargo run --bin fear-greed-bot -p fear-greed-bot
//!
//! # Send one combined report and exit
//! cargo run --bin fear-greed-bot -p fear-greed-bot -- --push-now
//! ```

use anyhow::Context;
use bot_utils::LogFormat;
use clap::Parser;
use fear_greed_bot::{BotConfig, FearGreedBot, FearGreedClient, Scheduler, TelegramClient};
use std::sync::Arc;
use tracing::{error, info};

#[derive(Debug, Parser)]
#[command(name = "fear-greed-bot")]
#[command(about = "Pushes the US stock and crypto fear & greed indices to Telegram", long_about = None)]
struct Args {
    /// Send one combined report to the configured chat and exit
    #[arg(long)]
    push_now: bool,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let dotenv = bot_utils::load_dotenv();
    let format = if args.json_logs {
        LogFormat::Json
    } else {
        LogFormat::Pretty
    };
    bot_utils::init_tracing("warn,fear_greed_bot=info", format);
    if let Some(path) = dotenv {
        info!(path = %path.display(), "Loaded .env");
    }

    let config = BotConfig::from_env().context("failed to load configuration")?;

    let telegram = Arc::new(TelegramClient::new(&config)?);
    let bot = Arc::new(FearGreedBot::new(
        Arc::new(FearGreedClient::new(&config)?),
        telegram.clone(),
        config.formatter(),
    ));

    if args.push_now {
        info!(recipient = %config.chat_id, "Sending one combined report");
        let outcome = bot.push_combined(config.chat_id).await?;
        anyhow::ensure!(outcome.is_sent(), "index fetch failed; nothing was sent");
        return Ok(());
    }

    for job in config.push_jobs() {
        info!(
            job = %job.name,
            schedule = %job.schedule,
            at = %job.schedule.describe(),
            timezone = %config.timezone,
            "Push schedule"
        );
    }
    info!(recipient = %config.chat_id, "Bot starting");

    let jobs = Scheduler::from_config(&config).spawn(Arc::clone(&bot), config.chat_id);

    tokio::select! {
        () = telegram.run_polling(Arc::clone(&bot)) => {
            error!("Polling loop ended unexpectedly");
        }
        result = tokio::signal::ctrl_c() => {
            result.context("failed to listen for Ctrl-C")?;
            info!("Ctrl-C received; shutting down");
        }
    }

    for job in jobs {
        job.abort();
    }

    Ok(())
}
