use anyhow::{bail, Context, Result};
use clap::Parser;
use std::env;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{error, info, warn};

use herald::api::PracticumClient;
use herald::config::{self, Config, DEFAULT_RETRY_SECS};
use herald::http::create_http_client;
use herald::logging::{self, DEFAULT_LOG_FILE};
use herald::notify::TelegramMessenger;
use herald::poller::{PollState, Poller};
use herald::shutdown::Shutdown;

#[derive(Parser)]
#[command(name = "herald")]
#[command(about = "Watch homework review status and report changes to Telegram", long_about = None)]
#[command(version)]
struct Cli {
    /// Seconds to wait between polls
    #[arg(long, default_value_t = DEFAULT_RETRY_SECS, value_parser = clap::value_parser!(u64).range(1..))]
    interval: u64,

    /// File that log records are appended to
    #[arg(long, default_value = DEFAULT_LOG_FILE)]
    log_file: PathBuf,

    /// Poll once and exit instead of looping
    #[arg(long)]
    once: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let _log_guard = logging::init(&cli.log_file).context("Failed to initialize logging")?;

    // Values already in the environment take precedence over the file.
    match dotenvy::dotenv() {
        Ok(path) => info!(path = %path.display(), "loaded environment file"),
        Err(e) if e.not_found() => {}
        Err(e) => warn!("ignoring unreadable environment file: {e}"),
    }

    let missing = config::check_tokens(|name| env::var(name).ok());
    if !missing.is_empty() {
        for name in &missing {
            error!(
                severity = "CRITICAL",
                "Отсутствует обязательная переменная окружения: {name}"
            );
        }
        bail!(
            "Missing required environment variables: {}",
            missing.join(", ")
        );
    }

    let config = Config::from_env()
        .context("Failed to load configuration")?
        .with_retry_interval(Duration::from_secs(cli.interval));

    let client = create_http_client().context("Failed to create HTTP client")?;
    let source = PracticumClient::new(&config, client.clone());
    let messenger = TelegramMessenger::new(&config, client);

    info!(
        endpoint = source.endpoint(),
        interval_secs = cli.interval,
        "herald starting"
    );

    let mut poller = Poller::new(
        &source,
        &messenger,
        &config.telegram_chat_id,
        config.retry_interval,
        PollState::starting_now(),
    );

    if cli.once {
        let outcome = poller.tick();
        info!(?outcome, "single poll finished");
        return Ok(());
    }

    let shutdown = Shutdown::new();
    shutdown
        .install_ctrlc_handler()
        .context("Failed to install signal handler")?;

    poller.run(&shutdown);
    Ok(())
}
