//! Mini-app replay - run a bridge transcript and print the session's effects.

use std::fs::File;
use std::io::{self, BufReader};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use miniapp_cli::{read_transcript, replay, EffectLog, ReplayOptions};
use miniapp_host::HostConfig;
use miniapp_protocol::{HostTheme, PeerId, QueryId};

/// Mini-app transcript replay
#[derive(Parser)]
#[command(name = "miniapp-replay")]
#[command(about = "Replay a mini-app bridge transcript and print effects as JSON lines")]
#[command(version)]
struct Args {
    /// Transcript file; reads stdin when omitted
    transcript: Option<PathBuf>,

    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Owner peer id
    #[arg(long, default_value_t = 1)]
    owner: i64,

    /// Bot peer id
    #[arg(long, default_value_t = 2)]
    bot: i64,

    /// Pre-issued session URL
    #[arg(long)]
    url: Option<String>,

    /// Pre-issued query id
    #[arg(long)]
    query_id: Option<i64>,

    /// Text of the button that launched the session
    #[arg(long)]
    button_text: Option<String>,

    /// Launch from the bot menu
    #[arg(long)]
    from_menu: bool,

    /// The bot is installed in the attachment menu
    #[arg(long)]
    in_attach_menu: bool,

    /// Start with the night theme
    #[arg(long)]
    night: bool,

    /// URL the backend issues when a session is requested
    #[arg(long, default_value = "https://webapp.invalid/")]
    issued_url: String,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Enable JSON logging
    #[arg(long)]
    json_logs: bool,
}

fn setup_logging(level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let subscriber = tracing_subscriber::registry().with(filter);

    // stdout carries effects
    if json {
        subscriber
            .with(tracing_subscriber::fmt::layer().json().with_writer(io::stderr))
            .init();
    } else {
        subscriber
            .with(tracing_subscriber::fmt::layer().pretty().with_writer(io::stderr))
            .init();
    }
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<HostConfig> {
    let mut config = match path {
        Some(path) => HostConfig::load(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => match HostConfig::default_path().filter(|p| p.exists()) {
            Some(path) => HostConfig::load(&path)
                .with_context(|| format!("failed to load config from {}", path.display()))?,
            None => HostConfig::default(),
        },
    };
    config.apply_env_overrides();
    Ok(config)
}

async fn run(args: Args) -> anyhow::Result<()> {
    let config = load_config(args.config.as_ref())?;

    let steps = match &args.transcript {
        Some(path) => {
            let file = File::open(path)
                .with_context(|| format!("failed to open transcript {}", path.display()))?;
            read_transcript(BufReader::new(file))?
        }
        None => read_transcript(io::stdin().lock())?,
    };
    info!(steps = steps.len(), "Transcript loaded");

    let options = ReplayOptions {
        owner: PeerId(args.owner),
        bot: PeerId(args.bot),
        url: args.url,
        query_id: args.query_id.map(QueryId),
        button_text: args.button_text,
        from_menu: args.from_menu,
        in_attach_menu: args.in_attach_menu,
        theme: if args.night {
            HostTheme::night()
        } else {
            HostTheme::day()
        },
        issued_url: args.issued_url,
        ..Default::default()
    };

    let log = EffectLog::with_writer(io::stdout());
    let summary = replay(&steps, options, config, log)
        .await
        .context("replay failed")?;
    info!(
        applied = summary.steps_applied,
        skipped = summary.steps_skipped,
        query_id = ?summary.query_id,
        "Summary"
    );
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = Args::parse();
    setup_logging(&args.log_level, args.json_logs);

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}
