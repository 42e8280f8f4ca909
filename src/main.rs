use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tracing::warn;
use tracing_subscriber::EnvFilter;

use soragiri::banner::{print_banner, print_failure, print_success, print_target};
use soragiri::blade::Blade;
use soragiri::config::{ENV_DISCORD_TOKEN, ENV_KIE_API_KEY, Settings, parse_seconds};
use soragiri::detect::is_video_url;
use soragiri::discord::SoraBot;
use soragiri::history::{History, NewRecord, Source, Status};
use soragiri::kie::KieClient;
use soragiri::terminal::CliProgress;
use soragiri::terminal::color::{RESET, YELLOW};

#[derive(Parser)]
#[command(name = "soragiri", version, about = "SoraGiri (空斬り) - Watermark Slicing Engine")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// History database path (use :memory: for ephemeral)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Don't record slices in the history database
    #[arg(long, global = true, default_value_t = false)]
    no_history: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Remove the watermark from a Sora video and save it locally
    Slice {
        /// Sora video URL
        url: String,

        /// Output file path (default: soragiri_<timestamp>.mp4)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Minimal output (no banner)
        #[arg(short, long, default_value_t = false)]
        quiet: bool,

        /// Maximum status checks before giving up
        #[arg(long)]
        max_attempts: Option<u32>,

        /// Seconds between status checks
        #[arg(long, value_parser = parse_interval)]
        poll_interval: Option<Duration>,
    },
    /// Run the Discord bot
    Bot,
    /// Show recent slices
    History {
        /// Number of entries to show
        #[arg(short, long, default_value_t = 20)]
        limit: usize,

        /// Delete all recorded slices
        #[arg(long, default_value_t = false)]
        clear: bool,
    },
}

fn parse_interval(s: &str) -> Result<Duration, String> {
    parse_seconds(s).map_err(|e| format!("{e:#}"))
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    // The CLI draws its own progress; keep library logs quiet unless asked.
    let default_filter = match cli.command {
        Command::Bot => "info",
        _ => "warn",
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .init();

    let mut settings = Settings::from_env()?;
    if let Some(db) = cli.db {
        settings.db_path = Some(db);
    }
    if cli.no_history {
        settings.db_path = None;
    }

    match cli.command {
        Command::Slice {
            url,
            output,
            quiet,
            max_attempts,
            poll_interval,
        } => {
            if let Some(n) = max_attempts {
                settings.max_attempts = n;
            }
            if let Some(interval) = poll_interval {
                settings.poll_interval = interval;
            }
            run_slice(&settings, &url, output, quiet).await
        }
        Command::Bot => run_bot(settings).await.map(|_| ExitCode::SUCCESS),
        Command::History { limit, clear } => {
            show_history(&settings, limit, clear).map(|_| ExitCode::SUCCESS)
        }
    }
}

async fn run_slice(
    settings: &Settings,
    url: &str,
    output: Option<PathBuf>,
    quiet: bool,
) -> Result<ExitCode> {
    let Some(api_key) = settings.kie_api_key.as_deref() else {
        bail!("{ENV_KIE_API_KEY} not found in environment");
    };
    if !is_video_url(url) {
        bail!("invalid URL, must be from sora.chatgpt.com: {url}");
    }

    let output = output.unwrap_or_else(timestamped_output);
    let blade = Blade::new(
        Box::new(KieClient::with_base_url(api_key, &settings.kie_base_url)),
        settings.slice_options(),
    );
    let history = open_history(settings);

    if !quiet {
        print_banner();
    }
    print_target(url);

    let progress = CliProgress::new();
    let result = tokio::select! {
        result = blade.slice(url, Some(&output), &progress) => result,
        _ = tokio::signal::ctrl_c() => {
            progress.finish().await;
            println!("\n{YELLOW}  Blade sheathed.{RESET}");
            return Ok(ExitCode::from(130));
        }
    };
    progress.finish().await;

    let (status, detail, code) = match &result {
        Ok(out) => {
            print_success(out);
            (Status::Success, output.display().to_string(), ExitCode::SUCCESS)
        }
        Err(e) => {
            print_failure(&e.to_string());
            (Status::Failed, e.to_string(), ExitCode::FAILURE)
        }
    };

    if let Some(history) = history {
        let out = result.as_ref().ok();
        let record = NewRecord {
            source: Source::Cli,
            url,
            task_id: out.map(|o| o.task_id.as_str()),
            status,
            detail: &detail,
            cost_time_ms: out.and_then(|o| o.cost_time_ms),
        };
        if let Err(e) = history.record(&record) {
            warn!(error = %e, "failed to record slice history");
        }
    }

    Ok(code)
}

async fn run_bot(settings: Settings) -> Result<()> {
    let Some(token) = settings.discord_token.clone() else {
        bail!(
            "{ENV_DISCORD_TOKEN} not found. Create a .env file with:\n  \
             {ENV_DISCORD_TOKEN}=your_discord_bot_token\n  \
             {ENV_KIE_API_KEY}=your_kie_ai_api_key"
        );
    };

    let blade = match settings.kie_api_key.as_deref() {
        Some(key) => Some(Blade::new(
            Box::new(KieClient::with_base_url(key, &settings.kie_base_url)),
            settings.slice_options(),
        )),
        None => {
            warn!("{ENV_KIE_API_KEY} not set, bot will start but slicing is disabled");
            None
        }
    };

    let bot = SoraBot::new(
        blade,
        open_history(&settings),
        settings.prefix.clone(),
        settings.discord_guild_id,
    );
    bot.run(&token).await
}

fn show_history(settings: &Settings, limit: usize, clear: bool) -> Result<()> {
    let Some(path) = &settings.db_path else {
        bail!("history is disabled");
    };
    let history = History::open(path)
        .with_context(|| format!("failed to open history at {}", path.display()))?;

    if clear {
        history.clear()?;
        println!("history cleared.");
        return Ok(());
    }

    let records = history.recent(limit)?;
    if records.is_empty() {
        println!("no slices yet.");
        return Ok(());
    }
    for r in records {
        let cost = r
            .cost_time_ms
            .map(soragiri::consts::format_duration_ms)
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:>4}  {}  {:<7}  {:<7}  {:>8}  {}",
            r.id,
            r.local_time(),
            r.source,
            r.status,
            cost,
            r.url
        );
        println!("      -> {}", r.detail);
    }
    Ok(())
}

/// History is best-effort: a broken database shouldn't block a slice.
fn open_history(settings: &Settings) -> Option<History> {
    let path = settings.db_path.as_ref()?;
    match History::open(path) {
        Ok(history) => Some(history),
        Err(e) => {
            warn!(error = %e, path = %path.display(), "history disabled");
            None
        }
    }
}

fn timestamped_output() -> PathBuf {
    let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
    PathBuf::from(format!("soragiri_{timestamp}.mp4"))
}
