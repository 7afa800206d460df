//! Headless lazy-views runner: loads a page, fetches its deferred fragments
//! from the endpoint and prints the settled document.
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::mpsc::RecvTimeoutError;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;

use bus::{Bus, CoreCommand};
use html::Document;
use lazy_views::{HeadlessHost, LazyViews, LazyViewsConfig, Settings};
use net::UreqTransport;

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

const FRAME: Duration = Duration::from_millis(16);

#[derive(Parser)]
#[command(name = "lazyviews", about = "Resolve lazy-views placeholders in a page", version)]
struct Cli {
    /// HTML page containing placeholders.
    page: PathBuf,

    /// JSON file with the page settings store.
    #[arg(short, long)]
    settings: Option<PathBuf>,

    /// Page location; its query string is forwarded with the batch.
    #[arg(short, long, default_value = "/")]
    location: String,

    /// TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Overrides `base_url` from the configuration.
    #[arg(long)]
    base_url: Option<String>,

    /// Give up after this many seconds without settling.
    #[arg(long, default_value_t = 60)]
    deadline_secs: u64,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let mut config = match &cli.config {
        Some(path) => LazyViewsConfig::load(path)?,
        None => LazyViewsConfig::default(),
    };
    if let Some(base_url) = cli.base_url {
        config.base_url = base_url;
    }

    let markup = std::fs::read_to_string(&cli.page)
        .with_context(|| format!("reading page {}", cli.page.display()))?;
    let settings = match &cli.settings {
        Some(path) => {
            let source = std::fs::read_to_string(path)
                .with_context(|| format!("reading settings {}", path.display()))?;
            Settings::from_json(&source).context("parsing settings")?
        }
        None => Settings::default(),
    };

    let (bus, cmd_rx) = Bus::new();
    let transport = Arc::new(UreqTransport::new(config.timeout(), &config.user_agent));
    let runtime = runtime_net::start_net_runtime(cmd_rx, bus.evt_tx.clone(), transport);

    let mut page = LazyViews::new(
        config,
        Document::parse(&markup),
        settings,
        cli.location,
        bus.cmd_tx.clone(),
        HeadlessHost::new(),
    )?;
    page.attach()?;

    let deadline = Instant::now() + Duration::from_secs(cli.deadline_secs);
    while !page.is_idle() {
        if Instant::now() >= deadline {
            log::warn!(target: "lazyviews", "deadline reached with work still pending");
            break;
        }
        match bus.evt_rx.recv_timeout(FRAME) {
            Ok(event) => match page.on_event(event, Instant::now()) {
                Ok(report) => {
                    for (kind, err) in &report.failures {
                        log::warn!(target: "lazyviews", "`{kind}` command failed: {err}");
                    }
                }
                Err(err) => log::error!(target: "lazyviews", "{err}"),
            },
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }
        if let Err(err) = page.tick(Instant::now()) {
            log::error!(target: "lazyviews", "{err}");
            break;
        }
    }

    let _ = bus.cmd_tx.send(CoreCommand::Shutdown);
    if runtime.join().is_err() {
        log::warn!(target: "lazyviews", "network runtime panicked");
    }

    log::info!(
        target: "lazyviews",
        "{} behavior attachment(s)",
        page.host().attachments().len()
    );
    println!("{}", page.document().to_html());
    Ok(())
}
