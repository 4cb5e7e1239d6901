//! CLI command definitions, routing, and tracing setup.

use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use pageinsights_core::{GeminiSummarizer, PageService};
use pageinsights_extractor::CompanyPageExtractor;
use pageinsights_http::{AppState, DEFAULT_SEARCH_LIMIT};
use pageinsights_renderer::{ChromeRenderer, RenderSettings};
use pageinsights_shared::{AppConfig, init_config, load_config, load_dotenv, resolve_secrets};
use pageinsights_storage::Storage;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// PageInsights: cached, summarized snapshots of public organization pages.
#[derive(Parser)]
#[command(
    name = "pageinsights",
    version,
    about = "Fetch, summarize and cache public organization pages.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Start the HTTP API.
    Serve {
        /// Bind address (overrides `[server] host`).
        #[arg(long)]
        host: Option<String>,

        /// Bind port (overrides `[server] port`).
        #[arg(long)]
        port: Option<u16>,
    },

    /// Fetch one page (from cache, or by scraping it) and print it as JSON.
    Fetch {
        /// Page identifier, e.g. `acme` for /company/acme.
        page_id: String,
    },

    /// Print stored pages as JSON.
    List {
        /// Maximum number of pages.
        #[arg(short, long, default_value_t = DEFAULT_SEARCH_LIMIT)]
        limit: u32,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "pageinsights=info,tower_http=info",
        1 => "pageinsights=debug,tower_http=debug",
        _ => "pageinsights=trace,tower_http=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt().with_env_filter(env_filter).with_target(false).init();
        }
        LogFormat::Json => {
            fmt().json().with_env_filter(env_filter).init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    load_dotenv();

    match cli.command {
        Command::Serve { host, port } => cmd_serve(host, port).await,
        Command::Fetch { page_id } => cmd_fetch(&page_id).await,
        Command::List { limit } => cmd_list(limit).await,
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show().await,
        },
    }
}

/// Wire storage, renderer, extractor and summarizer into one service.
async fn build_service(config: &AppConfig) -> Result<PageService> {
    let secrets = resolve_secrets(config)?;

    let storage = Storage::connect(
        &secrets.database_url,
        secrets.database_auth_token.as_deref(),
    )
    .await?;
    let summarizer = GeminiSummarizer::new(&config.gemini, secrets.gemini_api_key.as_str())?;
    let renderer = ChromeRenderer::new(RenderSettings::from(&config.renderer));

    info!(
        model = summarizer.model(),
        max_concurrent_renders = config.renderer.max_concurrent_renders,
        "page service ready"
    );

    Ok(PageService::new(
        Arc::new(storage),
        Arc::new(renderer),
        Arc::new(CompanyPageExtractor),
        Arc::new(summarizer),
    ))
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_serve(host: Option<String>, port: Option<u16>) -> Result<()> {
    let config = load_config()?;
    let service = build_service(&config).await?;

    let host = host.unwrap_or_else(|| config.server.host.clone());
    let port = port.unwrap_or(config.server.port);
    let listener = tokio::net::TcpListener::bind((host.as_str(), port))
        .await
        .map_err(|e| eyre!("cannot bind {host}:{port}: {e}"))?;

    let state = Arc::new(AppState {
        service: Arc::new(service),
    });

    pageinsights_http::serve(listener, state, shutdown_signal()).await?;
    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    info!("shutdown requested");
}

async fn cmd_fetch(page_id: &str) -> Result<()> {
    let config = load_config()?;
    let service = build_service(&config).await?;

    let spinner = spinner(&format!("Fetching {page_id}"));
    let fetched = service.fetch(page_id).await;
    spinner.finish_and_clear();
    let fetched = fetched?;

    info!(page_id, outcome = fetched.outcome.as_str(), "fetch complete");
    println!("{}", serde_json::to_string_pretty(&fetched.page)?);
    Ok(())
}

async fn cmd_list(limit: u32) -> Result<()> {
    let config = load_config()?;
    let service = build_service(&config).await?;

    let pages = service.list(limit).await?;
    info!(count = pages.len(), limit, "listed stored pages");
    println!("{}", serde_json::to_string_pretty(&pages)?);
    Ok(())
}

async fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

async fn cmd_config_show() -> Result<()> {
    let config: AppConfig = load_config()?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");

    for var in [
        &config.database.url_env,
        &config.database.auth_token_env,
        &config.gemini.api_key_env,
    ] {
        let state = match std::env::var(var) {
            Ok(v) if !v.trim().is_empty() => "set",
            _ => "not set",
        };
        println!("# {var}: {state}");
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Progress
// ---------------------------------------------------------------------------

fn spinner(message: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    let style = ProgressStyle::with_template("{spinner:.cyan} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]);
    spinner.set_style(style);
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(80));
    spinner
}
