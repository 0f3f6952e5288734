//! FurnishFindr client (furnish-ui) - Main entry point
//!
//! Free-text furniture search against the recommendation backend, with every
//! result image resolved through the proxy -> direct -> placeholder fallback
//! chain, plus a read-only analytics view.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use furnish_common::api::RecommendRequest;
use furnish_common::config::{
    resolve_api_base, resolve_config_path, write_toml_config, LoggingConfig, TomlConfig,
};
use furnish_common::image::{ImageResolution, TracingObserver};
use serde_json::Value;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use furnish_ui::client::BackendClient;
use furnish_ui::interactive::run_interactive;
use furnish_ui::render::{render_analytics, render_search, to_json, OutputFormat};
use furnish_ui::session::SearchView;
use furnish_ui::surface::{resolve_with, AcceptingSurface, HttpProbeSurface, RenderSurface};
use furnish_ui::{build_info, App};

/// Command-line arguments for furnish-ui
#[derive(Parser, Debug)]
#[command(name = "furnish-ui")]
#[command(about = "FurnishFindr furniture search client")]
#[command(version)]
struct Args {
    /// Backend base URL (overrides FURNISH_API_BASE and the config file)
    #[arg(long, global = true)]
    api_base: Option<String>,

    /// Config file path (overrides FURNISH_CONFIG)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Do not fetch images; show each item's first candidate
    #[arg(long, global = true)]
    no_probe: bool,

    /// Print JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run one search and print the results
    Search {
        /// Free-text query
        #[arg(required = true)]
        query: Vec<String>,

        /// Number of results
        #[arg(short, long)]
        k: Option<u32>,

        /// Backend filter as key=value (value parsed as JSON when possible)
        #[arg(long = "filter", value_parser = parse_filter)]
        filters: Vec<(String, Value)>,
    },

    /// Show dataset analytics
    Analytics {
        /// Entries listed per breakdown
        #[arg(long, default_value_t = 10)]
        top: usize,
    },

    /// Show how an image reference resolves
    Resolve {
        /// Raw image reference as the backend would send it
        raw: String,
    },

    /// Read queries from stdin, one per line (default)
    Interactive,

    /// Manage the config file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Write a config file with default values
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Print the effective configuration
    Show,
}

fn parse_filter(raw: &str) -> Result<(String, Value), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{}'", raw))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("empty filter key in '{}'", raw));
    }
    let value = serde_json::from_str(value.trim())
        .unwrap_or_else(|_| Value::String(value.trim().to_string()));
    Ok((key.to_string(), value))
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = Args::parse();

    let config_path = resolve_config_path(args.config.as_deref());
    let loaded = match &config_path {
        Some(path) => TomlConfig::load(path)?,
        None => None,
    };
    let config_found = loaded.is_some();
    let config = loaded.unwrap_or_default();

    init_tracing(&config.logging)?;

    info!("Starting FurnishFindr client (furnish-ui) {}", build_info());
    match &config_path {
        Some(path) if config_found => info!("Loaded config from {}", path.display()),
        Some(path) => warn!("Config file not found at {}, using defaults", path.display()),
        None => warn!("Could not determine config directory, using defaults"),
    }

    let format = if args.json {
        OutputFormat::Json
    } else {
        OutputFormat::Text
    };

    match args.command.unwrap_or(Command::Interactive) {
        Command::Config { action } => run_config(action, args.config.as_deref(), &config),
        Command::Resolve { raw } => {
            let surface = build_surface(args.no_probe, &config)?;
            run_resolve(&raw, &config, surface.as_ref(), format).await
        }
        Command::Search { query, k, filters } => {
            let app = build_app(args.api_base.as_deref(), args.no_probe, &config)?;
            let mut request =
                RecommendRequest::new(query.join(" ")).with_k(k.unwrap_or(config.default_k));
            for (key, value) in filters {
                request = request.with_filter(key, value);
            }
            request.validate()?;
            run_search(&app, request, format).await
        }
        Command::Analytics { top } => {
            let app = build_app(args.api_base.as_deref(), args.no_probe, &config)?;
            run_analytics(&app, top, format).await
        }
        Command::Interactive => {
            let app = build_app(args.api_base.as_deref(), args.no_probe, &config)?;
            let stdin = tokio::io::BufReader::new(tokio::io::stdin());
            let stdout = Arc::new(tokio::sync::Mutex::new(std::io::stdout()));
            eprintln!("Type a query and press Enter (:analytics, :q to quit)");
            run_interactive(Arc::new(app), stdin, stdout, format)
                .await
                .context("Interactive session failed")?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn init_tracing(logging: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| {
        let level = logging.level.trim();
        let directive = if level.contains('=') || level.contains(',') {
            level.to_string()
        } else {
            format!("furnish_ui={0},furnish_common={0}", level)
        };
        EnvFilter::try_new(directive)
    })?;

    match &logging.file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_ansi(false)
                        .with_writer(std::sync::Mutex::new(file)),
                )
                .init();
        }
        None => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }
    Ok(())
}

fn build_surface(no_probe: bool, config: &TomlConfig) -> Result<Arc<dyn RenderSurface>> {
    if no_probe {
        info!("Image probing disabled, using first candidate for every item");
        return Ok(Arc::new(AcceptingSurface));
    }
    let surface = HttpProbeSurface::new(Duration::from_secs(config.image_timeout_secs))
        .context("Failed to create image client")?;
    Ok(Arc::new(surface))
}

fn build_app(api_base: Option<&str>, no_probe: bool, config: &TomlConfig) -> Result<App> {
    let api_base = resolve_api_base(api_base, config)?;
    let client = BackendClient::new(api_base, Duration::from_secs(config.request_timeout_secs))
        .map_err(|e| anyhow!("Failed to create backend client: {}", e))?;
    let surface = build_surface(no_probe, config)?;

    Ok(App::new(
        client,
        surface,
        config.delivery.clone(),
        Arc::new(TracingObserver::default()),
        config.default_k,
    ))
}

async fn run_search(app: &App, request: RecommendRequest, format: OutputFormat) -> Result<ExitCode> {
    let view = app
        .submit(request)
        .await
        .ok_or_else(|| anyhow!("Search was superseded"))?;

    print!("{}", render_search(&view, format));

    Ok(match view {
        SearchView::Failed { .. } => ExitCode::FAILURE,
        _ => ExitCode::SUCCESS,
    })
}

async fn run_analytics(app: &App, top: usize, format: OutputFormat) -> Result<ExitCode> {
    match app.analytics().await {
        Ok(analytics) => {
            match format {
                OutputFormat::Text => print!("{}", render_analytics(&analytics, top)),
                OutputFormat::Json => print!("{}", to_json(&analytics)),
            }
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            warn!(error = %e, "Analytics failed");
            eprintln!("Analytics failed: {}", e.user_message());
            Ok(ExitCode::FAILURE)
        }
    }
}

async fn run_resolve(
    raw: &str,
    config: &TomlConfig,
    surface: &dyn RenderSurface,
    format: OutputFormat,
) -> Result<ExitCode> {
    let mut resolution = ImageResolution::with_observer(
        "cli",
        Some(raw),
        &config.delivery,
        Arc::new(TracingObserver::default()),
    );
    let candidates = resolution.sequence().to_vec();
    let normalized = resolution.normalized().map(|u| u.as_str().to_string());
    let resolved = resolve_with(&mut resolution, surface).await;

    match format {
        OutputFormat::Json => print!(
            "{}",
            to_json(&serde_json::json!({
                "raw": raw,
                "normalized": normalized,
                "candidates": candidates,
                "resolved": resolved,
            }))
        ),
        OutputFormat::Text => {
            println!("raw:        {:?}", raw);
            println!("normalized: {}", normalized.as_deref().unwrap_or("<absent>"));
            for (i, candidate) in candidates.iter().enumerate() {
                println!("  {}. {:<11} {}", i + 1, candidate.strategy, candidate.url);
            }
            println!(
                "resolved:   {} [{}] after {} failure(s)",
                resolved.source, resolved.strategy, resolved.failures
            );
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn run_config(action: ConfigAction, cli_path: Option<&Path>, config: &TomlConfig) -> Result<ExitCode> {
    match action {
        ConfigAction::Init { force } => {
            let path = resolve_config_path(cli_path)
                .ok_or_else(|| anyhow!("Could not determine config directory"))?;
            if path.exists() && !force {
                bail!("{} already exists (use --force to overwrite)", path.display());
            }
            write_toml_config(&TomlConfig::default(), &path)?;
            println!("Wrote {}", path.display());
        }
        ConfigAction::Show => {
            let text = toml::to_string_pretty(config).context("Failed to serialize config")?;
            print!("{}", text);
        }
    }
    Ok(ExitCode::SUCCESS)
}
