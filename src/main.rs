//! Rephrase - rewrite selected text with a local model
//!
//! Select text anywhere, press the shortcut, and the selection is replaced
//! with the model's corrected version.

use anyhow::{Context, Result};
use clap::Parser;
use rephrase::bridge;
use rephrase::config::{config_path, Config, ServiceKind};
use rephrase::core::OllamaClient;
use rephrase::hotkey::{start_listener, Shortcut, ShortcutMatcher};
use rephrase::services::{create_service, ServiceRunner};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn, Level};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, reload, EnvFilter, Registry};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Log every key event and model exchange
    #[arg(short, long)]
    debug: bool,

    /// Service to run
    #[arg(short, long, value_enum)]
    service: Option<ServiceKind>,

    /// Shortcut digit (0-9)
    #[arg(short, long)]
    key: Option<u8>,

    /// Model name on the inference server
    #[arg(short, long)]
    model: Option<String>,

    /// Inference server base URL
    #[arg(short, long)]
    url: Option<String>,

    /// Config file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Skip the model presence check at startup
    #[arg(long)]
    skip_model_check: bool,

    /// Print the effective configuration and exit
    #[arg(long)]
    print_config: bool,
}

impl Args {
    fn load_config(&self) -> Result<Config> {
        let path = self.config.clone().unwrap_or_else(config_path);
        let mut config = Config::load_from(&path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        config.apply_env().context("Invalid environment override")?;

        if self.debug {
            config.debug = true;
        }
        if let Some(service) = self.service {
            config.service = service;
        }
        if let Some(key) = self.key {
            config.shortcut_key = key;
        }
        if let Some(model) = &self.model {
            config.ollama_model = model.clone();
        }
        if let Some(url) = &self.url {
            config.ollama_url = url.clone();
        }

        config.validate().context("Invalid configuration")?;
        Ok(config)
    }
}

type FilterHandle = reload::Handle<EnvFilter, Registry>;

fn log_filter(debug: bool) -> EnvFilter {
    let level = if debug { Level::DEBUG } else { Level::INFO };
    // Dependencies stay at warn unless RUST_LOG says otherwise
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("warn,rephrase={level}")))
}

/// Installed before the config is read; the level is raised later if the
/// file or environment turns debug on.
fn init_logging(debug: bool) -> Result<FilterHandle> {
    let (filter, handle) = reload::Layer::new(log_filter(debug));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .try_init()?;
    Ok(handle)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let log_handle = init_logging(args.debug)?;
    let config = args.load_config()?;

    if args.print_config {
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(());
    }

    if config.debug && !args.debug {
        log_handle.reload(log_filter(true))?;
    }

    let service = create_service(&config);
    let shortcut = Shortcut::from_config(&config)?;

    info!("🚀 Rephrase v{} starting...", env!("CARGO_PKG_VERSION"));
    info!("Initializing {} service", service.name());
    info!("Model: {}", config.ollama_model);
    info!("Shortcut: {}", shortcut);

    let client = OllamaClient::new(&config);

    if args.skip_model_check {
        warn!("⚠️ Skipping model check at startup");
    } else {
        client
            .ensure_model()
            .await
            .with_context(|| format!("Could not prepare model on {}", client.url()))?;
        info!("✓ Ollama service is running");
        if let Err(e) = client.warm_up().await {
            warn!("⚠️ Model warm-up failed: {}", e);
        }
    }

    let bridge = bridge::create_bridge(&config)?;

    let matcher = ShortcutMatcher::new(shortcut.clone(), config.quit_on_escape);
    let signals = start_listener(matcher, config.debug);

    info!(
        "✅ Ready. Press {} to trigger {}.",
        shortcut,
        service.name()
    );
    if config.quit_on_escape {
        info!("   Press Escape to quit");
    }
    if !config.debug {
        info!("   Set DEBUG=1 or pass --debug for detailed key logging");
    }

    let runner = ServiceRunner::new(service, Arc::new(client), bridge)
        .with_restore_clipboard(config.restore_clipboard);
    runner.run(signals).await?;

    info!("Rephrase stopped");
    Ok(())
}
