//! riko-gate binary
//!
//! Chat relay for the Riko assistant

use anyhow::{Context, Result};
use clap::Parser;
use riko_gate::gate::{start_server, GatewayConfig, GatewayState};
use riko_gate::{create_client, ChatService, ListStyle, Persona, ProviderConfig};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

/// riko-gate: chat relay for the Riko assistant
#[derive(Parser, Debug)]
#[command(name = "riko-gate")]
#[command(about = "Chat relay for the Riko assistant", long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Host to listen on
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on (overrides PORT)
    #[arg(long)]
    port: Option<u16>,

    /// Bullet list rendering: numbered or strip
    #[arg(long)]
    list_style: Option<ListStyle>,

    /// Validate configuration and exit
    #[arg(long)]
    validate: bool,
}

/// Find a config file: explicit path, ./riko.toml, then ~/.riko/config.toml
fn find_config_file(explicit: Option<PathBuf>) -> Option<PathBuf> {
    explicit.or_else(|| {
        let local = Path::new("./riko.toml");
        if local.exists() {
            return Some(local.to_path_buf());
        }
        dirs::home_dir()
            .map(|home| home.join(".riko").join("config.toml"))
            .filter(|path| path.exists())
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let config_file = find_config_file(args.config);
    let mut gateway_config = match &config_file {
        Some(path) => {
            info!("Loading config from: {}", path.display());
            GatewayConfig::from_file(path)
                .with_context(|| format!("Failed to load {}", path.display()))?
        }
        None => {
            info!("Using default configuration");
            GatewayConfig::default()
        }
    };

    // Environment, then CLI arguments
    gateway_config.apply_env()?;
    if let Some(host) = args.host {
        gateway_config.host = host;
    }
    if let Some(port) = args.port {
        gateway_config.port = port;
    }
    if let Some(list_style) = args.list_style {
        gateway_config.list_style = list_style;
    }
    gateway_config.validate()?;

    // A missing API key stops the process here rather than failing each request
    let provider_config = ProviderConfig::from_env()?;

    let persona = match &gateway_config.persona_file {
        Some(path) => Persona::from_file(path)?,
        None => Persona::default(),
    };

    if args.validate {
        println!("Configuration validation:");
        println!("  Listen: {}:{}", gateway_config.host, gateway_config.port);
        println!("  Provider: {}", provider_config.provider_type.display_name());
        println!("  API base: {}", provider_config.api_base());
        println!("  Model: {} (vision: {})", provider_config.model(), provider_config.vision_model());
        println!("  List style: {:?}", gateway_config.list_style);
        println!("  Body limit: {} bytes", gateway_config.max_body_bytes);
        println!("\nConfiguration is valid");
        return Ok(());
    }

    info!(
        "Using {} ({}) at {}",
        provider_config.provider_type.display_name(),
        provider_config.model(),
        provider_config.api_base()
    );

    let client = create_client(provider_config)?;
    let service = ChatService::new(Arc::from(client), persona, gateway_config.list_style);
    let state = GatewayState::new(service, gateway_config.service_name.clone());

    start_server(gateway_config, state).await
}
