mod config;
mod error;
mod gemini;
mod logging;
mod models;
mod provider;
mod relay;
mod request_id;
mod server;

use clap::Parser;
use config::{Config, Overrides};
use gemini::GeminiProvider;
use server::{AppState, build_router};
use std::str::FromStr;
use std::sync::Arc;
use tracing::{Level, info, warn};

#[derive(Parser, Debug)]
#[command(name = "chat-relay")]
#[command(about = "Relays chat conversations to Gemini without exposing the API key")]
struct Args {
    #[arg(short, long, default_value = "0.0.0.0")]
    ip: String,

    #[arg(short, long, env = "PORT", default_value = "5000")]
    port: u16,

    /// Optional YAML config file
    #[arg(short, long)]
    config: Option<String>,

    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    #[arg(short, long, env = "GEMINI_MODEL")]
    model: Option<String>,

    #[arg(long)]
    api_base: Option<String>,

    /// Upper bound on a single provider call
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// trace, debug, info, warn, error
    #[arg(short, long, default_value = "info")]
    log_level: String,

    #[arg(long)]
    log_file: Option<String>,

    /// socks and http proxy, example: socks5://192.168.0.2:10080
    #[arg(long)]
    proxy: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let log_level = Level::from_str(&args.log_level).unwrap_or_else(|_| {
        eprintln!("Invalid log level: {}. Using INFO level.", args.log_level);
        Level::INFO
    });
    logging::init_logging(log_level, args.log_file.as_deref())?;

    let overrides = Overrides {
        api_key: args.api_key,
        api_base: args.api_base,
        model: args.model,
        timeout_secs: args.timeout_secs,
    };
    let config = Config::load(args.config.as_deref(), overrides)?;
    if let Some(path) = &args.config {
        info!("Configuration loaded from: {}", path);
    }
    if !config.gemini.has_api_key() {
        warn!("GEMINI_API_KEY is not set; chat requests will fail until it is provided");
    }

    let timeout = config.gemini.timeout();
    let client_builder = reqwest::Client::builder().timeout(timeout);
    let client_builder = match &args.proxy {
        Some(proxy) => client_builder.proxy(reqwest::Proxy::all(proxy)?),
        None => client_builder,
    };
    let http_client = Arc::new(client_builder.build()?);

    info!("Relaying to model {} at {}", config.gemini.model, config.gemini.api_base);
    let provider = GeminiProvider::new(http_client, config.gemini);
    let app = build_router(AppState {
        provider: Arc::new(provider),
        timeout,
        max_body_bytes: config.server.max_body_bytes,
    });

    let bind_address = format!("{}:{}", args.ip, args.port);
    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    info!("Server started on http://{}", bind_address);

    axum::serve(listener, app).await?;
    Ok(())
}
