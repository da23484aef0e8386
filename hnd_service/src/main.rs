//! HND Metrics Service - Main
//!
//! Serves the gauge pages of the Bavarian flood service as Prometheus
//! metrics. Every scrape of /metrics?station={pgnr} fetches and parses the
//! station page once; nothing is cached between requests.
//!
//! Usage:
//!   cargo run --release                                # Listen on the configured address
//!   cargo run --release -- --listen 127.0.0.1:9142     # Override the listen address
//!   cargo run --release -- --config /etc/hnd/hnd.toml  # Use another configuration file
//!
//! Environment:
//!   HND_LISTEN_ADDR, HND_BASE_URL, HND_TIMEZONE - override hnd.toml
//!   RUST_LOG - log filter (default: info)

use hnd_service::config::{ServiceConfig, DEFAULT_CONFIG_PATH};
use hnd_service::endpoint;
use std::env;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    println!("🌊 HND Metrics Service");
    println!("======================\n");

    // Parse command-line arguments
    let args: Vec<String> = env::args().collect();
    let mut config_path = PathBuf::from(DEFAULT_CONFIG_PATH);
    let mut listen_addr: Option<String> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--config" | "--listen" if i + 1 >= args.len() => {
                eprintln!("Error: {} requires a value", args[i]);
                std::process::exit(1);
            }
            "--config" => {
                config_path = PathBuf::from(&args[i + 1]);
                i += 2;
            }
            "--listen" => {
                listen_addr = Some(args[i + 1].clone());
                i += 2;
            }
            _ => {
                eprintln!("Unknown argument: {}", args[i]);
                eprintln!("Usage: {} [--config PATH] [--listen ADDR]", args[0]);
                std::process::exit(1);
            }
        }
    }

    println!("📋 Loading configuration from {}...", config_path.display());
    let mut config = match ServiceConfig::load_with_env(&config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("\n❌ Configuration error: {}\n", e);
            std::process::exit(1);
        }
    };
    if let Some(addr) = listen_addr {
        config.listen_addr = addr;
    }
    println!("   Station pages: {}", config.base_url);
    println!("   Timezone:      {}", config.timezone);
    println!("   Workers:       {}\n", config.workers);

    println!("🚀 Starting HTTP endpoint on http://{}", config.listen_addr);
    println!("   GET /metrics?station={{station_id}}");
    println!("   GET /health\n");

    if let Err(e) = endpoint::start_endpoint_server(&config) {
        eprintln!("\n❌ Endpoint server error: {}", e);
        std::process::exit(1);
    }
}
