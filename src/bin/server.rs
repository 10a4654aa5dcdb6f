//! TabDB server binary

use std::env;

use anyhow::Result;
use tracing_subscriber::EnvFilter;

use tabdb::server::{Server, ServerConfig};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args: Vec<String> = env::args().collect();
    let mut config = ServerConfig::new();

    // Simple argument parsing
    for i in 1..args.len() {
        if args[i] == "--port" || args[i] == "-p" {
            if let Some(port) = args.get(i + 1) {
                config = config.port(port.parse()?);
            }
        }
        if args[i] == "--data-dir" {
            if let Some(dir) = args.get(i + 1) {
                config = config.storage_root(dir.clone());
            }
        }
    }

    println!("Starting TabDB server on {}", config.bind_address());
    Server::new(config).run()?;
    Ok(())
}
