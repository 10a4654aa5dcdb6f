//! TCP server
//!
//! This module implements the line-oriented TCP server: one command per
//! line in, one `[OK]`/`[ERROR]:` response out, each response followed by
//! an end-of-transmission marker so clients know where it ends.

use std::io::{BufRead, BufReader, Write};
use std::net::{TcpListener, TcpStream};
use std::path::PathBuf;

use crate::catalog::{Catalog, DEFAULT_STORAGE_ROOT};
use crate::error::Result;
use crate::executor::Executor;

/// Default server port
pub const DEFAULT_PORT: u16 = 8888;

/// Sent on its own line after every response
pub const END_OF_TRANSMISSION: char = '\u{4}';

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Host address to bind
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Directory under which databases are stored
    pub storage_root: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: DEFAULT_PORT,
            storage_root: PathBuf::from(DEFAULT_STORAGE_ROOT),
        }
    }
}

impl ServerConfig {
    /// Create a new server config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the host address
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Set the port
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the storage root directory
    pub fn storage_root(mut self, storage_root: impl Into<PathBuf>) -> Self {
        self.storage_root = storage_root.into();
        self
    }

    /// Get the bind address as a string
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Blocking TCP server
///
/// Clients are served one at a time: all connections share the one catalog
/// and its session state, so interleaving them would interleave their
/// current-database selections.
pub struct Server {
    config: ServerConfig,
    catalog: Catalog,
}

impl Server {
    /// Create a new server, opening (or creating) the storage root
    pub fn new(config: ServerConfig) -> Self {
        let catalog = Catalog::new(config.storage_root.clone());
        Self { config, catalog }
    }

    /// Bind and serve forever
    ///
    /// A failed or dropped connection is logged and never stops the accept
    /// loop.
    pub fn run(&mut self) -> Result<()> {
        let listener = TcpListener::bind(self.config.bind_address())?;
        tracing::info!(address = %self.config.bind_address(), "server listening");

        for stream in listener.incoming() {
            match stream {
                Ok(stream) => {
                    if let Err(error) = self.handle_connection(stream) {
                        tracing::warn!(%error, "connection ended with error");
                    }
                }
                Err(error) => {
                    tracing::warn!(%error, "failed to accept connection");
                }
            }
        }
        Ok(())
    }

    /// Serve one client until it disconnects
    fn handle_connection(&mut self, stream: TcpStream) -> Result<()> {
        let peer = stream
            .peer_addr()
            .map(|addr| addr.to_string())
            .unwrap_or_else(|_| "unknown".to_string());
        tracing::info!(%peer, "client connected");

        let mut reader = BufReader::new(stream.try_clone()?);
        let mut writer = stream;
        let mut line = String::new();

        loop {
            line.clear();
            if reader.read_line(&mut line)? == 0 {
                tracing::info!(%peer, "client disconnected");
                return Ok(());
            }
            let command = line.trim();
            if command.is_empty() {
                continue;
            }
            tracing::debug!(%peer, command, "received command");

            let response = Executor::new(&mut self.catalog).handle_command(command);
            writer.write_all(response.as_bytes())?;
            writer.write_all(format!("\n{}\n", END_OF_TRANSMISSION).as_bytes())?;
            writer.flush()?;
        }
    }
}
