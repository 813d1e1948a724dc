//! Serve command implementation

use super::CommonArgs;
use crate::server::SplitServer;
use anyhow::{Context, Result};
use clap::Args;
use std::sync::Arc;

/// Arguments for the serve command
#[derive(Debug, Args)]
pub struct ServeArgs {
    /// Address to bind (default from configuration: 127.0.0.1)
    #[arg(long, value_name = "HOST")]
    pub host: Option<String>,

    /// Port to bind (default from configuration: 7005)
    #[arg(short, long, value_name = "PORT")]
    pub port: Option<u16>,

    /// Exit after handling this many connections
    #[arg(long, value_name = "N", hide = true)]
    pub max_connections: Option<usize>,

    #[command(flatten)]
    pub common: CommonArgs,
}

impl ServeArgs {
    /// Execute the serve command
    pub fn execute(&self) -> Result<()> {
        self.common.init_logging();
        let config = self.common.load_config()?;
        let host = self.host.as_deref().unwrap_or(&config.server.host);
        let port = self.port.unwrap_or(config.server.port);

        let manager = Arc::new(self.common.manager(&config)?);
        let server = SplitServer::bind(&format!("{host}:{port}"), Arc::clone(&manager))?;

        let shutdown = server.shutdown_handle()?;
        ctrlc::set_handler(move || {
            log::info!("Interrupted, shutting down");
            shutdown.shutdown();
        })
        .context("Failed to install signal handler")?;

        eprintln!("Listening at {}", server.local_addr()?);
        let served = server.serve(self.max_connections);

        // engines are stopped even when serving failed
        let stopped = manager.shutdown_all();
        log::info!("Stopped {stopped} engines");
        served
    }
}
