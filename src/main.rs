mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use cli::Cli;
use keyq::{create_shared_broker, shutdown_channel, Config, WebServer};
use tokio::signal;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments first to get debug flag
    let cli = Cli::parse();

    let level = if cli.debug {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt().with_max_level(level).init();

    let mut config = Config::load(cli.config.as_deref()).context("Failed to load config")?;
    if let Some(port) = cli.port {
        config.server.port = port;
    }

    let broker = create_shared_broker(&config.broker);
    let server = WebServer::new(&config.server, broker, config.broker.enqueue_timeout());
    let listener = server.bind().await?;

    println!("🎯 keyq started");
    println!(
        "🌐 Listening on port {} (queue capacity {})",
        config.server.port, config.broker.capacity
    );
    println!("🛑 Press Ctrl+C to stop");

    let (shutdown_tx, shutdown_rx) = shutdown_channel();
    let mut server_handle = tokio::spawn(server.serve(listener, shutdown_rx));

    tokio::select! {
        result = signal::ctrl_c() => {
            result.context("Failed to listen for ctrl_c")?;
        }
        result = &mut server_handle => {
            // Server exited on its own; surface whatever stopped it
            return result.context("HTTP server task panicked")?;
        }
    }

    println!("\n🛑 Received Ctrl+C, shutting down...");
    shutdown_tx.shutdown();

    let grace = config.server.shutdown_grace();
    match tokio::time::timeout(grace, &mut server_handle).await {
        Ok(result) => result.context("HTTP server task panicked")??,
        Err(_) => {
            tracing::warn!(
                "In-flight requests still running after {:?}, forcing shutdown",
                grace
            );
            server_handle.abort();
        }
    }

    println!("👋 Server exiting");
    Ok(())
}
