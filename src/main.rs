//! relay-chat server entry point.
//!
//! Binds the TCP listener and relays chat messages between WebSocket peers.

use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use relay_chat::config::ServerConfig;
use relay_chat::domain::ConnectionRegistry;
use relay_chat::ws;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = ServerConfig::from_env().context("loading configuration")?;
    tracing::info!(addr = %config.listen_addr, "starting relay-chat");

    // The registry lives as long as the listener that feeds it.
    let registry = Arc::new(ConnectionRegistry::new());

    let listener = TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("binding {}", config.listen_addr))?;
    tracing::info!(addr = %config.listen_addr, "websocket chat server listening");

    ws::serve(listener, registry, config.read_buffer_size).await;

    Ok(())
}
