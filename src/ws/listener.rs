//! TCP accept loop.
//!
//! Spawns one independent task per accepted stream and never waits for it.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpListener;

use super::session::run_session;
use crate::domain::ConnectionRegistry;

/// Pause after a failed `accept` so descriptor exhaustion does not spin.
const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// Accepts connections forever, running [`run_session`] for each on its own
/// task against the shared `registry`.
///
/// Accept and session failures are logged and never stop the loop.
pub async fn serve(
    listener: TcpListener,
    registry: Arc<ConnectionRegistry>,
    read_buffer_size: usize,
) {
    accept_loop(|| listener.accept(), registry, read_buffer_size).await;
}

async fn accept_loop<S, F, Fut>(
    mut accept: F,
    registry: Arc<ConnectionRegistry>,
    read_buffer_size: usize,
)
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    F: FnMut() -> Fut,
    Fut: Future<Output = std::io::Result<(S, SocketAddr)>>,
{
    loop {
        let (stream, peer) = match accept().await {
            Ok(accepted) => accepted,
            Err(error) => {
                tracing::warn!(%error, "accept failed");
                tokio::time::sleep(ACCEPT_BACKOFF).await;
                continue;
            }
        };
        tracing::debug!(%peer, "accepted connection");

        let registry = Arc::clone(&registry);
        tokio::spawn(async move {
            match run_session(stream, registry, read_buffer_size).await {
                Ok(()) => {}
                Err(err) if err.is_handshake_failure() => {
                    tracing::debug!(%peer, error = %err, "handshake rejected");
                }
                Err(err) => {
                    tracing::warn!(%peer, error = %err, "session ended with error");
                }
            }
        });
    }
}
