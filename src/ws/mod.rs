//! Transport side: per-connection sessions and the accept loop.

pub mod listener;
pub mod session;

pub use listener::serve;
pub use session::{SessionState, run_session};
