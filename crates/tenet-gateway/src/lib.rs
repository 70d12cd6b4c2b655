//! HTTP API over a shared [`tenet_core::RagEngine`].

mod error;
mod handlers;
mod router;
mod server;

pub use error::{ApiError, GatewayError};
pub use server::GatewayServer;
