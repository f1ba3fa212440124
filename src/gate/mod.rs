//! HTTP gateway
//!
//! Exposes the chat pipeline as `POST /api/RikoChat` plus a health check.

pub mod config;
pub mod handlers;
pub mod server;

pub use config::GatewayConfig;
pub use handlers::GatewayState;
pub use server::{build_router, start_server};
