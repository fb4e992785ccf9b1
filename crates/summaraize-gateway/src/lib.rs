//! summaraize-gateway: JSON HTTP API for the web front-end
//!
//! Exposes the summarize, optimize, and ask flows plus a provider status
//! endpoint. Per-provider failure details are logged, never returned.

pub mod protocol;
pub mod server;

pub use server::{AppState, GatewayServer, app};
