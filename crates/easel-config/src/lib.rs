#![allow(clippy::must_use_candidate)]

pub mod cors;
mod env;
pub mod health;
pub mod imagegen;
mod loader;
pub mod server;
pub mod telemetry;

use serde::Deserialize;

pub use cors::*;
pub use env::ExpandError;
pub use health::*;
pub use imagegen::*;
pub use server::*;
pub use telemetry::TelemetryConfig;

/// Top-level Easel configuration
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Image generation upstream configuration
    #[serde(default)]
    pub imagegen: ImageGenConfig,
    /// Telemetry configuration
    #[serde(default)]
    pub telemetry: Option<TelemetryConfig>,
}
