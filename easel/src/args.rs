use std::{net::SocketAddr, path::PathBuf};

use clap::Parser;

/// Easel image generation proxy
#[derive(Debug, Parser)]
#[command(name = "easel", about = "Relays text-to-image requests to Stability AI without exposing the API key")]
pub struct Args {
    /// Path to configuration file; built-in defaults are used when it does not exist
    #[arg(short, long, default_value = "easel.toml", env = "EASEL_CONFIG")]
    pub config: PathBuf,

    /// Override the listen address
    #[arg(long, env = "EASEL_LISTEN")]
    pub listen: Option<SocketAddr>,

    /// Log filter directives (e.g. `info` or `easel_imagegen=debug,info`)
    #[arg(long, default_value = "info", env = "EASEL_LOG")]
    pub log_level: String,
}
