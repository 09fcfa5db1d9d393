use std::fmt;

use easel_config::ImageGenConfig;
use secrecy::{ExposeSecret, SecretString};

/// Where the provider API key comes from
///
/// Resolved on every request so that a key injected or rotated after
/// startup is picked up without a restart.
#[derive(Clone)]
pub enum ApiKeySource {
    /// Key set directly in the configuration file
    Static(SecretString),
    /// Name of an environment variable holding the key
    Env(String),
}

impl ApiKeySource {
    /// Pick the source from configuration; a non-empty static key wins
    pub fn from_config(config: &ImageGenConfig) -> Self {
        match config.api_key {
            Some(ref key) if !key.expose_secret().is_empty() => Self::Static(key.clone()),
            _ => Self::Env(config.api_key_env.clone()),
        }
    }

    /// Current key, or `None` when it is unset or empty
    pub fn resolve(&self) -> Option<SecretString> {
        match self {
            Self::Static(key) => Some(key.clone()).filter(|k| !k.expose_secret().is_empty()),
            Self::Env(name) => std::env::var(name)
                .ok()
                .filter(|value| !value.is_empty())
                .map(SecretString::from),
        }
    }
}

impl fmt::Display for ApiKeySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Static(_) => f.write_str("imagegen.api_key"),
            Self::Env(name) => write!(f, "environment variable {name}"),
        }
    }
}

impl fmt::Debug for ApiKeySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}
