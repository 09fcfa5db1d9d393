//! Programmatic configuration builder for integration tests

use std::net::SocketAddr;

use easel_config::{Config, CorsConfig, HealthConfig, ImageGenConfig, Preset, ServerConfig};
use secrecy::SecretString;

/// Key the mock provider expects in the `Authorization` header
pub const TEST_API_KEY: &str = "sk-test-key";

/// Environment variable that no test ever sets
pub const UNSET_KEY_ENV: &str = "EASEL_INTEGRATION_UNSET_KEY";

/// Builder for constructing test configurations
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Create a new builder with a static test key and health enabled
    pub fn new() -> Self {
        Self {
            config: Config {
                server: ServerConfig {
                    listen_address: Some(SocketAddr::from(([127, 0, 0, 1], 0))),
                    health: HealthConfig::default(),
                    cors: None,
                },
                imagegen: ImageGenConfig {
                    api_key: Some(SecretString::from(TEST_API_KEY)),
                    ..ImageGenConfig::default()
                },
                telemetry: None,
            },
        }
    }

    /// Point the provider at a mock backend
    pub fn with_stability(mut self, base_url: &str) -> Self {
        self.config.imagegen.base_url = Some(base_url.parse().expect("valid URL"));
        self
    }

    /// Select a generation preset
    pub fn with_preset(mut self, preset: Preset) -> Self {
        self.config.imagegen.preset = preset;
        self
    }

    /// Drop the static key and read it from a variable that is never set
    pub fn without_api_key(mut self) -> Self {
        self.config.imagegen.api_key = None;
        UNSET_KEY_ENV.clone_into(&mut self.config.imagegen.api_key_env);
        self
    }

    /// Set an outbound timeout
    pub fn with_timeout(mut self, timeout: &str) -> Self {
        self.config.imagegen.timeout = Some(timeout.to_owned());
        self
    }

    /// Set CORS configuration
    pub fn with_cors(mut self, config: CorsConfig) -> Self {
        self.config.server.cors = Some(config);
        self
    }

    /// Disable health endpoint
    pub fn without_health(mut self) -> Self {
        self.config.server.health.enabled = false;
        self
    }

    /// Build the final config
    pub fn build(self) -> Config {
        self.config
    }
}
