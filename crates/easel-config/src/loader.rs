use std::path::Path;

use secrecy::ExposeSecret;

use crate::Config;

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Reads the file, expands `{{ env.VAR }}` placeholders, then
    /// deserializes and validates the result.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, environment variable
    /// expansion fails, TOML parsing fails, or validation fails
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("failed to read config file {}: {e}", path.display()))?;

        Self::from_toml_str(&raw)
    }

    /// Parse and validate configuration from TOML text
    ///
    /// # Errors
    ///
    /// Returns an error if expansion, parsing or validation fails
    pub fn from_toml_str(raw: &str) -> anyhow::Result<Self> {
        let expanded = crate::env::expand_env(raw).map_err(|e| anyhow::anyhow!("config variable expansion failed: {e}"))?;

        let config: Self = toml::from_str(&expanded).map_err(|e| anyhow::anyhow!("failed to parse config: {e}"))?;

        config.validate()?;

        Ok(config)
    }

    /// Validate that the configuration is internally consistent
    ///
    /// A missing provider key is not an error here: the key is resolved on
    /// every request so it can be injected after startup.
    ///
    /// # Errors
    ///
    /// Returns an error if the generation profile, upstream URL, timeout or
    /// telemetry settings are invalid
    pub fn validate(&self) -> anyhow::Result<()> {
        self.validate_imagegen_config()?;
        self.validate_telemetry_config()?;
        Ok(())
    }

    fn validate_imagegen_config(&self) -> anyhow::Result<()> {
        let imagegen = &self.imagegen;

        imagegen.profile().validate()?;
        imagegen.timeout_duration()?;

        if let Some(ref url) = imagegen.base_url
            && !matches!(url.scheme(), "http" | "https")
        {
            anyhow::bail!("imagegen.base_url must use http or https, got '{}'", url.scheme());
        }

        let has_static_key = imagegen
            .api_key
            .as_ref()
            .is_some_and(|key| !key.expose_secret().is_empty());

        if !has_static_key && imagegen.api_key_env.trim().is_empty() {
            anyhow::bail!("imagegen.api_key_env must not be empty when no api_key is set");
        }

        Ok(())
    }

    fn validate_telemetry_config(&self) -> anyhow::Result<()> {
        let Some(ref telemetry) = self.telemetry else {
            return Ok(());
        };

        if !(0.0..=1.0).contains(&telemetry.sampling.rate) {
            anyhow::bail!("telemetry.sampling.rate must be between 0.0 and 1.0");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::{AnyOrArray, Config, Preset};

    #[test]
    fn empty_file_is_a_valid_config() {
        let config = Config::from_toml_str("").unwrap();
        assert!(config.server.listen_address.is_none());
        assert!(config.server.health.enabled);
        assert!(config.server.cors.is_none());
        assert_eq!(config.imagegen.preset, Preset::StableDiffusionXlV10);
        assert!(config.telemetry.is_none());
    }

    #[test]
    fn full_config_round_trips_through_expansion() {
        temp_env::with_var("EASEL_LOADER_KEY", Some("sk-from-env"), || {
            let config = Config::from_toml_str(
                r#"
                [server]
                listen_address = "127.0.0.1:9000"

                [server.health]
                path = "/healthz"

                [server.cors]
                origins = ["https://app.example"]

                [imagegen]
                preset = "sd-v1-6"
                api_key = "{{ env.EASEL_LOADER_KEY }}"
                base_url = "http://localhost:8089"
                timeout = "30s"

                [telemetry]
                service_name = "easel-test"
                "#,
            )
            .unwrap();

            assert_eq!(config.server.listen_address.unwrap().port(), 9000);
            assert_eq!(config.server.health.path, "/healthz");
            assert_eq!(
                config.server.cors.unwrap().origins,
                AnyOrArray::List(vec!["https://app.example".to_owned()])
            );
            assert!(config.imagegen.api_key.is_some());
            assert_eq!(config.telemetry.unwrap().service_name, "easel-test");
        });
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = Config::from_toml_str("[imagegen]\nsamples = 4\n").unwrap_err();
        assert!(err.to_string().contains("failed to parse config"));
    }

    #[test]
    fn unset_placeholder_fails_expansion() {
        temp_env::with_var_unset("EASEL_LOADER_MISSING", || {
            let err = Config::from_toml_str("[imagegen]\napi_key = \"{{ env.EASEL_LOADER_MISSING }}\"\n").unwrap_err();
            assert!(err.to_string().contains("EASEL_LOADER_MISSING"));
        });
    }

    #[test]
    fn invalid_profile_override_fails_validation() {
        let err = Config::from_toml_str("[imagegen]\nheight = 1000\n").unwrap_err();
        assert!(err.to_string().contains("imagegen.height"));
    }

    #[test]
    fn non_http_base_url_fails_validation() {
        let err = Config::from_toml_str("[imagegen]\nbase_url = \"ftp://example.com\"\n").unwrap_err();
        assert!(err.to_string().contains("http or https"));
    }

    #[test]
    fn blank_api_key_env_without_static_key_fails_validation() {
        assert!(Config::from_toml_str("[imagegen]\napi_key_env = \"\"\n").is_err());
    }

    #[test]
    fn sampling_rate_out_of_range_fails_validation() {
        let err = Config::from_toml_str("[telemetry.sampling]\nrate = 2.0\n").unwrap_err();
        assert!(err.to_string().contains("telemetry.sampling.rate"));
    }

    #[test]
    fn bad_timeout_fails_validation() {
        assert!(Config::from_toml_str("[imagegen]\ntimeout = \"whenever\"\n").is_err());
    }
}
