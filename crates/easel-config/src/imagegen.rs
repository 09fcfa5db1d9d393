use std::time::Duration;

use secrecy::SecretString;
use serde::Deserialize;
use url::Url;

/// Environment variable holding the provider key unless overridden
pub const DEFAULT_API_KEY_ENV: &str = "STABILITY_KEY";

/// Upstream text-to-image configuration
///
/// Generation parameters come from [`Preset`] and may be overridden one
/// field at a time. None of them can be changed per request.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ImageGenConfig {
    /// Named generation profile
    #[serde(default)]
    pub preset: Preset,
    /// Static API key; takes precedence over `api_key_env`
    #[serde(default)]
    pub api_key: Option<SecretString>,
    /// Environment variable read on every request when no static key is set
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    /// Provider base URL override
    #[serde(default)]
    pub base_url: Option<Url>,
    /// Outbound request timeout (e.g. "60s"); no timeout when unset
    #[serde(default)]
    pub timeout: Option<String>,
    #[serde(default)]
    pub engine: Option<String>,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default)]
    pub steps: Option<u32>,
    #[serde(default)]
    pub cfg_scale: Option<f32>,
    #[serde(default)]
    pub clip_guidance_preset: Option<String>,
    #[serde(default)]
    pub prompt_weight: Option<f32>,
}

impl Default for ImageGenConfig {
    fn default() -> Self {
        Self {
            preset: Preset::default(),
            api_key: None,
            api_key_env: default_api_key_env(),
            base_url: None,
            timeout: None,
            engine: None,
            width: None,
            height: None,
            steps: None,
            cfg_scale: None,
            clip_guidance_preset: None,
            prompt_weight: None,
        }
    }
}

impl ImageGenConfig {
    /// Resolve the effective generation profile: preset plus overrides
    pub fn profile(&self) -> GenerationProfile {
        let mut profile = self.preset.profile();

        if let Some(ref engine) = self.engine {
            profile.engine.clone_from(engine);
        }
        if let Some(width) = self.width {
            profile.width = width;
        }
        if let Some(height) = self.height {
            profile.height = height;
        }
        if let Some(steps) = self.steps {
            profile.steps = steps;
        }
        if let Some(cfg_scale) = self.cfg_scale {
            profile.cfg_scale = cfg_scale;
        }
        if self.clip_guidance_preset.is_some() {
            profile.clip_guidance_preset.clone_from(&self.clip_guidance_preset);
        }
        if self.prompt_weight.is_some() {
            profile.prompt_weight = self.prompt_weight;
        }

        profile
    }

    /// Parse the configured timeout
    ///
    /// # Errors
    ///
    /// Returns an error if the timeout is not a valid duration string
    pub fn timeout_duration(&self) -> anyhow::Result<Option<Duration>> {
        self.timeout
            .as_deref()
            .map(|raw| duration_str::parse(raw).map_err(|e| anyhow::anyhow!("invalid imagegen.timeout '{raw}': {e}")))
            .transpose()
    }
}

/// Built-in generation profiles
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub enum Preset {
    /// Stable Diffusion 1.6 at 512x512
    #[serde(rename = "sd-v1-6")]
    StableDiffusionV16,
    /// SDXL 1.0 at 1024x1024 with the `FAST_BLUE` CLIP guidance preset
    #[default]
    #[serde(rename = "sdxl-v1-0")]
    StableDiffusionXlV10,
}

impl Preset {
    /// Parameters for this preset
    pub fn profile(self) -> GenerationProfile {
        match self {
            Self::StableDiffusionV16 => GenerationProfile {
                engine: "stable-diffusion-v1-6".to_owned(),
                width: 512,
                height: 512,
                steps: 30,
                cfg_scale: 7.0,
                clip_guidance_preset: None,
                prompt_weight: None,
            },
            Self::StableDiffusionXlV10 => GenerationProfile {
                engine: "stable-diffusion-xl-1024-v1-0".to_owned(),
                width: 1024,
                height: 1024,
                steps: 30,
                cfg_scale: 7.0,
                clip_guidance_preset: Some("FAST_BLUE".to_owned()),
                prompt_weight: Some(1.0),
            },
        }
    }
}

/// Fixed parameters sent with every text-to-image call
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationProfile {
    /// Provider engine identifier, part of the endpoint path
    pub engine: String,
    pub width: u32,
    pub height: u32,
    /// Diffusion step count
    pub steps: u32,
    /// Classifier-free guidance scale
    pub cfg_scale: f32,
    pub clip_guidance_preset: Option<String>,
    /// Weight attached to the single text prompt
    pub prompt_weight: Option<f32>,
}

impl GenerationProfile {
    /// Check the profile against the provider's accepted ranges
    ///
    /// # Errors
    ///
    /// Returns an error describing the first out-of-range field
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.engine.trim().is_empty() {
            anyhow::bail!("imagegen.engine must not be empty");
        }

        for (field, value) in [("width", self.width), ("height", self.height)] {
            if !(128..=2048).contains(&value) || value % 64 != 0 {
                anyhow::bail!("imagegen.{field} must be a multiple of 64 between 128 and 2048, got {value}");
            }
        }

        if !(10..=150).contains(&self.steps) {
            anyhow::bail!("imagegen.steps must be between 10 and 150, got {}", self.steps);
        }

        if !(0.0..=35.0).contains(&self.cfg_scale) {
            anyhow::bail!("imagegen.cfg_scale must be between 0 and 35, got {}", self.cfg_scale);
        }

        Ok(())
    }
}

fn default_api_key_env() -> String {
    DEFAULT_API_KEY_ENV.to_owned()
}
