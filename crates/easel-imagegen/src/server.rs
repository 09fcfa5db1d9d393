use crate::{
    credential::ApiKeySource,
    error::ImageGenError,
    provider::{ImageGenProvider, stability::StabilityProvider},
    types::{GenerationResponse, IMAGE_MIME_TYPE},
};

/// Message returned when the prompt is absent or empty
pub const PROMPT_REQUIRED: &str = "Prompt is required.";

/// Image generation server holding the provider and its credential source
///
/// Built once at startup. Requests share the provider's HTTP client and
/// nothing else.
pub struct Server {
    provider: Box<dyn ImageGenProvider>,
    credentials: ApiKeySource,
}

impl Server {
    pub(crate) fn new(provider: Box<dyn ImageGenProvider>, credentials: ApiKeySource) -> Self {
        Self { provider, credentials }
    }

    /// Generate one image for `prompt`
    ///
    /// The prompt is checked first, then the API key is resolved. No
    /// outbound call is made unless both are present.
    pub async fn generate_image(&self, prompt: Option<&str>) -> crate::error::Result<GenerationResponse> {
        let prompt = prompt
            .filter(|p| !p.is_empty())
            .ok_or_else(|| ImageGenError::InvalidRequest(PROMPT_REQUIRED.to_string()))?;

        let api_key = self.credentials.resolve().ok_or_else(|| {
            tracing::error!(
                provider = %self.provider.name(),
                source = %self.credentials,
                "provider API key not configured or inaccessible"
            );
            ImageGenError::Configuration(format!("no API key available from {}", self.credentials))
        })?;

        tracing::info!(
            provider = %self.provider.name(),
            prompt_chars = prompt.chars().count(),
            "generating image"
        );
        tracing::debug!(prompt = %prompt, "image prompt");

        let image = self.provider.text_to_image(prompt, &api_key).await?;

        Ok(GenerationResponse {
            image: image.base64,
            mime_type: IMAGE_MIME_TYPE.to_string(),
        })
    }
}

/// Builder for constructing the image generation server from configuration
pub struct ImageGenServerBuilder<'a> {
    config: &'a easel_config::Config,
}

impl<'a> ImageGenServerBuilder<'a> {
    pub fn new(config: &'a easel_config::Config) -> Self {
        Self { config }
    }

    pub fn build(self) -> crate::error::Result<Server> {
        let imagegen = &self.config.imagegen;
        let profile = imagegen.profile();

        let timeout = imagegen
            .timeout_duration()
            .map_err(|e| ImageGenError::Configuration(e.to_string()))?;

        tracing::debug!(
            engine = %profile.engine,
            width = profile.width,
            height = profile.height,
            steps = profile.steps,
            "initializing Stability AI provider"
        );

        let provider = StabilityProvider::new(profile, imagegen.base_url.as_ref().map(url::Url::as_str), timeout)?;
        let credentials = ApiKeySource::from_config(imagegen);

        if credentials.resolve().is_none() {
            tracing::warn!(
                source = %credentials,
                "provider API key is not set yet; requests will fail until it is"
            );
        }

        Ok(Server::new(Box::new(provider), credentials))
    }
}
