use std::{borrow::Cow, time::Duration};

use async_trait::async_trait;
use easel_config::GenerationProfile;
use reqwest::{Client, header};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use super::ImageGenProvider;
use crate::{
    error::{ImageGenError, Result},
    types::GeneratedImage,
};

/// Default Stability AI API base URL
pub(crate) const DEFAULT_BASE_URL: &str = "https://api.stability.ai";

/// Only one image is ever requested per call
const SAMPLES: u32 = 1;

/// Longest slice of a provider error body written to the log
const MAX_LOGGED_BODY: usize = 1024;

/// Stability AI v1 text-to-image provider
pub(crate) struct StabilityProvider {
    name: String,
    client: Client,
    endpoint: String,
    profile: GenerationProfile,
}

impl StabilityProvider {
    /// Create a provider for a fixed generation profile
    ///
    /// The HTTP client is built once here and shared by all requests.
    pub fn new(profile: GenerationProfile, base_url: Option<&str>, timeout: Option<Duration>) -> Result<Self> {
        let base_url = base_url.unwrap_or(DEFAULT_BASE_URL).trim_end_matches('/');
        let endpoint = format!("{base_url}/v1/generation/{}/text-to-image", profile.engine);

        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        let client = builder
            .build()
            .map_err(|e| ImageGenError::Configuration(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            name: "stability".to_string(),
            client,
            endpoint,
            profile,
        })
    }
}

/// Wire format for the text-to-image request
#[derive(Serialize)]
struct TextToImageRequest<'a> {
    text_prompts: [TextPrompt<'a>; 1],
    cfg_scale: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    clip_guidance_preset: Option<&'a str>,
    height: u32,
    width: u32,
    samples: u32,
    steps: u32,
}

#[derive(Serialize)]
struct TextPrompt<'a> {
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    weight: Option<f32>,
}

/// Wire format for both success and error bodies
///
/// Successful calls carry `artifacts`; failures carry `message` (plus `id`
/// and `name`, which are only logged).
#[derive(Deserialize)]
struct TextToImageResponse {
    #[serde(default)]
    artifacts: Vec<Artifact>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Artifact {
    base64: String,
    #[serde(default)]
    seed: Option<u64>,
    #[serde(default)]
    finish_reason: Option<String>,
}

/// Render an error with its full source chain
///
/// `reqwest` keeps the interesting part (timeout, DNS, TLS) in the sources.
fn error_chain(error: &dyn std::error::Error) -> String {
    let mut text = error.to_string();
    let mut source = error.source();

    while let Some(inner) = source {
        text.push_str(": ");
        text.push_str(&inner.to_string());
        source = inner.source();
    }

    text
}

/// Leading part of a response body, for logging
fn body_excerpt(body: &[u8]) -> Cow<'_, str> {
    String::from_utf8_lossy(body.get(..MAX_LOGGED_BODY).unwrap_or(body))
}

#[async_trait]
impl ImageGenProvider for StabilityProvider {
    async fn text_to_image(&self, prompt: &str, api_key: &SecretString) -> Result<GeneratedImage> {
        let wire_request = TextToImageRequest {
            text_prompts: [TextPrompt {
                text: prompt,
                weight: self.profile.prompt_weight,
            }],
            cfg_scale: self.profile.cfg_scale,
            clip_guidance_preset: self.profile.clip_guidance_preset.as_deref(),
            height: self.profile.height,
            width: self.profile.width,
            samples: SAMPLES,
            steps: self.profile.steps,
        };

        tracing::debug!(
            provider = %self.name,
            engine = %self.profile.engine,
            "sending text-to-image request"
        );

        let response = self
            .client
            .post(&self.endpoint)
            .header(header::AUTHORIZATION, format!("Bearer {}", api_key.expose_secret()))
            .header(header::ACCEPT, "application/json")
            .json(&wire_request)
            .send()
            .await
            .map_err(|e| {
                let detail = error_chain(&e);
                tracing::error!(provider = %self.name, error = %detail, "text-to-image request failed");
                ImageGenError::Transport(detail)
            })?;

        let status = response.status();

        let body = response.bytes().await.map_err(|e| {
            let detail = error_chain(&e);
            tracing::error!(provider = %self.name, error = %detail, "failed to read provider response");
            ImageGenError::Transport(detail)
        })?;

        if !status.is_success() {
            let message = serde_json::from_slice::<TextToImageResponse>(&body)
                .ok()
                .and_then(|parsed| parsed.message);

            tracing::error!(
                provider = %self.name,
                status = %status,
                body_len = body.len(),
                body = %body_excerpt(&body),
                "Stability AI API error"
            );

            return Err(ImageGenError::Provider {
                status: Some(status.as_u16()),
                message,
            });
        }

        let wire_response: TextToImageResponse = serde_json::from_slice(&body).map_err(|e| {
            tracing::error!(
                provider = %self.name,
                error = %e,
                "failed to parse Stability AI response"
            );
            ImageGenError::Transport(format!("malformed provider response: {e}"))
        })?;

        let Some(artifact) = wire_response.artifacts.into_iter().next() else {
            tracing::error!(
                provider = %self.name,
                status = %status,
                message = wire_response.message.as_deref().unwrap_or_default(),
                "Stability AI returned no artifacts"
            );

            return Err(ImageGenError::Provider {
                status: Some(status.as_u16()),
                message: wire_response.message,
            });
        };

        tracing::debug!(
            provider = %self.name,
            seed = ?artifact.seed,
            finish_reason = ?artifact.finish_reason,
            "text-to-image request complete"
        );

        Ok(GeneratedImage { base64: artifact.base64 })
    }

    fn name(&self) -> &str {
        &self.name
    }
}
