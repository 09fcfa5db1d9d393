pub(crate) mod stability;

use async_trait::async_trait;
use secrecy::SecretString;

use crate::{error::Result, types::GeneratedImage};

/// Trait for text-to-image provider implementations
#[async_trait]
pub(crate) trait ImageGenProvider: Send + Sync {
    /// Generate one image for `prompt`, authenticating with `api_key`
    async fn text_to_image(&self, prompt: &str, api_key: &SecretString) -> Result<GeneratedImage>;

    /// Get the provider name
    fn name(&self) -> &str;
}
