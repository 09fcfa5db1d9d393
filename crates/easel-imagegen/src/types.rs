use serde::{Deserialize, Deserializer, Serialize, de::Error as _};
use serde_json::Value;

/// Format indicator returned with every image
pub const IMAGE_MIME_TYPE: &str = "image/png";

/// Inbound request from the frontend
///
/// `prompt` stays optional here so that an absent or `null` prompt is
/// reported as a validation error rather than a deserialization failure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GenerationRequest {
    /// Text description of the desired image
    #[serde(default, deserialize_with = "falsy_as_none")]
    pub prompt: Option<String>,
}

/// Read a prompt, treating `false` and `0` like `null`
///
/// Any other non-string value is rejected.
fn falsy_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null | Value::Bool(false)) => Ok(None),
        Some(Value::Number(n)) if n.as_f64().is_some_and(|v| v.classify() == std::num::FpCategory::Zero) => Ok(None),
        Some(Value::String(prompt)) => Ok(Some(prompt)),
        Some(_) => Err(D::Error::custom("prompt must be a string")),
    }
}

/// Successful response to the frontend
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationResponse {
    /// Base64-encoded image bytes
    pub image: String,
    pub mime_type: String,
}

/// First artifact returned by a provider
#[derive(Debug, Clone)]
pub struct GeneratedImage {
    /// Base64-encoded image bytes
    pub base64: String,
}
