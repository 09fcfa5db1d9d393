#![allow(
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_const_for_fn,
    clippy::module_name_repetitions
)]

mod credential;
mod error;
mod provider;
mod server;
mod types;

use std::sync::Arc;

use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::{HeaderMap, header},
    routing::post,
};

pub use credential::ApiKeySource;
pub use error::{ErrorCategory, ImageGenError, Result};
pub use server::{ImageGenServerBuilder, PROMPT_REQUIRED, Server};
pub use types::{GeneratedImage, GenerationRequest, GenerationResponse, IMAGE_MIME_TYPE};

/// Build the image generation server from configuration
///
/// Runs once at startup, before the route is registered.
///
/// # Errors
///
/// Returns an error if the server fails to initialize
pub fn build_server(config: &easel_config::Config) -> anyhow::Result<Arc<Server>> {
    let server = Arc::new(
        ImageGenServerBuilder::new(config)
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to initialize image generation server: {e}"))?,
    );
    Ok(server)
}

/// Create the endpoint router for image generation
pub fn endpoint_router() -> Router<Arc<Server>> {
    Router::new().route("/generate-image", post(generate_image))
}

/// Handle image generation requests
async fn generate_image(
    State(server): State<Arc<Server>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<GenerationResponse>> {
    let request = parse_request(&headers, &body)?;

    let response = server.generate_image(request.prompt.as_deref()).await?;

    tracing::debug!("Image generation complete");

    Ok(Json(response))
}

/// Decode the request body
///
/// A body that is empty or not sent as JSON is treated as `{}`, so the caller
/// sees the missing prompt rather than a media type or EOF error.
fn parse_request(headers: &HeaderMap, body: &[u8]) -> Result<GenerationRequest> {
    if body.is_empty() || !has_json_content_type(headers) {
        return Ok(GenerationRequest::default());
    }

    Json::<GenerationRequest>::from_bytes(body)
        .map(|Json(request)| request)
        .map_err(|rejection| {
            tracing::debug!(error = %rejection, "rejected image generation body");
            ImageGenError::InvalidRequest(format!("Invalid request body: {}", rejection.body_text()))
        })
}

/// `application/json` or any `+json` suffix, parameters ignored
fn has_json_content_type(headers: &HeaderMap) -> bool {
    let Some(content_type) = headers.get(header::CONTENT_TYPE).and_then(|v| v.to_str().ok()) else {
        return false;
    };

    let essence = content_type.split(';').next().unwrap_or_default().trim();
    let Some((kind, subtype)) = essence.split_once('/') else {
        return false;
    };

    kind.eq_ignore_ascii_case("application")
        && (subtype.eq_ignore_ascii_case("json") || subtype.to_ascii_lowercase().ends_with("+json"))
}

#[cfg(test)]
mod tests {
    use axum::http::{HeaderValue, StatusCode};

    use super::*;

    fn json_headers(content_type: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
        headers
    }

    #[test]
    fn empty_json_body_is_an_empty_request() {
        let request = parse_request(&json_headers("application/json"), b"").unwrap();
        assert!(request.prompt.is_none());
    }

    #[test]
    fn non_json_body_is_an_empty_request() {
        let request = parse_request(&HeaderMap::new(), b"prompt=a red fox").unwrap();
        assert!(request.prompt.is_none());

        let request = parse_request(&json_headers("text/plain"), br#"{"prompt":"a red fox"}"#).unwrap();
        assert!(request.prompt.is_none());
    }

    #[test]
    fn json_content_type_accepts_parameters_and_suffixes() {
        for content_type in ["application/json", "application/json; charset=utf-8", "application/vnd.api+json"] {
            let request = parse_request(&json_headers(content_type), br#"{"prompt":"a red fox"}"#).unwrap();
            assert_eq!(request.prompt.as_deref(), Some("a red fox"), "{content_type}");
        }
    }

    #[test]
    fn syntax_error_is_an_invalid_request() {
        let err = parse_request(&json_headers("application/json"), br#"{"prompt": "#).unwrap_err();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert!(err.client_message().starts_with("Invalid request body: "));
    }
}
