//! Reqwest-backed OpenAI content generator.
//!
//! This adapter owns transport details only: request serialisation, timeout
//! and HTTP error mapping, and pulling the reply text out of the response.
//! Interpreting that text as a lesson is the domain's job.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use zeroize::Zeroizing;

use super::dto::{ResponsesRequestDto, ResponsesResponseDto};
use crate::domain::ports::{ContentGenerator, ContentGeneratorError, GeneratorReply};

/// Connection settings for the provider.
pub struct OpenAiConfig {
    /// Base URL up to and including the API version, e.g. `https://api.openai.com/v1`.
    pub base_url: Url,
    pub api_key: Zeroizing<String>,
    pub model: String,
    pub timeout: Duration,
}

/// Content generator that calls `POST {base_url}/responses`.
pub struct OpenAiContentGenerator {
    client: Client,
    endpoint: Url,
    api_key: Zeroizing<String>,
    model: String,
}

impl OpenAiContentGenerator {
    /// Build an adapter using a reqwest client with an explicit request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed or the
    /// endpoint cannot be derived from the base URL.
    pub fn new(config: OpenAiConfig) -> Result<Self, ContentGeneratorError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|err| ContentGeneratorError::transport(err.to_string()))?;
        let endpoint = responses_endpoint(&config.base_url)?;
        Ok(Self {
            client,
            endpoint,
            api_key: config.api_key,
            model: config.model,
        })
    }
}

fn responses_endpoint(base_url: &Url) -> Result<Url, ContentGeneratorError> {
    let base = format!("{}/", base_url.as_str().trim_end_matches('/'));
    Url::parse(&base)
        .and_then(|url| url.join("responses"))
        .map_err(|err| ContentGeneratorError::invalid_request(format!("invalid base URL: {err}")))
}

#[async_trait]
impl ContentGenerator for OpenAiContentGenerator {
    async fn generate(&self, prompt: &str) -> Result<GeneratorReply, ContentGeneratorError> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .bearer_auth(self.api_key.as_str())
            .header(reqwest::header::ACCEPT, "application/json")
            .json(&ResponsesRequestDto {
                model: &self.model,
                input: prompt,
            })
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        let body = response.bytes().await.map_err(map_transport_error)?;
        if !status.is_success() {
            return Err(map_status_error(status, body.as_ref()));
        }
        parse_reply(body.as_ref(), &self.model)
    }
}

fn parse_reply(body: &[u8], requested_model: &str) -> Result<GeneratorReply, ContentGeneratorError> {
    let decoded: ResponsesResponseDto = serde_json::from_slice(body).map_err(|error| {
        ContentGeneratorError::decode(format!("invalid response JSON payload: {error}"))
    })?;
    let model = decoded
        .model
        .clone()
        .unwrap_or_else(|| requested_model.to_owned());
    let text = decoded
        .first_text()
        .ok_or_else(|| ContentGeneratorError::decode("response contained no output text"))?;
    Ok(GeneratorReply { model, text })
}

fn map_transport_error(error: reqwest::Error) -> ContentGeneratorError {
    if error.is_timeout() {
        ContentGeneratorError::timeout(error.to_string())
    } else {
        ContentGeneratorError::transport(error.to_string())
    }
}

fn map_status_error(status: StatusCode, body: &[u8]) -> ContentGeneratorError {
    let body_preview = body_preview(body);
    let message = if body_preview.is_empty() {
        format!("status {}", status.as_u16())
    } else {
        format!("status {}: {}", status.as_u16(), body_preview)
    };

    match status {
        StatusCode::TOO_MANY_REQUESTS => ContentGeneratorError::rate_limited(message),
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => {
            ContentGeneratorError::timeout(message)
        }
        _ if status.is_client_error() => ContentGeneratorError::invalid_request(message),
        _ => ContentGeneratorError::transport(message),
    }
}

fn body_preview(body: &[u8]) -> String {
    const PREVIEW_CHAR_LIMIT: usize = 160;

    let compact = String::from_utf8_lossy(body)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let preview = compact.chars().take(PREVIEW_CHAR_LIMIT).collect::<String>();
    if compact.chars().count() > PREVIEW_CHAR_LIMIT {
        format!("{preview}...")
    } else {
        preview
    }
}
