//! HTTP gateway for async generation endpoints.
//!
//! Jobs are created with `POST {endpoint}/generate` and the `X-OctoAI-Async`
//! header. The response carries a poll URL; once polling reports `completed`
//! it also carries the URL of the results.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;

use super::provider::InferenceGateway;
use crate::config::GatewayCredentials;
use crate::error::{GatewayError, GatewayResult};
use crate::types::{GeneratedImage, GenerationRequest, GenerationResult, JobHandle, JobStatus};

/// Gateway speaking the async HTTP protocol.
pub struct HttpGateway {
    endpoint: String,
    token: String,
    client: reqwest::Client,
    request_timeout: Duration,
}

impl HttpGateway {
    pub fn new(credentials: &GatewayCredentials) -> Self {
        Self {
            endpoint: credentials.endpoint.trim_end_matches('/').to_string(),
            token: credentials.token.clone(),
            client: reqwest::Client::new(),
            request_timeout: credentials.request_timeout,
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str, what: &str) -> GatewayResult<T> {
        let resp = self
            .client
            .get(url)
            .bearer_auth(&self.token)
            .header("Content-Type", "application/json")
            .timeout(self.request_timeout)
            .send()
            .await
            .map_err(|e| GatewayError::Unexpected(format!("{what} request failed: {e}")))?;
        read_json(resp, what).await
    }
}

// --- Response types ---

#[derive(Deserialize)]
struct SubmitResponse {
    poll_url: Option<String>,
    id: Option<String>,
    response_id: Option<String>,
}

#[derive(Deserialize)]
struct StatusResponse {
    status: String,
    response_url: Option<String>,
}

#[derive(Deserialize)]
struct ResultResponse {
    image: Option<String>,
    images: Option<Vec<String>>,
    clip: Option<TextField>,
    story: Option<TextField>,
}

/// Auxiliary text: one string for the first image, or one per image.
#[derive(Deserialize)]
#[serde(untagged)]
enum TextField {
    One(String),
    Many(Vec<String>),
}

impl TextField {
    fn at(&self, index: usize) -> Option<String> {
        match self {
            TextField::One(text) if index == 0 => Some(text.clone()),
            TextField::One(_) => None,
            TextField::Many(texts) => texts.get(index).cloned(),
        }
    }
}

#[async_trait]
impl InferenceGateway for HttpGateway {
    fn name(&self) -> &str {
        "http"
    }

    async fn submit(&self, request: &GenerationRequest) -> GatewayResult<JobHandle> {
        let url = format!("{}/generate", self.endpoint);
        tracing::debug!("Submitting job to {url}: {request:?}");

        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .header("Content-Type", "application/json")
            .header("X-OctoAI-Async", "1")
            .json(request)
            .timeout(self.request_timeout)
            .send()
            .await
            .map_err(|e| GatewayError::Unexpected(format!("Submit request failed: {e}")))?;

        let submitted: SubmitResponse = read_json(resp, "Submit").await?;
        let poll_url = submitted.poll_url.ok_or_else(|| {
            GatewayError::Unexpected("Submit response is missing poll_url".to_string())
        })?;
        Ok(JobHandle::new(poll_url, submitted.id.or(submitted.response_id)))
    }

    async fn poll(&self, handle: &mut JobHandle) -> GatewayResult<JobStatus> {
        if handle.status().is_terminal() {
            return Ok(handle.status());
        }

        let status: StatusResponse = self.get_json(handle.poll_url(), "Poll").await?;
        let observed = match status.status.to_ascii_lowercase().as_str() {
            "pending" => JobStatus::Pending,
            "completed" => JobStatus::Completed,
            _ => {
                tracing::warn!("Job {} reported status '{}'", handle.poll_url(), status.status);
                return Ok(handle.record_failed(status.status));
            }
        };
        Ok(handle.record(observed, status.response_url))
    }

    async fn fetch(&self, handle: &JobHandle) -> GatewayResult<GenerationResult> {
        if handle.status() != JobStatus::Completed {
            return Err(GatewayError::NotReady);
        }
        let url = handle.response_url().ok_or_else(|| {
            GatewayError::Unexpected("Completed job has no response_url".to_string())
        })?;
        let results: ResultResponse = self.get_json(url, "Fetch").await?;
        assemble_result(results)
    }
}

/// Read a JSON body, mapping HTTP failures onto gateway error kinds.
async fn read_json<T: DeserializeOwned>(resp: reqwest::Response, what: &str) -> GatewayResult<T> {
    let status = resp.status();
    if !status.is_success() {
        let text = resp.text().await.unwrap_or_default();
        return Err(classify(status, format!("{what} failed: {text}")));
    }
    resp.json()
        .await
        .map_err(|e| GatewayError::Unexpected(format!("Failed to parse {what} response: {e}")))
}

fn classify(status: StatusCode, message: String) -> GatewayError {
    if status.is_client_error() {
        GatewayError::ClientRequest {
            status: status.as_u16(),
            message,
        }
    } else if status.is_server_error() {
        GatewayError::Server {
            status: status.as_u16(),
            message,
        }
    } else {
        GatewayError::Unexpected(format!("HTTP {status}: {message}"))
    }
}

fn assemble_result(results: ResultResponse) -> GatewayResult<GenerationResult> {
    let encoded = match (results.images, results.image) {
        (Some(images), _) if !images.is_empty() => images,
        (_, Some(image)) => vec![image],
        _ => {
            return Err(GatewayError::Unexpected(
                "Result response contained no images".to_string(),
            ))
        }
    };

    let images = encoded
        .into_iter()
        .enumerate()
        .map(|(i, image)| GeneratedImage {
            image,
            caption: results.clip.as_ref().and_then(|c| c.at(i)),
            story: results.story.as_ref().and_then(|s| s.at(i)),
        })
        .collect();

    Ok(GenerationResult { images })
}
