//! Inference gateway trait.
//!
//! Defines the interface the job poller drives. The HTTP implementation lives
//! in `http.rs`; tests plug in scripted gateways.

use async_trait::async_trait;
use std::sync::Arc;

use crate::config::Config;
use crate::error::{ConfigError, GatewayResult};
use crate::types::{GenerationRequest, GenerationResult, JobHandle, JobStatus};

/// Trait that all inference backends implement.
///
/// Uses `async_trait` because native async fn in trait is not object-safe
/// (the poller holds an `Arc<dyn InferenceGateway>`).
#[async_trait]
pub trait InferenceGateway: Send + Sync {
    /// Gateway name for logging.
    fn name(&self) -> &str;

    /// Create a job. A rejected request yields no handle.
    async fn submit(&self, request: &GenerationRequest) -> GatewayResult<JobHandle>;

    /// Check a job's status once, without waiting.
    ///
    /// Implementations record the observation on the handle; a handle that is
    /// already terminal reports its recorded status.
    async fn poll(&self, handle: &mut JobHandle) -> GatewayResult<JobStatus>;

    /// Retrieve the results of a completed job.
    ///
    /// Fails with `GatewayError::NotReady` if the handle has not been
    /// observed completed.
    async fn fetch(&self, handle: &JobHandle) -> GatewayResult<GenerationResult>;
}

/// Build the HTTP gateway from configuration.
///
/// Fails when the endpoint or token cannot be resolved.
pub fn gateway_from_config(config: &Config) -> Result<Arc<dyn InferenceGateway>, ConfigError> {
    let credentials = config.gateway_credentials()?;
    tracing::debug!("Using inference endpoint {}", credentials.endpoint);
    Ok(Arc::new(super::http::HttpGateway::new(&credentials)))
}
