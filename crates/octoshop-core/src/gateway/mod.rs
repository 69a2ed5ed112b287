//! Client side of the remote generation service.
//!
//! `InferenceGateway` is the seam between the job poller and the backend;
//! `HttpGateway` implements it over the async HTTP protocol.

pub(crate) mod http;
pub(crate) mod provider;

pub use http::HttpGateway;
pub use provider::{gateway_from_config, InferenceGateway};
