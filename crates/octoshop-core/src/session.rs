//! The `Octoshop` session: normalize → encode → submit/poll → decode.

use image::DynamicImage;
use std::sync::Arc;
use std::time::Duration;

use crate::config::{Config, GenerationConfig};
use crate::error::{GatewayError, ImageError, OctoshopError, Result};
use crate::gateway::{gateway_from_config, InferenceGateway};
use crate::pipeline::{codec, ImageNormalizer, NormalizedImage};
use crate::poller::{BatchOutcome, CancelToken, JobPoller, PollOptions, Progress};
use crate::types::{GenerationRequest, GenerationResult};

/// A decoded output image with its optional text.
#[derive(Debug, Clone)]
pub struct OutputImage {
    pub image: DynamicImage,
    pub caption: Option<String>,
    pub story: Option<String>,
}

/// Decoded results of one job.
#[derive(Debug)]
pub struct TransformedJob {
    pub index: usize,
    pub request_id: Option<String>,
    pub outcome: Result<Vec<OutputImage>>,
}

/// Everything a transform produced, in submission order.
#[derive(Debug)]
pub struct TransformOutcome {
    pub jobs: Vec<TransformedJob>,
    pub ticks: u32,
    pub elapsed: Duration,
}

impl TransformOutcome {
    pub fn succeeded(&self) -> usize {
        self.jobs.iter().filter(|j| j.outcome.is_ok()).count()
    }

    pub fn failed(&self) -> usize {
        self.jobs.len() - self.succeeded()
    }

    /// Output images of every successful job, in order.
    pub fn images(&self) -> impl Iterator<Item = &OutputImage> {
        self.jobs
            .iter()
            .filter_map(|j| j.outcome.as_ref().ok())
            .flatten()
    }
}

/// One user session against a generation backend.
///
/// Owns its configuration and gateway; nothing is global.
pub struct Octoshop {
    config: Config,
    gateway: Arc<dyn InferenceGateway>,
    normalizer: ImageNormalizer,
}

impl Octoshop {
    pub fn new(config: Config, gateway: Arc<dyn InferenceGateway>) -> Self {
        tracing::debug!(
            "Initializing OctoShop v{} with {} gateway",
            crate::VERSION,
            gateway.name()
        );
        let normalizer = ImageNormalizer::new(config.image.clone());
        Self {
            config,
            gateway,
            normalizer,
        }
    }

    /// Build a session with the HTTP gateway described by `config`.
    ///
    /// Fails with a configuration error when the endpoint or token is missing.
    pub fn from_config(config: Config) -> Result<Self> {
        let gateway = gateway_from_config(&config)?;
        Ok(Self::new(config, gateway))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Decode and correct an uploaded photo.
    pub async fn normalize(&self, bytes: Vec<u8>) -> Result<NormalizedImage> {
        Ok(self.normalizer.normalize(bytes).await?)
    }

    /// One request per configured job, all carrying the same encoded image.
    pub fn requests(
        &self,
        image: &DynamicImage,
        generation: &GenerationConfig,
    ) -> Result<Vec<GenerationRequest>> {
        if generation.jobs == 0 {
            return Err(GatewayError::InvalidRequest("jobs must be > 0".to_string()).into());
        }
        let encoded = codec::encode(image)?;
        let mut requests = Vec::with_capacity(generation.jobs);
        for _ in 0..generation.jobs {
            let request = GenerationRequest::builder(generation.prompt.clone(), encoded.clone())
                .with_defaults(generation)
                .build()?;
            requests.push(request);
        }
        Ok(requests)
    }

    /// Run generation for a normalized image and decode every result.
    ///
    /// A rejected submission fails the whole call. Failures after that are
    /// reported per job in the outcome.
    pub async fn transform<F>(
        &self,
        image: &DynamicImage,
        generation: &GenerationConfig,
        cancel: &CancelToken,
        on_progress: F,
    ) -> Result<TransformOutcome>
    where
        F: FnMut(Progress),
    {
        let requests = self.requests(image, generation)?;
        tracing::info!(
            "Transforming {}x{} image with {} job(s), prompt: {:?}",
            image.width(),
            image.height(),
            requests.len(),
            generation.prompt
        );

        let poller = JobPoller::new(self.gateway.clone(), PollOptions::from(&self.config.poller));
        let batch = poller.run(&requests, cancel, on_progress).await?;

        tokio::task::spawn_blocking(move || decode_batch(batch))
            .await
            .map_err(|e| OctoshopError::Image(ImageError::Decode(format!("Task join error: {e}"))))
    }
}

fn decode_batch(batch: BatchOutcome) -> TransformOutcome {
    let jobs = batch
        .jobs
        .into_iter()
        .map(|report| {
            let outcome = report
                .outcome
                .map_err(OctoshopError::from)
                .and_then(decode_result);
            if let Err(e) = &outcome {
                tracing::debug!("Job {} produced no images: {e}", report.index);
            }
            TransformedJob {
                index: report.index,
                request_id: report.request_id,
                outcome,
            }
        })
        .collect();

    TransformOutcome {
        jobs,
        ticks: batch.ticks,
        elapsed: batch.elapsed,
    }
}

fn decode_result(result: GenerationResult) -> Result<Vec<OutputImage>> {
    result
        .images
        .into_iter()
        .map(|generated| {
            Ok(OutputImage {
                image: codec::decode(&generated.image)?,
                caption: generated.caption,
                story: generated.story,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::poller::tests::ScriptedGateway;
    use crate::types::JobStatus::{Completed, Pending};
    use image::{GenericImageView, Rgb, RgbImage};
    use std::sync::atomic::Ordering;

    fn photo(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
            Rgb([(x % 256) as u8, (y % 256) as u8, 128])
        }))
    }

    fn fast_config() -> Config {
        let mut config = Config::default();
        config.poller.interval_ms = 5;
        config.poller.timeout_ms = 5_000;
        config
    }

    #[tokio::test]
    async fn test_80s_tokyo_scenario() {
        let output = codec::encode(&photo(1024, 768)).unwrap();
        let gateway = ScriptedGateway::new(vec![vec![Pending, Pending, Completed]])
            .with_images(vec![vec![output]]);
        let polls = gateway.poll_calls_handle();
        let session = Octoshop::new(fast_config(), Arc::new(gateway));

        let mut generation = GenerationConfig::default();
        generation.prompt = "Set the scene in 80s Tokyo".to_string();
        generation.strength = 0.8;
        generation.steps = 20;
        generation.batch = 1;

        let mut last = None;
        let outcome = session
            .transform(&photo(1024, 768), &generation, &CancelToken::new(), |p| {
                last = Some(p.percent)
            })
            .await
            .unwrap();

        assert_eq!(outcome.ticks, 2);
        assert_eq!(polls.load(Ordering::SeqCst), 3);
        assert_eq!(last, Some(100));
        let images: Vec<_> = outcome.images().collect();
        assert_eq!(images.len(), 1);
        assert_eq!(images[0].image.dimensions(), (1024, 768));
    }

    #[tokio::test]
    async fn test_undecodable_result_fails_only_that_job() {
        let good = codec::encode(&photo(8, 8)).unwrap();
        let gateway = ScriptedGateway::new(vec![vec![Completed], vec![Completed]])
            .with_images(vec![vec![good], vec!["not base64!".to_string()]]);
        let session = Octoshop::new(fast_config(), Arc::new(gateway));

        let mut generation = GenerationConfig::default();
        generation.jobs = 2;
        let outcome = session
            .transform(&photo(16, 16), &generation, &CancelToken::new(), |_| {})
            .await
            .unwrap();

        assert_eq!(outcome.succeeded(), 1);
        assert!(matches!(
            outcome.jobs[1].outcome,
            Err(OctoshopError::Image(ImageError::Base64(_)))
        ));
    }

    #[test]
    fn test_requests_follow_job_count() {
        let gateway = ScriptedGateway::new(vec![]);
        let session = Octoshop::new(Config::default(), Arc::new(gateway));
        let mut generation = GenerationConfig::default();
        generation.jobs = 3;
        generation.prompt = "Paint it like OctoAI would".to_string();

        let requests = session.requests(&photo(4, 4), &generation).unwrap();
        assert_eq!(requests.len(), 3);
        assert!(requests.iter().all(|r| r.octoai()));
        assert_eq!(requests[0].image(), requests[2].image());
        assert_eq!(requests[0].prompt(), "Paint it like OctoAI would");
    }

    #[test]
    fn test_invalid_generation_settings_are_client_errors() {
        let gateway = ScriptedGateway::new(vec![]);
        let session = Octoshop::new(Config::default(), Arc::new(gateway));
        let mut generation = GenerationConfig::default();
        generation.strength = 1.5;

        let err = session.requests(&photo(4, 4), &generation).unwrap_err();
        assert!(matches!(
            err,
            OctoshopError::Gateway(GatewayError::InvalidRequest(_))
        ));
        assert_eq!(err.kind(), ErrorKind::ClientRequest);
    }

    #[test]
    fn test_zero_jobs_is_rejected() {
        let gateway = ScriptedGateway::new(vec![]);
        let session = Octoshop::new(Config::default(), Arc::new(gateway));
        let mut generation = GenerationConfig::default();
        generation.jobs = 0;

        let err = session.requests(&photo(4, 4), &generation).unwrap_err();
        assert!(matches!(
            err,
            OctoshopError::Gateway(GatewayError::InvalidRequest(ref message)) if message.contains("jobs")
        ));
        assert_eq!(err.kind(), ErrorKind::ClientRequest);
    }

    #[test]
    fn test_from_config_requires_credentials() {
        let mut config = Config::default();
        config.gateway.endpoint = "${OCTOSHOP_SESSION_TEST_UNSET_ENDPOINT}".to_string();
        config.gateway.token = "literal-token".to_string();

        let err = Octoshop::from_config(config).err().unwrap();
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn test_from_config_with_literal_values() {
        let mut config = Config::default();
        config.gateway.endpoint = "http://localhost:9/".to_string();
        config.gateway.token = "literal-token".to_string();

        let session = Octoshop::from_config(config).unwrap();
        assert_eq!(session.config().gateway.token, "literal-token");
    }

    #[tokio::test]
    async fn test_normalize_rescales_upload() {
        let session = Octoshop::new(Config::default(), Arc::new(ScriptedGateway::new(vec![])));
        let bytes = codec::encode_png(&photo(200, 100)).unwrap();

        let normalized = session.normalize(bytes).await.unwrap();
        assert_eq!(normalized.image.dimensions(), (1024, 512));
        assert_eq!(normalized.original_width, 200);
    }
}
