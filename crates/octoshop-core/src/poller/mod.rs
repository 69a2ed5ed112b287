//! Async job poller.
//!
//! Submits a batch of generation requests, then checks every outstanding job
//! on a fixed cadence until each one is terminal. Each job moves
//! `Submitted → Pending → {Completed | Failed}`; completed jobs are fetched as
//! soon as they are seen. Failures are kept per job, so one bad job does not
//! hide the others.

mod cancel;
mod progress;

pub use cancel::CancelToken;
pub use progress::{Progress, ProgressEstimate, READY_TEXT, SLOW_TEXT, WORKING_TEXT};

use futures_util::future::join_all;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

use crate::config::PollerConfig;
use crate::error::{GatewayError, GatewayResult};
use crate::gateway::InferenceGateway;
use crate::types::{GenerationRequest, GenerationResult, JobHandle, JobStatus};

/// Poll loop settings.
#[derive(Debug, Clone)]
pub struct PollOptions {
    /// Delay between status checks
    pub interval: Duration,
    /// Give up on outstanding jobs after this long (`None` waits forever)
    pub timeout: Option<Duration>,
    /// Highest percentage reported before the batch is terminal
    pub progress_cap: u8,
}

impl Default for PollOptions {
    fn default() -> Self {
        Self::from(&PollerConfig::default())
    }
}

impl From<&PollerConfig> for PollOptions {
    fn from(config: &PollerConfig) -> Self {
        Self {
            interval: Duration::from_millis(config.interval_ms),
            timeout: Some(Duration::from_millis(config.timeout_ms)),
            progress_cap: config.progress_cap,
        }
    }
}

/// Final state of one job.
#[derive(Debug)]
pub struct JobReport {
    /// Position in the submitted batch
    pub index: usize,
    /// Backend request id, if the backend returned one
    pub request_id: Option<String>,
    pub outcome: GatewayResult<GenerationResult>,
}

/// Per-job results of a batch, in submission order.
#[derive(Debug)]
pub struct BatchOutcome {
    pub jobs: Vec<JobReport>,
    /// Poll ticks spent waiting on pending jobs
    pub ticks: u32,
    pub elapsed: Duration,
}

impl BatchOutcome {
    pub fn succeeded(&self) -> usize {
        self.jobs.iter().filter(|j| j.outcome.is_ok()).count()
    }

    pub fn failed(&self) -> usize {
        self.jobs.len() - self.succeeded()
    }

    /// All-or-nothing view: every result, or the first error.
    pub fn into_results(self) -> GatewayResult<Vec<GenerationResult>> {
        self.jobs.into_iter().map(|j| j.outcome).collect()
    }
}

struct TrackedJob {
    handle: JobHandle,
    outcome: Option<GatewayResult<GenerationResult>>,
}

/// Drives submitted jobs to a terminal state.
pub struct JobPoller {
    gateway: Arc<dyn InferenceGateway>,
    options: PollOptions,
}

impl JobPoller {
    pub fn new(gateway: Arc<dyn InferenceGateway>, options: PollOptions) -> Self {
        Self { gateway, options }
    }

    pub fn options(&self) -> &PollOptions {
        &self.options
    }

    /// Submit `requests` and wait until every job is terminal.
    ///
    /// Submissions go out back to back. If one is rejected the run stops with
    /// that error and the jobs already submitted are abandoned. After that,
    /// failures are reported per job.
    ///
    /// The timeout and `cancel` bound the whole run, gateway calls included.
    /// If either fires during submission the run fails with `Timeout` or
    /// `Cancelled`; later, every job still outstanding gets that error.
    /// `on_progress` is called once before the first wait, once per tick and
    /// once with 100% at the end.
    pub async fn run<F>(
        &self,
        requests: &[GenerationRequest],
        cancel: &CancelToken,
        mut on_progress: F,
    ) -> GatewayResult<BatchOutcome>
    where
        F: FnMut(Progress),
    {
        let start = Instant::now();
        let deadline = self.options.timeout.map(|timeout| start + timeout);

        let mut jobs = match guarded(self.submit_all(requests), deadline, cancel).await {
            Ok(submitted) => submitted?,
            Err(interrupt) => {
                tracing::warn!("Submission interrupted: {interrupt:?}");
                return Err(self.interrupt_error(interrupt));
            }
        };
        let total = jobs.len();
        tracing::info!(
            "Submitted {total} job(s) to {} gateway",
            self.gateway.name()
        );

        let mut estimate = ProgressEstimate::new(self.options.progress_cap);
        let mut ticks = 0u32;
        on_progress(estimate.snapshot(0, total));

        loop {
            let checked = guarded(self.check_outstanding(&mut jobs), deadline, cancel).await;
            if let Err(interrupt) = checked {
                self.fail_outstanding(&mut jobs, interrupt, start);
                break;
            }
            let finished = finished_count(&jobs);
            if finished == total {
                break;
            }

            let wait = tokio::time::sleep(self.options.interval);
            if let Err(interrupt) = guarded(wait, deadline, cancel).await {
                self.fail_outstanding(&mut jobs, interrupt, start);
                break;
            }

            ticks += 1;
            estimate.tick();
            tracing::debug!("Poll tick {ticks}: {finished}/{total} job(s) finished");
            on_progress(estimate.snapshot(finished, total));
        }

        estimate.finish();
        on_progress(estimate.snapshot(total, total));

        let outcome = BatchOutcome {
            jobs: jobs
                .into_iter()
                .enumerate()
                .map(|(index, job)| JobReport {
                    index,
                    request_id: job.handle.request_id().map(String::from),
                    outcome: job.outcome.unwrap_or(Err(GatewayError::Cancelled)),
                })
                .collect(),
            ticks,
            elapsed: start.elapsed(),
        };

        if outcome.failed() > 0 {
            tracing::warn!(
                "Batch finished: {} succeeded, {} failed",
                outcome.succeeded(),
                outcome.failed()
            );
        } else {
            tracing::info!("Batch finished: {} succeeded", outcome.succeeded());
        }
        Ok(outcome)
    }

    fn interrupt_error(&self, interrupt: Interrupt) -> GatewayError {
        match interrupt {
            Interrupt::Timeout => GatewayError::Timeout {
                timeout_ms: self
                    .options
                    .timeout
                    .map_or(0, |timeout| timeout.as_millis() as u64),
            },
            Interrupt::Cancelled => GatewayError::Cancelled,
        }
    }

    fn fail_outstanding(&self, jobs: &mut [TrackedJob], interrupt: Interrupt, start: Instant) {
        let outstanding = jobs.len() - finished_count(jobs);
        match interrupt {
            Interrupt::Timeout => tracing::warn!(
                "Giving up on {outstanding} job(s) after {:?}",
                start.elapsed()
            ),
            Interrupt::Cancelled => {
                tracing::info!("Poll loop cancelled with {outstanding} job(s) outstanding")
            }
        }
        for job in jobs.iter_mut().filter(|j| j.outcome.is_none()) {
            job.outcome = Some(Err(self.interrupt_error(interrupt)));
        }
    }

    async fn submit_all(&self, requests: &[GenerationRequest]) -> GatewayResult<Vec<TrackedJob>> {
        let mut jobs = Vec::with_capacity(requests.len());
        for (index, request) in requests.iter().enumerate() {
            match self.gateway.submit(request).await {
                Ok(handle) => {
                    tracing::debug!("Job {index} submitted, polling {}", handle.poll_url());
                    jobs.push(TrackedJob {
                        handle,
                        outcome: None,
                    });
                }
                Err(e) => {
                    if !jobs.is_empty() {
                        tracing::warn!(
                            "Submission {index} rejected, abandoning {} submitted job(s)",
                            jobs.len()
                        );
                    }
                    return Err(e);
                }
            }
        }
        Ok(jobs)
    }

    /// Poll every job still pending, fetching those that completed.
    async fn check_outstanding(&self, jobs: &mut [TrackedJob]) {
        let gateway = &self.gateway;
        let checks = jobs
            .iter_mut()
            .enumerate()
            .filter(|(_, job)| job.outcome.is_none())
            .map(|(index, job)| async move {
                match gateway.poll(&mut job.handle).await {
                    Ok(JobStatus::Pending) => {}
                    Ok(JobStatus::Completed) => {
                        let fetched = gateway.fetch(&job.handle).await;
                        if let Err(e) = &fetched {
                            tracing::error!("Fetching results for job {index} failed: {e}");
                        }
                        job.outcome = Some(fetched);
                    }
                    Ok(JobStatus::Failed) => {
                        let status = job.handle.reported_status().unwrap_or("failed").to_string();
                        tracing::error!("Job {index} failed on the backend with status '{status}'");
                        job.outcome = Some(Err(GatewayError::JobFailed { status }));
                    }
                    Err(e) => {
                        tracing::error!("Polling job {index} failed: {e}");
                        job.outcome = Some(Err(e));
                    }
                }
            });
        join_all(checks).await;
    }
}

fn finished_count(jobs: &[TrackedJob]) -> usize {
    jobs.iter().filter(|j| j.outcome.is_some()).count()
}

/// Why a run stopped before its jobs finished.
#[derive(Debug, Clone, Copy)]
enum Interrupt {
    Timeout,
    Cancelled,
}

/// Run `work` unless the deadline passes or `cancel` fires first.
///
/// `work` is dropped when interrupted, abandoning any request in flight.
async fn guarded<T>(
    work: impl Future<Output = T>,
    deadline: Option<Instant>,
    cancel: &CancelToken,
) -> Result<T, Interrupt> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(Interrupt::Cancelled),
        _ = until(deadline) => Err(Interrupt::Timeout),
        out = work => Ok(out),
    }
}

async fn until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
