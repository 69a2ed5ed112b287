//! The `octoshop run` command.

mod output;
mod setup;

use clap::Args;
use octoshop_core::{CancelToken, Config, ErrorKind, Octoshop, OctoshopError, Watermark};
use std::path::PathBuf;

use output::{write_outputs, RunSummary};
use setup::{apply_overrides, expand_path};

/// Arguments for the `run` command.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Photo to transform (PNG or JPEG)
    #[arg(required = true)]
    pub photo: PathBuf,

    /// Text prompt describing the transformation
    #[arg(short, long)]
    pub prompt: Option<String>,

    /// How far the result may depart from the photo (0.0 - 1.0)
    #[arg(long)]
    pub strength: Option<f32>,

    /// Denoising steps
    #[arg(long)]
    pub steps: Option<u32>,

    /// Sampler name, e.g. "DPM++ 2M SDE Karras"
    #[arg(long)]
    pub sampler: Option<octoshop_core::Sampler>,

    /// Style preset, e.g. "neon-punk"
    #[arg(long)]
    pub style: Option<octoshop_core::Style>,

    /// Images generated per job
    #[arg(long)]
    pub batch: Option<u32>,

    /// Independent jobs to submit
    #[arg(short, long)]
    pub jobs: Option<usize>,

    /// Do not transfer the subject's face onto the output
    #[arg(long)]
    pub no_faceswap: bool,

    /// Keep the photo at its original size
    #[arg(long)]
    pub no_rescale: bool,

    /// Directory for the normalized input and the generated images
    #[arg(short, long, default_value = ".")]
    pub output_dir: PathBuf,

    /// Logo to overlay on every generated image
    #[arg(long)]
    pub watermark: Option<PathBuf>,

    /// Give up on outstanding jobs after this many seconds
    #[arg(long)]
    pub timeout_secs: Option<u64>,
}

/// Values match the clap defaults above.
impl Default for RunArgs {
    fn default() -> Self {
        Self {
            photo: PathBuf::new(),
            prompt: None,
            strength: None,
            steps: None,
            sampler: None,
            style: None,
            batch: None,
            jobs: None,
            no_faceswap: false,
            no_rescale: false,
            output_dir: PathBuf::from("."),
            watermark: None,
            timeout_secs: None,
        }
    }
}

/// Execute the run command.
///
/// Failures are logged in full and surfaced as the short user-facing message.
pub async fn execute(args: RunArgs, config: Config) -> anyhow::Result<()> {
    match run(&args, config).await {
        Ok(()) => Ok(()),
        Err(e) => {
            tracing::error!("Run failed: {e:#}");
            anyhow::bail!("{}", failure_message(&e))
        }
    }
}

async fn run(args: &RunArgs, config: Config) -> anyhow::Result<()> {
    if !args.photo.is_file() {
        anyhow::bail!(
            "Photo not found: {:?}\n\n  Hint: Check the file path and try again.",
            args.photo
        );
    }

    let config = apply_overrides(config, args)?;
    let session = Octoshop::from_config(config)?;
    let config = session.config();

    let watermark = match config.watermark_path() {
        Some(path) => {
            let logo = Watermark::load(&path, config.watermark.size).map_err(OctoshopError::from)?;
            Some(logo)
        }
        None => None,
    };

    let bytes = tokio::fs::read(&args.photo)
        .await
        .map_err(OctoshopError::from)?;
    let normalized = session.normalize(bytes).await?;
    tracing::info!(
        "Normalized {:?}: {}x{} -> {}x{}",
        args.photo,
        normalized.original_width,
        normalized.original_height,
        normalized.image.width(),
        normalized.image.height()
    );

    let output_dir = expand_path(&args.output_dir);
    std::fs::create_dir_all(&output_dir).map_err(OctoshopError::from)?;
    let input_path = output_dir.join("input.png");
    output::save_png(&normalized.image, &input_path)?;

    let cancel = CancelToken::new();
    let ctrl_c = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("Interrupted, cancelling outstanding jobs");
                cancel.cancel();
            }
        })
    };

    let progress = create_progress_bar()?;
    let result = session
        .transform(&normalized.image, &config.generation, &cancel, |p| {
            progress.set_position(u64::from(p.percent));
            progress.set_message(p.message);
        })
        .await;
    ctrl_c.abort();
    progress.finish_and_clear();
    let outcome = result?;

    let mut summary = RunSummary::new(&input_path, &config.generation.prompt, &outcome);
    let first_failure = outcome
        .jobs
        .iter()
        .find_map(|job| job.outcome.as_ref().err().map(|e| e.kind()));
    let all_failed = outcome.succeeded() == 0;

    write_outputs(outcome, &output_dir, watermark.as_ref(), &mut summary)?;
    println!("{}", serde_json::to_string_pretty(&summary)?);

    match first_failure {
        Some(kind) if all_failed => {
            anyhow::bail!(octoshop_core::user_message(kind))
        }
        Some(_) => {
            tracing::warn!("{} of {} job(s) failed", summary.failed(), summary.jobs.len());
            Ok(())
        }
        None => Ok(()),
    }
}

/// User-facing text for a failed run.
///
/// Typed library errors collapse to their kind's message; anything else is
/// already phrased for the user and passes through.
fn failure_message(err: &anyhow::Error) -> String {
    let kind = if let Some(e) = err.downcast_ref::<OctoshopError>() {
        Some(e.kind())
    } else if err.downcast_ref::<octoshop_core::ConfigError>().is_some() {
        Some(ErrorKind::Configuration)
    } else {
        err.downcast_ref::<octoshop_core::GatewayError>()
            .map(|e| e.kind())
    };
    match kind {
        Some(kind) => octoshop_core::user_message(kind).to_string(),
        None => format!("{err:#}"),
    }
}

/// Progress bar driven by the poller's estimate.
fn create_progress_bar() -> anyhow::Result<indicatif::ProgressBar> {
    use indicatif::{ProgressBar, ProgressStyle};

    let pb = ProgressBar::new(100);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}% {msg}")?
            .progress_chars("##-"),
    );
    pb.set_message(octoshop_core::poller::WORKING_TEXT);
    Ok(pb)
}

#[cfg(test)]
mod tests {
    use super::*;
    use octoshop_core::{ConfigError, GatewayError};

    #[test]
    fn run_args_default_output_dir() {
        let args = RunArgs::default();
        assert_eq!(args.output_dir, PathBuf::from("."));
    }

    #[test]
    fn run_args_default_overrides_are_unset() {
        let args = RunArgs::default();
        assert!(args.prompt.is_none());
        assert!(args.strength.is_none());
        assert!(args.jobs.is_none());
        assert!(args.timeout_secs.is_none());
        assert!(!args.no_faceswap);
        assert!(!args.no_rescale);
    }

    #[test]
    fn configuration_failures_get_setup_message() {
        let err = anyhow::Error::from(OctoshopError::from(ConfigError::MissingEnv {
            setting: "gateway.token".into(),
            var: "OCTOAI_TOKEN".into(),
        }));
        assert_eq!(
            failure_message(&err),
            octoshop_core::user_message(ErrorKind::Configuration)
        );
    }

    #[test]
    fn gateway_failures_share_one_message() {
        let rejected = anyhow::Error::from(OctoshopError::from(GatewayError::ClientRequest {
            status: 400,
            message: "bad".into(),
        }));
        let server = anyhow::Error::from(OctoshopError::from(GatewayError::Server {
            status: 502,
            message: "down".into(),
        }));
        assert_eq!(failure_message(&rejected), failure_message(&server));
        assert_eq!(
            failure_message(&server),
            octoshop_core::user_message(ErrorKind::Unexpected)
        );
    }

    #[test]
    fn plain_errors_pass_through() {
        let err = anyhow::anyhow!("Photo not found: \"x.jpg\"");
        assert!(failure_message(&err).starts_with("Photo not found"));
    }

    #[test]
    fn progress_bar_template_is_valid() {
        assert!(create_progress_bar().is_ok());
    }

    #[tokio::test]
    async fn missing_photo_is_reported() {
        let args = RunArgs {
            photo: PathBuf::from("/definitely/not/here.jpg"),
            ..RunArgs::default()
        };
        let err = run(&args, Config::default()).await.unwrap_err();
        assert!(err.to_string().contains("Photo not found"));
    }
}
