//! Command-line overrides on top of the loaded config.

use octoshop_core::{Config, ConfigError};
use std::path::{Path, PathBuf};

use super::RunArgs;

/// Apply flags from `args` and re-validate.
pub fn apply_overrides(mut config: Config, args: &RunArgs) -> Result<Config, ConfigError> {
    let generation = &mut config.generation;
    if let Some(prompt) = &args.prompt {
        generation.prompt = prompt.clone();
    }
    if let Some(strength) = args.strength {
        generation.strength = strength;
    }
    if let Some(steps) = args.steps {
        generation.steps = steps;
    }
    if let Some(sampler) = args.sampler {
        generation.sampler = sampler;
    }
    if args.style.is_some() {
        generation.style = args.style;
    }
    if let Some(batch) = args.batch {
        generation.batch = batch;
    }
    if let Some(jobs) = args.jobs {
        generation.jobs = jobs;
    }
    if args.no_faceswap {
        generation.faceswap = false;
    }

    if args.no_rescale {
        config.image.rescale = false;
    }
    if let Some(path) = &args.watermark {
        config.watermark.path = Some(expand_path(path));
    }
    if let Some(secs) = args.timeout_secs {
        config.poller.timeout_ms = secs.saturating_mul(1000);
    }

    config.validate()?;
    Ok(config)
}

/// Expand a leading `~` in a user-supplied path.
pub fn expand_path(path: &Path) -> PathBuf {
    let raw = path.to_string_lossy();
    PathBuf::from(shellexpand::tilde(&raw).into_owned())
}
