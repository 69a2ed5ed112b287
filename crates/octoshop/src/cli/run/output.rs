//! Writing generated images and the JSON run summary.

use octoshop_core::pipeline::codec;
use octoshop_core::{DynamicImage, OctoshopError, TransformOutcome, Watermark};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Printed to stdout after a run.
#[derive(Debug, Serialize)]
pub struct RunSummary {
    pub input: PathBuf,
    pub prompt: String,
    pub ticks: u32,
    pub elapsed_ms: u64,
    pub jobs: Vec<JobSummary>,
}

#[derive(Debug, Serialize)]
pub struct JobSummary {
    pub index: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    pub images: Vec<ImageSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ImageSummary {
    pub file: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub story: Option<String>,
}

impl RunSummary {
    /// Summary skeleton with one entry per job; failed jobs carry their error.
    pub fn new(input: &Path, prompt: &str, outcome: &TransformOutcome) -> Self {
        Self {
            input: input.to_path_buf(),
            prompt: prompt.to_string(),
            ticks: outcome.ticks,
            elapsed_ms: outcome.elapsed.as_millis() as u64,
            jobs: outcome
                .jobs
                .iter()
                .map(|job| JobSummary {
                    index: job.index,
                    request_id: job.request_id.clone(),
                    images: Vec::new(),
                    error: job.outcome.as_ref().err().map(|e| e.to_string()),
                })
                .collect(),
        }
    }

    pub fn failed(&self) -> usize {
        self.jobs.iter().filter(|j| j.error.is_some()).count()
    }
}

/// File name for image `image` of job `job`.
pub fn output_name(job: usize, image: usize) -> String {
    format!("octoshop_{job}_{image}.png")
}

/// Save every generated image, watermarked when a logo is given, and record
/// the files in `summary`.
pub fn write_outputs(
    outcome: TransformOutcome,
    dir: &Path,
    watermark: Option<&Watermark>,
    summary: &mut RunSummary,
) -> Result<(), OctoshopError> {
    for (job, entry) in outcome.jobs.into_iter().zip(summary.jobs.iter_mut()) {
        let Ok(images) = job.outcome else {
            continue;
        };
        for (idx, output) in images.into_iter().enumerate() {
            let path = dir.join(output_name(job.index, idx));
            let image = match watermark {
                Some(logo) => logo.apply(&output.image),
                None => output.image,
            };
            save_png(&image, &path)?;
            tracing::info!("Wrote {:?}", path);
            entry.images.push(ImageSummary {
                file: path,
                caption: output.caption,
                story: output.story,
            });
        }
    }
    Ok(())
}

pub fn save_png(image: &DynamicImage, path: &Path) -> Result<(), OctoshopError> {
    let bytes = codec::encode_png(image)?;
    std::fs::write(path, bytes)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use octoshop_core::{GatewayError, OutputImage, TransformedJob};
    use std::time::Duration;

    fn solid(width: u32, height: u32) -> DynamicImage {
        DynamicImage::new_rgb8(width, height)
    }

    fn outcome() -> TransformOutcome {
        TransformOutcome {
            jobs: vec![
                TransformedJob {
                    index: 0,
                    request_id: Some("req-0".to_string()),
                    outcome: Ok(vec![
                        OutputImage {
                            image: solid(8, 8),
                            caption: Some("neon street".to_string()),
                            story: None,
                        },
                        OutputImage {
                            image: solid(8, 8),
                            caption: None,
                            story: None,
                        },
                    ]),
                },
                TransformedJob {
                    index: 1,
                    request_id: None,
                    outcome: Err(OctoshopError::Gateway(GatewayError::Timeout {
                        timeout_ms: 1000,
                    })),
                },
            ],
            ticks: 4,
            elapsed: Duration::from_millis(420),
        }
    }

    #[test]
    fn output_names_are_indexed() {
        assert_eq!(output_name(0, 0), "octoshop_0_0.png");
        assert_eq!(output_name(2, 1), "octoshop_2_1.png");
    }

    #[test]
    fn writes_successful_jobs_and_records_failures() {
        let dir = tempfile::tempdir().unwrap();
        let outcome = outcome();
        let mut summary = RunSummary::new(&dir.path().join("input.png"), "prompt", &outcome);
        write_outputs(outcome, dir.path(), None, &mut summary).unwrap();

        assert!(dir.path().join("octoshop_0_0.png").exists());
        assert!(dir.path().join("octoshop_0_1.png").exists());
        assert_eq!(summary.jobs[0].images.len(), 2);
        assert_eq!(summary.jobs[0].images[0].caption.as_deref(), Some("neon street"));
        assert!(summary.jobs[1].images.is_empty());
        assert!(summary.jobs[1].error.is_some());
        assert_eq!(summary.failed(), 1);
        assert_eq!(summary.elapsed_ms, 420);
    }

    #[test]
    fn watermark_is_applied_to_outputs() {
        let dir = tempfile::tempdir().unwrap();
        let mut white = DynamicImage::new_rgb8(1, 1);
        white.invert();
        let logo = Watermark::from_image(&white, 2);

        let outcome = outcome();
        let mut summary = RunSummary::new(Path::new("input.png"), "prompt", &outcome);
        write_outputs(outcome, dir.path(), Some(&logo), &mut summary).unwrap();

        let written = image::open(dir.path().join("octoshop_0_0.png"))
            .unwrap()
            .to_rgba8();
        assert_eq!(written.get_pixel(0, 0).0, [255, 255, 255, 255]);
        assert_eq!(written.get_pixel(5, 5).0, [0, 0, 0, 255]);
    }

    #[test]
    fn summary_serializes_without_empty_fields() {
        let outcome = outcome();
        let summary = RunSummary::new(Path::new("input.png"), "prompt", &outcome);
        let json = serde_json::to_value(&summary).unwrap();
        assert!(json["jobs"][0].get("error").is_none());
        assert_eq!(json["jobs"][1]["error"], "Gateway error: Job timed out after 1000ms");
    }
}
