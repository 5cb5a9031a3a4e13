//! Panning video rendering.
//!
//! A render is a single unit of work: validate the request, probe the image,
//! compute the pan plan and run FFmpeg once. Nothing is retried; a failed
//! probe or encode would fail again with the same input.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use metrics::counter;
use tokio::sync::watch;
use tracing::Instrument;
use uuid::Uuid;

use panreel_models::{validate_duration, EncodingConfig, ImageFormat, PanningPlan, Resolution};

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};
use crate::filters::build_pan_filter;
use crate::fs_utils::remove_file_if_exists;
use crate::logging::RenderLogger;
use crate::probe::probe_image;
use crate::progress::FfmpegProgress;

/// Counter of finished renders, labelled by outcome.
pub const RENDERS_TOTAL: &str = "panreel_renders_total";

/// What to render and where to put it.
#[derive(Debug, Clone)]
pub struct RenderRequest {
    pub render_id: Uuid,
    pub source: PathBuf,
    pub output: PathBuf,
    pub duration_secs: f64,
}

impl RenderRequest {
    pub fn new(source: impl Into<PathBuf>, output: impl Into<PathBuf>, duration_secs: f64) -> Self {
        Self {
            render_id: Uuid::new_v4(),
            source: source.into(),
            output: output.into(),
            duration_secs,
        }
    }

    /// Reuse an id assigned by the caller, e.g. the scratch directory's.
    pub fn with_id(mut self, render_id: Uuid) -> Self {
        self.render_id = render_id;
        self
    }
}

/// Result of a successful render.
#[derive(Debug, Clone)]
pub struct RenderOutcome {
    pub render_id: Uuid,
    pub plan: PanningPlan,
    /// Frame size actually written to the file
    pub resolution: Resolution,
    pub output: PathBuf,
    pub elapsed: Duration,
}

/// Renders panning videos with a fixed encoding configuration.
#[derive(Debug, Clone, Default)]
pub struct PanRenderer {
    encoding: EncodingConfig,
    timeout: Option<Duration>,
    cancel_rx: Option<watch::Receiver<bool>>,
}

impl PanRenderer {
    pub fn new(encoding: EncodingConfig) -> Self {
        Self {
            encoding,
            ..Default::default()
        }
    }

    /// Kill FFmpeg if it runs longer than `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Stop FFmpeg once `cancel_rx` turns true.
    pub fn with_cancel(mut self, cancel_rx: watch::Receiver<bool>) -> Self {
        self.cancel_rx = Some(cancel_rx);
        self
    }

    /// Build the FFmpeg invocation for a plan.
    pub fn encode_command(&self, source: &Path, output: &Path, plan: &PanningPlan) -> FfmpegCommand {
        FfmpegCommand::new(source, output)
            .loop_input()
            .duration(plan.duration_seconds)
            .video_filter(build_pan_filter(plan, self.encoding.fps))
            .encoding(&self.encoding)
    }

    /// Render without progress reporting.
    pub async fn render(&self, request: &RenderRequest) -> MediaResult<RenderOutcome> {
        self.render_with_progress(request, |_| {}).await
    }

    /// Probe, plan and encode. On failure the output file is removed.
    pub async fn render_with_progress<F>(
        &self,
        request: &RenderRequest,
        progress_callback: F,
    ) -> MediaResult<RenderOutcome>
    where
        F: Fn(FfmpegProgress) + Send + 'static,
    {
        let logger = RenderLogger::new(request.render_id, request.source.display().to_string());
        let span = logger.create_span();

        async {
            logger.log_start(request.duration_secs);
            let started = Instant::now();

            let result = self.run_render(request, &logger, progress_callback).await;

            match &result {
                Ok(_) => {
                    logger.log_completion(started.elapsed().as_millis());
                    counter!(RENDERS_TOTAL, "outcome" => "success").increment(1);
                }
                Err(err) => {
                    logger.log_failure(err);
                    counter!(RENDERS_TOTAL, "outcome" => outcome_label(err)).increment(1);
                }
            }

            result.map(|(plan, resolution)| RenderOutcome {
                render_id: request.render_id,
                plan,
                resolution,
                output: request.output.clone(),
                elapsed: started.elapsed(),
            })
        }
        .instrument(span)
        .await
    }

    async fn run_render<F>(
        &self,
        request: &RenderRequest,
        logger: &RenderLogger,
        progress_callback: F,
    ) -> MediaResult<(PanningPlan, Resolution)>
    where
        F: Fn(FfmpegProgress) + Send + 'static,
    {
        ImageFormat::from_path(&request.source)?;
        let duration_secs = validate_duration(request.duration_secs)?;

        let dimensions = probe_image(&request.source).await?;
        let plan = PanningPlan::compute(dimensions, duration_secs);
        logger.log_plan(&plan);

        let cmd = self.encode_command(&request.source, &request.output, &plan);

        let mut runner = FfmpegRunner::new();
        if let Some(timeout) = self.timeout {
            runner = runner.with_timeout(timeout);
        }
        if let Some(cancel_rx) = &self.cancel_rx {
            runner = runner.with_cancel(cancel_rx.clone());
        }

        if let Err(err) = runner.run_with_progress(&cmd, progress_callback).await {
            remove_file_if_exists(&request.output).await;
            return Err(err);
        }

        let written = tokio::fs::metadata(&request.output)
            .await
            .map(|m| m.len())
            .unwrap_or(0);
        if written == 0 {
            remove_file_if_exists(&request.output).await;
            return Err(MediaError::encoding_failed(
                "FFmpeg finished without writing any video",
                None,
                None,
            ));
        }

        Ok((plan, plan.encoded_resolution()))
    }
}

fn outcome_label(err: &MediaError) -> &'static str {
    match err {
        MediaError::InvalidInputFormat(_) | MediaError::ContractViolation(_) => "rejected",
        MediaError::Probe { .. } | MediaError::FileNotFound(_) => "probe_failed",
        MediaError::Timeout(_) => "timeout",
        MediaError::Cancelled => "cancelled",
        _ => "encode_failed",
    }
}
