//! Panning video generation handler.

use std::time::Instant;

use axum::body::Body;
use axum::extract::{Multipart, Query, State};
use axum::http::{header, StatusCode};
use axum::response::Response;
use serde::Deserialize;
use tracing::{info, warn};

use panreel_media::{MediaError, RenderRequest, ScratchDir};
use panreel_models::encoding::OUTPUT_MIME_TYPE;
use panreel_models::ImageFormat;

use crate::error::{ApiError, ApiResult};
use crate::metrics;
use crate::middleware::{VIDEO_DURATION_HEADER, VIDEO_RESOLUTION_HEADER};
use crate::state::AppState;

/// Multipart field carrying the image.
const FILE_FIELD: &str = "file";

/// Filename suggested to the client.
const DOWNLOAD_FILENAME: &str = "panning_video.mp4";

#[derive(Debug, Default, Deserialize)]
pub struct GenerateQuery {
    /// Seconds, parsed by the handler so bad values get a JSON error
    pub duration: Option<String>,
}

/// Resolve the requested duration against the configured bounds.
pub fn resolve_duration(raw: Option<&str>, default_secs: u32, max_secs: u32) -> ApiResult<u32> {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(default_secs);
    };

    let value: i64 = raw
        .parse()
        .map_err(|_| ApiError::bad_request(format!("duration must be an integer, got '{}'", raw)))?;

    if value < 1 || value > i64::from(max_secs) {
        return Err(ApiError::bad_request(format!(
            "duration must be between 1 and {} seconds",
            max_secs
        )));
    }

    Ok(value as u32)
}

struct Upload {
    format: ImageFormat,
    bytes: axum::body::Bytes,
}

/// Pull the image out of the form. The extension is checked before the body is read.
async fn read_upload(multipart: &mut Multipart) -> ApiResult<Upload> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Malformed multipart body: {}", e)))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let filename = field.file_name().unwrap_or_default().to_string();
        let format = ImageFormat::from_filename(&filename).map_err(MediaError::from)?;

        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::bad_request(format!("Failed to read upload: {}", e)))?;

        if bytes.is_empty() {
            return Err(ApiError::bad_request("Uploaded file is empty"));
        }

        return Ok(Upload { format, bytes });
    }

    Err(ApiError::bad_request(format!("Missing '{}' field", FILE_FIELD)))
}

/// POST /generate-video
///
/// Accepts a multipart image upload and responds with an MP4 that pans
/// across it in a 9:16 frame.
pub async fn generate_video(
    State(state): State<AppState>,
    Query(query): Query<GenerateQuery>,
    mut multipart: Multipart,
) -> ApiResult<Response> {
    let duration_secs = resolve_duration(
        query.duration.as_deref(),
        state.config.default_duration_secs,
        state.config.max_duration_secs,
    )?;

    let upload = read_upload(&mut multipart).await?;
    metrics::record_upload_size(upload.bytes.len());

    let _permit = state
        .render_permits
        .clone()
        .acquire_owned()
        .await
        .map_err(|_| ApiError::Unavailable)?;
    let _in_flight = metrics::InFlightGuard::render();

    let started = Instant::now();
    let result = render_upload(&state, upload, duration_secs).await;

    let outcome = match &result {
        Ok(_) => "success",
        Err(e) => e.code(),
    };
    metrics::record_render_duration(outcome, started.elapsed().as_secs_f64());

    result
}

async fn render_upload(state: &AppState, upload: Upload, duration_secs: u32) -> ApiResult<Response> {
    // Removed on every exit path, including timeout
    let scratch = ScratchDir::create(&state.config.scratch_dir).await?;

    let source = scratch.join(format!("source.{}", upload.format.extension()));
    tokio::fs::write(&source, &upload.bytes)
        .await
        .map_err(MediaError::from)?;

    let request = RenderRequest::new(source, scratch.join(DOWNLOAD_FILENAME), f64::from(duration_secs))
        .with_id(scratch.id());

    let timeout = state.config.request_timeout;
    let outcome = match tokio::time::timeout(timeout, state.renderer.render(&request)).await {
        Ok(result) => result?,
        Err(_) => {
            warn!(render_id = %request.render_id, "Render exceeded {:?}, abandoning", timeout);
            return Err(ApiError::Timeout(timeout.as_secs()));
        }
    };

    let video = tokio::fs::read(&outcome.output)
        .await
        .map_err(MediaError::from)?;

    info!(
        render_id = %outcome.render_id,
        resolution = %outcome.resolution,
        bytes = video.len(),
        elapsed_ms = outcome.elapsed.as_millis() as u64,
        "Video generated"
    );

    drop(scratch);

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, OUTPUT_MIME_TYPE)
        .header(header::CONTENT_LENGTH, video.len())
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", DOWNLOAD_FILENAME),
        )
        .header(VIDEO_RESOLUTION_HEADER, outcome.resolution.to_string())
        .header(VIDEO_DURATION_HEADER, duration_secs.to_string())
        .body(Body::from(video))
        .map_err(|e| ApiError::internal(format!("Failed to build response: {}", e)))
}
