//! End-to-end renders through the real FFmpeg and FFprobe binaries.
//!
//! Each test returns early when the tools are not installed.

use std::path::{Path, PathBuf};

use serde_json::Value;
use tokio::process::Command;
use tokio::sync::watch;

use panreel_media::{check_ffmpeg, check_ffprobe, MediaError, PanRenderer, RenderRequest, ScratchDir};
use panreel_models::EncodingConfig;

fn tools_available() -> bool {
    check_ffmpeg().is_ok() && check_ffprobe().is_ok()
}

/// Write a solid-colour still of the given size.
async fn solid_image(dir: &Path, name: &str, width: u32, height: u32) -> PathBuf {
    let path = dir.join(name);
    let status = Command::new("ffmpeg")
        .args(["-y", "-v", "error", "-f", "lavfi", "-i"])
        .arg(format!("color=c=steelblue:s={}x{}", width, height))
        .args(["-frames:v", "1"])
        .arg(&path)
        .status()
        .await
        .unwrap();
    assert!(status.success(), "could not create {}", path.display());
    path
}

/// Stream and container facts of a rendered video.
async fn video_info(path: &Path) -> Value {
    let output = Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-select_streams",
            "v:0",
            "-show_entries",
            "stream=codec_name,width,height,r_frame_rate,pix_fmt:format=duration",
            "-of",
            "json",
        ])
        .arg(path)
        .output()
        .await
        .unwrap();
    assert!(output.status.success());
    serde_json::from_slice(&output.stdout).unwrap()
}

fn is_empty_dir(path: &Path) -> bool {
    std::fs::read_dir(path).unwrap().next().is_none()
}

#[tokio::test]
async fn landscape_image_renders_portrait_h264() {
    if !tools_available() {
        return;
    }

    let base = tempfile::tempdir().unwrap();
    let scratch = ScratchDir::create(base.path()).await.unwrap();
    let source = solid_image(scratch.path(), "source.png", 1920, 1080).await;
    let request = RenderRequest::new(&source, scratch.join("pan.mp4"), 3.0);

    let outcome = PanRenderer::default().render(&request).await.unwrap();
    assert_eq!(outcome.resolution.to_string(), "606x1080");
    assert_eq!(outcome.plan.pan_range_pixels, 1313);

    let info = video_info(&outcome.output).await;
    let stream = &info["streams"][0];
    assert_eq!(stream["codec_name"], "h264");
    assert_eq!(stream["width"], 606);
    assert_eq!(stream["height"], 1080);
    assert_eq!(stream["r_frame_rate"], "30/1");
    assert_eq!(stream["pix_fmt"], "yuv420p");

    let duration: f64 = info["format"]["duration"].as_str().unwrap().parse().unwrap();
    assert!((duration - 3.0).abs() < 0.1, "duration {}", duration);

    scratch.close().unwrap();
    assert!(is_empty_dir(base.path()));
}

#[tokio::test]
async fn odd_sized_portrait_is_encoded_at_even_size() {
    if !tools_available() {
        return;
    }

    let dir = tempfile::tempdir().unwrap();
    let source = solid_image(dir.path(), "tall.png", 601, 1069).await;
    let request = RenderRequest::new(&source, dir.path().join("pan.mp4"), 1.0);

    let outcome = PanRenderer::default().render(&request).await.unwrap();
    assert!(outcome.plan.is_static());

    let info = video_info(&outcome.output).await;
    let stream = &info["streams"][0];
    assert_eq!(stream["width"], u64::from(outcome.resolution.width));
    assert_eq!(stream["height"], u64::from(outcome.resolution.height));
    assert_eq!(outcome.resolution.width % 2, 0);
    assert_eq!(outcome.resolution.height % 2, 0);
}

#[tokio::test]
async fn encoder_failure_reports_diagnostics_and_leaves_nothing() {
    if !tools_available() {
        return;
    }

    let base = tempfile::tempdir().unwrap();
    let scratch = ScratchDir::create(base.path()).await.unwrap();
    let source = solid_image(scratch.path(), "source.png", 640, 480).await;
    let output = scratch.join("pan.mp4");

    let encoding = EncodingConfig {
        codec: "panreel_missing_encoder".to_string(),
        ..Default::default()
    };
    let request = RenderRequest::new(&source, &output, 2.0);
    let err = PanRenderer::new(encoding).render(&request).await.unwrap_err();

    match &err {
        MediaError::Encoding { exit_code, .. } => assert_ne!(*exit_code, Some(0)),
        other => panic!("expected an encoding error, got {:?}", other),
    }
    assert!(err.diagnostics().is_some_and(|d| !d.is_empty()));
    assert!(!output.exists());

    drop(scratch);
    assert!(is_empty_dir(base.path()));
}

#[tokio::test]
async fn cancelled_render_removes_partial_output() {
    if !tools_available() {
        return;
    }

    let dir = tempfile::tempdir().unwrap();
    let source = solid_image(dir.path(), "source.jpg", 1280, 720).await;
    let output = dir.path().join("pan.mp4");

    let (cancel_tx, cancel_rx) = watch::channel(false);
    cancel_tx.send(true).unwrap();

    let request = RenderRequest::new(&source, &output, 30.0);
    let err = PanRenderer::default()
        .with_cancel(cancel_rx)
        .render(&request)
        .await
        .unwrap_err();

    assert!(matches!(err, MediaError::Cancelled));
    assert!(!output.exists());
}
