//! FFprobe image information.

use serde::Deserialize;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;

use panreel_models::ImageDimensions;

use crate::command::check_ffprobe;
use crate::error::{MediaError, MediaResult};

/// FFprobe JSON output format.
#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    #[serde(default)]
    streams: Vec<FfprobeStream>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    codec_type: Option<String>,
    width: Option<i64>,
    height: Option<i64>,
}

/// Probe an image file for its pixel dimensions.
///
/// Fails with [`MediaError::Probe`] when FFprobe cannot decode the file or
/// reports no video stream with a usable size.
pub async fn probe_image(path: impl AsRef<Path>) -> MediaResult<ImageDimensions> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(MediaError::FileNotFound(path.to_path_buf()));
    }

    let ffprobe = check_ffprobe()?;

    let output = Command::new(ffprobe)
        .args([
            "-v",
            "error",
            "-select_streams",
            "v:0",
            "-show_entries",
            "stream=codec_type,width,height",
            "-print_format",
            "json",
        ])
        .arg(path)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .output()
        .await?;

    if !output.status.success() {
        return Err(MediaError::probe_failed(
            path,
            "FFprobe could not decode the file",
            Some(String::from_utf8_lossy(&output.stderr).trim().to_string()),
        ));
    }

    parse_dimensions(path, &output.stdout)
}

/// Extract the first video stream's size from FFprobe JSON.
fn parse_dimensions(path: &Path, stdout: &[u8]) -> MediaResult<ImageDimensions> {
    let probe: FfprobeOutput = serde_json::from_slice(stdout)
        .map_err(|e| MediaError::probe_failed(path, format!("Unreadable FFprobe output: {}", e), None))?;

    let stream = probe
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref().map_or(true, |t| t == "video"))
        .ok_or_else(|| MediaError::probe_failed(path, "No image stream found", None))?;

    match (stream.width, stream.height) {
        (Some(width), Some(height)) => ImageDimensions::from_signed(width, height)
            .map_err(|e| MediaError::probe_failed(path, e.to_string(), None)),
        _ => Err(MediaError::probe_failed(path, "Image size not reported", None)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> MediaResult<ImageDimensions> {
        parse_dimensions(Path::new("photo.png"), json.as_bytes())
    }

    #[test]
    fn test_parse_dimensions() {
        let dims = parse(r#"{"streams":[{"codec_type":"video","width":1920,"height":1080}]}"#).unwrap();
        assert_eq!((dims.width(), dims.height()), (1920, 1080));
    }

    #[test]
    fn test_parse_without_codec_type() {
        // -show_entries can omit fields that were not requested
        let dims = parse(r#"{"streams":[{"width":640,"height":480}]}"#).unwrap();
        assert_eq!(dims.to_string(), "640x480");
    }

    #[test]
    fn test_parse_missing_stream() {
        let err = parse(r#"{"streams":[]}"#).unwrap_err();
        assert!(matches!(err, MediaError::Probe { .. }));

        let err = parse(r#"{}"#).unwrap_err();
        assert!(matches!(err, MediaError::Probe { .. }));
    }

    #[test]
    fn test_parse_zero_size() {
        let err = parse(r#"{"streams":[{"codec_type":"video","width":0,"height":1080}]}"#).unwrap_err();
        assert!(matches!(err, MediaError::Probe { .. }));
    }

    #[test]
    fn test_parse_garbage() {
        let err = parse("not json").unwrap_err();
        assert!(matches!(err, MediaError::Probe { .. }));
    }

    #[tokio::test]
    async fn test_probe_missing_file() {
        let err = probe_image("/definitely/not/here.png").await.unwrap_err();
        assert!(matches!(err, MediaError::FileNotFound(_)));
    }
}
