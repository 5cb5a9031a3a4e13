#![deny(unreachable_patterns)]
//! FFmpeg CLI wrapper for panning video renders.
//!
//! This crate provides:
//! - Type-safe FFmpeg command building
//! - Progress parsing from `-progress pipe:2`
//! - Cancellation and timeouts via tokio
//! - Image probing with FFprobe
//! - The probe, plan, encode pipeline in [`PanRenderer`]

pub mod command;
pub mod error;
pub mod filters;
pub mod fs_utils;
pub mod logging;
pub mod probe;
pub mod progress;
pub mod render;
pub mod scratch;

pub use command::{check_ffmpeg, check_ffprobe, FfmpegCommand, FfmpegRunner};
pub use error::{MediaError, MediaResult};
pub use filters::build_pan_filter;
pub use fs_utils::{move_file, remove_file_if_exists};
pub use logging::RenderLogger;
pub use probe::probe_image;
pub use progress::FfmpegProgress;
pub use render::{PanRenderer, RenderOutcome, RenderRequest};
pub use scratch::{remove_scratch_base, ScratchDir};
