//! panreel CLI: render a panning 9:16 video from a still image.
//!
//! Usage:
//!   panreel <IMAGE> [--duration SECS] [--output PATH] [--timeout SECS] [--crf N] [--preset NAME]
//!
//! Ctrl+C stops FFmpeg and removes the partial render.

use std::io::{IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context};
use clap::Parser;
use tokio::sync::watch;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

use panreel_media::{move_file, PanRenderer, RenderRequest, ScratchDir};
use panreel_models::encoding::OUTPUT_EXTENSION;
use panreel_models::{EncodingConfig, ImageFormat};

#[derive(Parser, Debug)]
#[command(
    name = "panreel",
    about = "Crop an image to 9:16 and render a video panning across it",
    version
)]
struct Cli {
    /// Input image (png, jpg, jpeg or webp)
    image: PathBuf,

    /// Video length in seconds
    #[arg(short, long, default_value = "3", env = "PANREEL_DURATION")]
    duration: u32,

    /// Output file [default: <image stem>_panning.mp4]
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Abort FFmpeg after this many seconds
    #[arg(long, env = "PANREEL_TIMEOUT")]
    timeout: Option<u64>,

    /// x264 quality, lower is better
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..=51))]
    crf: Option<u8>,

    /// x264 speed preset, e.g. veryfast or slow
    #[arg(long)]
    preset: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

/// `photo.jpg` becomes `photo_panning.mp4` in the current directory.
fn default_output_path(image: &Path) -> PathBuf {
    let stem = image
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    PathBuf::from(format!("{}_panning.{}", stem, OUTPUT_EXTENSION))
}

fn encoding_config(cli: &Cli) -> EncodingConfig {
    let mut encoding = EncodingConfig::default();
    if let Some(crf) = cli.crf {
        encoding = encoding.with_crf(crf);
    }
    if let Some(preset) = &cli.preset {
        encoding = encoding.with_preset(preset.as_str());
    }
    encoding
}

/// Flip the returned receiver to true on the first Ctrl+C.
fn cancel_on_ctrl_c() -> watch::Receiver<bool> {
    let (cancel_tx, cancel_rx) = watch::channel(false);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                let _ = cancel_tx.send(true);
            }
            Err(e) => warn!("Failed to install Ctrl+C handler: {}", e),
        }
    });
    cancel_rx
}

fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli, cancel_rx: watch::Receiver<bool>) -> anyhow::Result<()> {
    if !cli.image.is_file() {
        bail!("Input file '{}' not found", cli.image.display());
    }
    ImageFormat::from_path(&cli.image)?;
    if cli.duration == 0 {
        bail!("--duration must be at least 1 second");
    }

    let output = cli
        .output
        .clone()
        .unwrap_or_else(|| default_output_path(&cli.image));

    let output_dir = match output.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => PathBuf::from("."),
    };
    tokio::fs::create_dir_all(&output_dir)
        .await
        .with_context(|| format!("Failed to create {}", output_dir.display()))?;

    let scratch = ScratchDir::create(&output_dir).await?;
    let staged = scratch.join(format!("panning.{}", OUTPUT_EXTENSION));
    let request = RenderRequest::new(&cli.image, &staged, f64::from(cli.duration)).with_id(scratch.id());
    debug!(render_id = %request.render_id, output = %output.display(), "Rendering");

    let mut renderer = PanRenderer::new(encoding_config(&cli)).with_cancel(cancel_rx);
    if let Some(secs) = cli.timeout {
        renderer = renderer.with_timeout(Duration::from_secs(secs));
    }

    let total_secs = f64::from(cli.duration);
    let interactive = std::io::stderr().is_terminal();
    let outcome = renderer
        .render_with_progress(&request, move |progress| {
            if interactive {
                eprint!("\rEncoding {:>3.0}%", progress.fraction(total_secs) * 100.0);
                let _ = std::io::stderr().flush();
            }
        })
        .await;
    if interactive {
        eprintln!();
    }
    let outcome = outcome?;

    move_file(&outcome.output, &output).await?;
    scratch.close()?;

    println!("Video created: {}", output.display());
    println!(
        "Resolution: {}, duration: {}s",
        outcome.resolution, cli.duration
    );
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    run(cli, cancel_on_ctrl_c()).await
}
