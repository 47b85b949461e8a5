//! Download audio only, transcoded by yt-dlp's FFmpeg post-processor

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use tracing::info;

use mediagrab::cli::{self, CommonArgs};
use mediagrab::download::{self, AudioRequest};
use mediagrab::options::{AudioFormat, AudioQuality};

/// Download audio from online videos
#[derive(Parser, Debug)]
#[command(name = "download-audio")]
#[command(about = "Download audio from videos using yt-dlp")]
#[command(version)]
struct Args {
    /// Video URL
    url: String,

    /// Output directory (default: downloads/audio)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Audio format
    #[arg(short, long, value_enum, default_value_t = AudioFormat::Mp3)]
    format: AudioFormat,

    /// Audio quality in kbps
    #[arg(short, long, value_enum, default_value_t = AudioQuality::K192)]
    quality: AudioQuality,

    /// Skip TLS certificate verification (use if you get SSL errors)
    #[arg(long)]
    no_check_certificate: bool,

    #[command(flatten)]
    common: CommonArgs,
}

fn main() -> ExitCode {
    let args = Args::parse();

    cli::run(&args.common, |settings| {
        let request = AudioRequest {
            url: args.url.clone(),
            output_dir: args
                .output
                .clone()
                .unwrap_or_else(|| settings.output.audio_dir.clone()),
            format: args.format,
            quality: args.quality,
            skip_cert_check: args.no_check_certificate,
        };

        let files = download::download_audio(&settings.tools, &request)
            .with_context(|| format!("Error downloading audio from {}", request.url))?;

        info!("Successfully extracted audio");
        for file in files {
            println!("{}", file.display());
        }
        Ok(())
    })
}
