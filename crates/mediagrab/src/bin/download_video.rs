//! Download a single video with yt-dlp

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use tracing::info;

use mediagrab::cli::{self, CommonArgs};
use mediagrab::download::{self, VideoRequest};
use mediagrab::options::{VideoFormat, VideoQuality};

/// Download videos in a chosen quality and container
#[derive(Parser, Debug)]
#[command(name = "download-video")]
#[command(about = "Download videos using yt-dlp")]
#[command(version)]
struct Args {
    /// Video URL
    url: String,

    /// Output directory (default: downloads)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Video quality
    #[arg(short, long, value_enum, default_value_t = VideoQuality::Best)]
    quality: VideoQuality,

    /// Output container
    #[arg(short, long, value_enum, default_value_t = VideoFormat::Mp4)]
    format: VideoFormat,

    /// Skip TLS certificate verification (use if you get SSL errors)
    #[arg(long)]
    no_check_certificate: bool,

    #[command(flatten)]
    common: CommonArgs,
}

fn main() -> ExitCode {
    let args = Args::parse();

    cli::run(&args.common, |settings| {
        let request = VideoRequest {
            url: args.url.clone(),
            output_dir: args
                .output
                .clone()
                .unwrap_or_else(|| settings.output.video_dir.clone()),
            quality: args.quality,
            format: args.format,
            skip_cert_check: args.no_check_certificate,
        };

        let files = download::download_video(&settings.tools, &request)
            .with_context(|| format!("Error downloading video from {}", request.url))?;

        info!("Successfully downloaded video");
        for file in files {
            println!("{}", file.display());
        }
        Ok(())
    })
}
