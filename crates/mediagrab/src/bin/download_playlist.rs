//! Download a playlist range, one item at a time

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use tracing::{info, warn};

use mediagrab::cli::{self, CommonArgs};
use mediagrab::download::{self, PlaylistRequest};
use mediagrab::options::{VideoFormat, VideoQuality};

/// Download playlists or channels
#[derive(Parser, Debug)]
#[command(name = "download-playlist")]
#[command(about = "Download playlists using yt-dlp")]
#[command(version)]
struct Args {
    /// Playlist URL
    url: String,

    /// Output directory (default: downloads/playlists)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Video quality
    #[arg(short, long, value_enum, default_value_t = VideoQuality::Best)]
    quality: VideoQuality,

    /// Output container
    #[arg(short, long, value_enum, default_value_t = VideoFormat::Mp4)]
    format: VideoFormat,

    /// Download only audio as MP3
    #[arg(short, long)]
    audio_only: bool,

    /// Start downloading from this item number
    #[arg(short, long, default_value = "1")]
    start: usize,

    /// Stop downloading at this item number
    #[arg(short, long)]
    end: Option<usize>,

    /// Skip TLS certificate verification (use if you get SSL errors)
    #[arg(long)]
    no_check_certificate: bool,

    #[command(flatten)]
    common: CommonArgs,
}

fn main() -> ExitCode {
    let args = Args::parse();

    cli::run(&args.common, |settings| {
        let request = PlaylistRequest {
            url: args.url.clone(),
            output_dir: args
                .output
                .clone()
                .unwrap_or_else(|| settings.output.playlist_dir.clone()),
            quality: args.quality,
            format: args.format,
            audio_only: args.audio_only,
            start: args.start,
            end: args.end,
            skip_cert_check: args.no_check_certificate,
        };

        let report = download::download_playlist(&settings.tools, &request)
            .with_context(|| format!("Error downloading playlist from {}", request.url))?;

        info!(
            "Downloaded {}/{} item(s) of {}",
            report.downloaded.len(),
            report.attempted(),
            report.title.as_deref().unwrap_or("playlist")
        );
        for failed in &report.failed {
            warn!("Failed {}: {}", failed.item.label(), failed.error);
        }
        for (_, files) in &report.downloaded {
            for file in files {
                println!("{}", file.display());
            }
        }
        Ok(())
    })
}
