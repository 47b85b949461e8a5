//! Convert or clip local video files with FFmpeg

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;

use mediagrab::cli::{self, CommonArgs};
use mediagrab::convert::{self, ClipRequest, ConvertRequest, EncodeSettings};
use mediagrab::options::{Bitrate, ConvertFormat, Resolution};
use mediagrab::timecode::Timecode;

/// Convert videos using FFmpeg
#[derive(Parser, Debug)]
#[command(name = "convert-video")]
#[command(about = "Convert videos using FFmpeg")]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Command,

    #[command(flatten)]
    common: CommonArgs,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Convert video format/resolution
    Convert {
        /// Input video file
        input: PathBuf,

        /// Output file path (default: <name>_converted.<format>)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = ConvertFormat::Mp4)]
        format: ConvertFormat,

        /// Output resolution (e.g. 1920x1080, 1280x720)
        #[arg(short, long)]
        resolution: Option<Resolution>,

        /// Video codec
        #[arg(long, default_value = "libx264")]
        vcodec: String,

        /// Audio codec
        #[arg(long, default_value = "aac")]
        acodec: String,

        /// Video bitrate (e.g. 2M)
        #[arg(long)]
        vbitrate: Option<Bitrate>,

        /// Audio bitrate
        #[arg(long, default_value = "192k")]
        abitrate: Bitrate,
    },

    /// Extract a clip from a video without re-encoding
    Clip {
        /// Input video file
        input: PathBuf,

        /// Output file path
        #[arg(short, long)]
        output: PathBuf,

        /// Start time (HH:MM:SS or seconds)
        #[arg(short, long)]
        start: Timecode,

        /// Duration (seconds or HH:MM:SS)
        #[arg(short, long)]
        duration: Option<Timecode>,

        /// End time (HH:MM:SS or seconds); wins over --duration
        #[arg(short, long)]
        end: Option<Timecode>,
    },
}

fn main() -> ExitCode {
    let args = Args::parse();

    cli::run(&args.common, |settings| match args.command {
        Command::Convert {
            input,
            output,
            format,
            resolution,
            vcodec,
            acodec,
            vbitrate,
            abitrate,
        } => {
            let request = ConvertRequest {
                input,
                output,
                format,
                encode: EncodeSettings {
                    resolution,
                    video_codec: vcodec,
                    audio_codec: acodec,
                    video_bitrate: vbitrate,
                    audio_bitrate: abitrate,
                },
            };

            let output = convert::convert_video(&settings.tools, &request)
                .with_context(|| format!("Error converting {}", request.input.display()))?;

            info!("Successfully converted to: {}", output.display());
            println!("{}", output.display());
            Ok(())
        }

        Command::Clip {
            input,
            output,
            start,
            duration,
            end,
        } => {
            let request = ClipRequest {
                input,
                output,
                start,
                duration,
                end,
            };

            let output = convert::extract_clip(&settings.tools, &request)
                .with_context(|| format!("Error extracting clip from {}", request.input.display()))?;

            info!("Successfully extracted clip to: {}", output.display());
            println!("{}", output.display());
            Ok(())
        }
    })
}
