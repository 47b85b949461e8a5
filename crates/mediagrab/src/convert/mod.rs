//! Local file conversion and clipping using FFmpeg

mod ffmpeg;

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::config::ToolSettings;
use crate::error::{Error, Result};
use crate::options::ConvertFormat;
use crate::timecode::Timecode;
use crate::utils;

pub use ffmpeg::{EncodeSettings, Ffmpeg};

#[derive(Debug, Clone)]
pub struct ConvertRequest {
    pub input: PathBuf,
    /// Defaults to `<stem>_converted.<format>` in the current directory.
    pub output: Option<PathBuf>,
    pub format: ConvertFormat,
    pub encode: EncodeSettings,
}

impl ConvertRequest {
    pub fn output_path(&self) -> PathBuf {
        self.output
            .clone()
            .unwrap_or_else(|| utils::converted_file_name(&self.input, self.format.extension()))
    }
}

#[derive(Debug, Clone)]
pub struct ClipRequest {
    pub input: PathBuf,
    pub output: PathBuf,
    pub start: Timecode,
    pub duration: Option<Timecode>,
    pub end: Option<Timecode>,
}

/// Length of a clip.
///
/// `end` takes precedence over `duration` when both are given; the
/// duration is then ignored with a warning. One of them is required.
pub fn clip_duration(
    start: Timecode,
    duration: Option<Timecode>,
    end: Option<Timecode>,
) -> Result<Timecode> {
    let length = match (end, duration) {
        (Some(end), duration) => {
            if let Some(duration) = duration {
                warn!(
                    "Both --end and --duration given; using --end {} and ignoring --duration {}",
                    end, duration
                );
            }
            end.checked_sub(start).ok_or_else(|| {
                Error::invalid(format!("--end {end} is before --start {start}"))
            })?
        }
        (None, Some(duration)) => duration,
        (None, None) => {
            return Err(Error::invalid("either --duration or --end must be specified"));
        }
    };

    if length.is_zero() {
        return Err(Error::invalid("clip length must be greater than zero"));
    }
    Ok(length)
}

fn require_input(input: &Path) -> Result<()> {
    if input.is_file() {
        Ok(())
    } else {
        Err(Error::invalid(format!(
            "input file '{}' not found",
            input.display()
        )))
    }
}

/// Convert a video to another container, codec set or size.
pub fn convert_video(tools: &ToolSettings, request: &ConvertRequest) -> Result<PathBuf> {
    require_input(&request.input)?;
    let output = request.output_path();
    let ffmpeg = Ffmpeg::locate(tools)?;
    utils::ensure_parent_dir(&output)?;

    info!("Converting: {} -> {}", request.input.display(), output.display());
    let invocation = ffmpeg.convert(&request.input, &output, &request.encode);
    ffmpeg.run(&invocation)?;

    Ok(output)
}

/// Cut a clip without re-encoding.
pub fn extract_clip(tools: &ToolSettings, request: &ClipRequest) -> Result<PathBuf> {
    let duration = clip_duration(request.start, request.duration, request.end)?;
    require_input(&request.input)?;
    let ffmpeg = Ffmpeg::locate(tools)?;
    utils::ensure_parent_dir(&request.output)?;

    info!(
        "Extracting clip from: {} ({} + {}s)",
        request.input.display(),
        request.start,
        duration.to_seconds_arg()
    );
    let invocation = ffmpeg.clip(&request.input, &request.output, request.start, duration);
    ffmpeg.run(&invocation)?;

    Ok(request.output.clone())
}
