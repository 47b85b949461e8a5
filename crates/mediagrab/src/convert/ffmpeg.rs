//! FFmpeg command lines for conversion and clipping

use std::path::{Path, PathBuf};
use std::process::Stdio;

use tracing::debug;

use crate::config::ToolSettings;
use crate::error::{Error, Result};
use crate::options::{Bitrate, Resolution};
use crate::timecode::Timecode;
use crate::tools::{self, describe_status, Invocation, Tool};

/// Settings for a full re-encode.
#[derive(Debug, Clone)]
pub struct EncodeSettings {
    pub resolution: Option<Resolution>,
    pub video_codec: String,
    pub audio_codec: String,
    pub video_bitrate: Option<Bitrate>,
    pub audio_bitrate: Bitrate,
}

/// A located FFmpeg executable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ffmpeg {
    program: PathBuf,
}

impl Ffmpeg {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn locate(settings: &ToolSettings) -> Result<Self> {
        tools::locate(Tool::Ffmpeg, settings.ffmpeg.as_deref()).map(Self::new)
    }

    fn base(&self) -> Invocation {
        let mut inv = Invocation::new(Tool::Ffmpeg, &self.program);
        inv.args(["-y", "-hide_banner", "-nostdin"]);
        inv
    }

    /// Re-encode `input` into `output`, scaling when a resolution is given.
    pub fn convert(&self, input: &Path, output: &Path, settings: &EncodeSettings) -> Invocation {
        let mut inv = self.base();
        inv.arg("-i").arg(input);

        if let Some(resolution) = settings.resolution {
            inv.arg("-vf").arg(resolution.scale_filter());
        }

        inv.args(build_video_args(settings));
        inv.args(build_audio_args(settings));
        inv.arg(output);
        inv
    }

    /// Stream-copy `duration` starting at `start`. Seeking before `-i` resets
    /// timestamps, so the length is always given with `-t`.
    pub fn clip(&self, input: &Path, output: &Path, start: Timecode, duration: Timecode) -> Invocation {
        let mut inv = self.base();
        inv.arg("-ss")
            .arg(start.to_seconds_arg())
            .arg("-i")
            .arg(input)
            .arg("-t")
            .arg(duration.to_seconds_arg())
            .args(["-c", "copy"])
            .arg(output);
        inv
    }

    pub fn run(&self, invocation: &Invocation) -> Result<()> {
        debug!("Running: {}", invocation);

        let output = invocation
            .command()
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    Error::ToolNotFound {
                        tool: Tool::Ffmpeg,
                        hint: Tool::Ffmpeg.install_hint().to_string(),
                    }
                } else {
                    Error::Spawn {
                        tool: Tool::Ffmpeg,
                        source: e,
                    }
                }
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let lines: Vec<&str> = stderr.lines().collect();
            return Err(Error::ToolFailed {
                tool: Tool::Ffmpeg,
                status: describe_status(output.status),
                message: tools::last_error_line(&lines),
            });
        }

        Ok(())
    }
}

/// Build video codec arguments
fn build_video_args(settings: &EncodeSettings) -> Vec<String> {
    let mut args = vec!["-c:v".to_string(), settings.video_codec.clone()];
    if let Some(bitrate) = &settings.video_bitrate {
        args.push("-b:v".to_string());
        args.push(bitrate.to_string());
    }
    args
}

/// Build audio codec arguments
fn build_audio_args(settings: &EncodeSettings) -> Vec<String> {
    vec![
        "-c:a".to_string(),
        settings.audio_codec.clone(),
        "-b:a".to_string(),
        settings.audio_bitrate.to_string(),
    ]
}
