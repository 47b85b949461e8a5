//! yt-dlp invocation building and execution with progress reporting
//!
//! Supports every yt-dlp-compatible site. When deno is available it is
//! passed as the JavaScript runtime for extractors that need one.

use std::ffi::OsString;
use std::io::{self, BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::thread;

use tracing::{debug, info, warn};

use crate::config::ToolSettings;
use crate::error::{Error, Result};
use crate::options::{AudioFormat, AudioQuality, VideoFormat, VideoQuality};
use crate::tools::{self, describe_status, Invocation, Tool};

/// Output file name template used below the output directory.
pub const TITLE_TEMPLATE: &str = "%(title)s.%(ext)s";

/// Minimum progress step (percent) between progress log lines.
const PROGRESS_STEP: f32 = 5.0;

/// yt-dlp executable plus the optional JavaScript runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct YtDlp {
    program: PathBuf,
    js_runtime: Option<PathBuf>,
}

impl YtDlp {
    pub fn new(program: impl Into<PathBuf>, js_runtime: Option<PathBuf>) -> Self {
        Self {
            program: program.into(),
            js_runtime,
        }
    }

    /// Resolve yt-dlp (required) and deno (optional).
    pub fn locate(settings: &ToolSettings) -> Result<Self> {
        let program = tools::locate(Tool::YtDlp, settings.ytdlp.as_deref())?;
        let js_runtime = match settings.deno.as_deref() {
            Some(path) => Some(tools::locate(Tool::Deno, Some(path))?),
            None => tools::find(Tool::Deno),
        };
        if js_runtime.is_none() {
            debug!("deno not found, JavaScript-based extractors may fail");
        }
        Ok(Self::new(program, js_runtime))
    }

    fn base(&self) -> Invocation {
        let mut inv = Invocation::new(Tool::YtDlp, &self.program);
        if let Some(deno) = &self.js_runtime {
            let mut runtime = OsString::from("deno:");
            runtime.push(deno);
            inv.arg("--js-runtimes").arg(runtime);
        }
        inv
    }

    /// Base for a download that reports progress and final file paths.
    fn download_base(&self, skip_cert_check: bool) -> Invocation {
        let mut inv = self.base();
        inv.args([
            "--newline",
            "--progress",
            "--print",
            "after_move:filepath",
        ]);
        if skip_cert_check {
            inv.arg("--no-check-certificates");
        }
        inv
    }

    /// Download one video at `quality`, remuxed/recoded into `format`.
    pub fn video(
        &self,
        url: &str,
        template: &Path,
        quality: VideoQuality,
        format: VideoFormat,
        skip_cert_check: bool,
    ) -> Invocation {
        let mut inv = self.download_base(skip_cert_check);
        inv.arg("-f")
            .arg(quality.format_selector())
            .arg("--merge-output-format")
            .arg(format.as_str())
            .arg("--recode-video")
            .arg(format.as_str())
            .arg("-o")
            .arg(template)
            .arg("--no-playlist")
            .arg(url);
        inv
    }

    /// Download the best audio stream and transcode it with FFmpeg.
    pub fn audio(
        &self,
        url: &str,
        template: &Path,
        format: AudioFormat,
        quality: AudioQuality,
        skip_cert_check: bool,
    ) -> Invocation {
        let mut inv = self.download_base(skip_cert_check);
        inv.arg("-f")
            .arg("bestaudio/best")
            .arg("-x")
            .arg("--audio-format")
            .arg(format.as_str())
            .arg("--audio-quality")
            .arg(quality.ytdlp_value())
            .arg("-o")
            .arg(template)
            .arg("--no-playlist")
            .arg(url);
        inv
    }

    /// Enumerate playlist entries without downloading them.
    pub fn playlist_listing(
        &self,
        url: &str,
        start: usize,
        end: Option<usize>,
        skip_cert_check: bool,
    ) -> Invocation {
        let items = match end {
            Some(end) => format!("{start}:{end}"),
            None => format!("{start}:"),
        };

        let mut inv = self.base();
        inv.args(["--flat-playlist", "--dump-single-json", "--playlist-items"])
            .arg(items);
        if skip_cert_check {
            inv.arg("--no-check-certificates");
        }
        inv.arg(url);
        inv
    }

    /// Run a download invocation, logging progress. Returns the paths yt-dlp
    /// printed for the finished files.
    pub fn run(&self, invocation: &Invocation) -> Result<Vec<PathBuf>> {
        debug!("Running: {}", invocation);

        let mut child = invocation
            .command()
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(spawn_error)?;

        let stderr_reader = child
            .stderr
            .take()
            .map(|stderr| thread::spawn(move || follow_stderr(stderr)));

        let mut files = Vec::new();
        let read_result = match child.stdout.take() {
            Some(stdout) => for_each_line(stdout, |line| {
                let line = line.trim();
                if !line.is_empty() {
                    debug!("[yt-dlp] output: {}", line);
                    files.push(PathBuf::from(line));
                }
            }),
            None => Ok(()),
        };
        if let Err(e) = read_result {
            // The child must not outlive a broken stdout pipe.
            let _ = child.kill();
            let _ = child.wait();
            return Err(Error::io(&self.program, e));
        }

        let status = child.wait().map_err(|e| Error::io(&self.program, e))?;
        let stderr_lines = stderr_reader
            .and_then(|handle| handle.join().ok())
            .unwrap_or_default();

        if !status.success() {
            return Err(Error::ToolFailed {
                tool: Tool::YtDlp,
                status: describe_status(status),
                message: tools::last_error_line(&stderr_lines),
            });
        }

        if files.is_empty() {
            warn!("yt-dlp finished without reporting an output file");
        }
        Ok(files)
    }

    /// Run an invocation to completion and return its stdout.
    pub fn capture(&self, invocation: &Invocation) -> Result<Vec<u8>> {
        debug!("Running: {}", invocation);

        let output = invocation
            .command()
            .stdin(Stdio::null())
            .output()
            .map_err(spawn_error)?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let lines: Vec<&str> = stderr.lines().collect();
            return Err(Error::ToolFailed {
                tool: Tool::YtDlp,
                status: describe_status(output.status),
                message: tools::last_error_line(&lines),
            });
        }

        Ok(output.stdout)
    }
}

fn spawn_error(e: std::io::Error) -> Error {
    if e.kind() == std::io::ErrorKind::NotFound {
        Error::ToolNotFound {
            tool: Tool::YtDlp,
            hint: Tool::YtDlp.install_hint().to_string(),
        }
    } else {
        Error::Spawn {
            tool: Tool::YtDlp,
            source: e,
        }
    }
}

/// Call `f` for every line of `reader`, decoding lossily. Titles reach us in
/// whatever encoding the platform uses, so invalid UTF-8 must not end the read.
fn for_each_line(reader: impl Read, mut f: impl FnMut(String)) -> io::Result<()> {
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            return Ok(());
        }
        let line = String::from_utf8_lossy(&buf);
        f(line.trim_end_matches(['\r', '\n']).to_string());
    }
}

/// Log progress and warnings from yt-dlp's stderr; keep every line for
/// error reporting. Reads until the child closes the pipe.
fn follow_stderr(stderr: impl Read) -> Vec<String> {
    let mut lines = Vec::new();
    let mut progress = ProgressThrottle::default();

    let result = for_each_line(stderr, |line| {
        if let Some(percent) = parse_progress(&line) {
            if let Some(report) = progress.update(percent) {
                info!("Progress: {:.0}%", report);
            }
        } else if line.starts_with("WARNING:") {
            warn!("[yt-dlp] {}", line.trim_start_matches("WARNING:").trim());
        } else if line.starts_with("ERROR:") {
            warn!("[yt-dlp] {}", line);
        } else if line.contains("Merging") || line.contains("ExtractAudio") || line.contains("VideoConvertor") {
            info!("[yt-dlp] {}", line);
        } else if !line.is_empty() {
            debug!("[yt-dlp] {}", line);
        }

        lines.push(line);
    });
    if let Err(e) = result {
        warn!("Failed to read yt-dlp stderr: {}", e);
    }

    lines
}

/// Percentage from a progress line such as
/// `[download]  45.2% of 100.00MiB at 2.00MiB/s ETA 00:27`.
pub fn parse_progress(line: &str) -> Option<f32> {
    let rest = line.trim().strip_prefix("[download]")?;
    let (before, _) = rest.split_once('%')?;
    let number = before.trim().rsplit(' ').next()?;
    let percent: f32 = number.parse().ok()?;
    (0.0..=100.0).contains(&percent).then_some(percent)
}

/// Emits a value only when progress moved by at least [`PROGRESS_STEP`]
/// or reached 100%.
#[derive(Debug, Default)]
struct ProgressThrottle {
    last: Option<f32>,
}

impl ProgressThrottle {
    fn update(&mut self, percent: f32) -> Option<f32> {
        let due = match self.last {
            None => true,
            // A lower value means yt-dlp moved on to the next stream.
            Some(last) => percent < last || percent - last >= PROGRESS_STEP || (percent >= 100.0 && last < 100.0),
        };
        if due {
            self.last = Some(percent);
            Some(percent)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ytdlp() -> YtDlp {
        YtDlp::new("yt-dlp", None)
    }

    fn template() -> PathBuf {
        Path::new("downloads").join(TITLE_TEMPLATE)
    }

    #[test]
    fn test_video_invocation_every_quality_and_format() {
        for quality in VideoQuality::ALL {
            for format in VideoFormat::ALL {
                let inv = ytdlp().video("https://youtu.be/x", &template(), quality, format, false);

                assert_eq!(inv.count("-f"), 1);
                assert_eq!(inv.value_of("-f").unwrap(), quality.format_selector().as_str());
                assert_eq!(inv.count("--merge-output-format"), 1);
                assert_eq!(inv.value_of("--merge-output-format").unwrap(), format.as_str());
                assert_eq!(inv.value_of("--recode-video").unwrap(), format.as_str());
            }
        }
    }

    #[test]
    fn test_video_invocation_shape() {
        let inv = ytdlp().video(
            "https://youtu.be/x",
            &template(),
            VideoQuality::P480,
            VideoFormat::Mkv,
            false,
        );

        assert_eq!(inv.tool, Tool::YtDlp);
        assert_eq!(inv.value_of("-o").unwrap(), template().as_os_str());
        assert_eq!(inv.value_of("--print").unwrap(), "after_move:filepath");
        assert_eq!(inv.count("--no-playlist"), 1);
        assert_eq!(inv.count("--no-check-certificates"), 0);
        assert_eq!(inv.args.last().unwrap(), "https://youtu.be/x");
    }

    #[test]
    fn test_audio_invocation_every_format_and_quality() {
        for format in AudioFormat::ALL {
            for quality in AudioQuality::ALL {
                let inv = ytdlp().audio("https://youtu.be/x", &template(), format, quality, false);

                assert_eq!(inv.count("--audio-format"), 1);
                assert_eq!(inv.value_of("--audio-format").unwrap(), format.as_str());
                assert_eq!(inv.count("--audio-quality"), 1);
                assert_eq!(
                    inv.value_of("--audio-quality").unwrap(),
                    format!("{}K", quality.kbps()).as_str()
                );
                assert_eq!(inv.count("-x"), 1);
            }
        }
    }

    #[test]
    fn test_flac_at_top_tier() {
        let inv = ytdlp().audio(
            "https://youtu.be/x",
            &template(),
            AudioFormat::Flac,
            AudioQuality::K320,
            false,
        );

        assert_eq!(inv.value_of("--audio-format").unwrap(), "flac");
        assert_eq!(
            inv.value_of("--audio-quality").unwrap(),
            AudioQuality::MAX.ytdlp_value().as_str()
        );
        assert_eq!(inv.value_of("-f").unwrap(), "bestaudio/best");
    }

    #[test]
    fn test_certificate_flag_only_when_asked() {
        let with = ytdlp().audio("u", &template(), AudioFormat::Mp3, AudioQuality::K192, true);
        let without = ytdlp().audio("u", &template(), AudioFormat::Mp3, AudioQuality::K192, false);
        assert_eq!(with.count("--no-check-certificates"), 1);
        assert_eq!(without.count("--no-check-certificates"), 0);

        let listing = ytdlp().playlist_listing("u", 1, None, true);
        assert_eq!(listing.count("--no-check-certificates"), 1);
    }

    #[test]
    fn test_js_runtime_args() {
        let with_deno = YtDlp::new("yt-dlp", Some(PathBuf::from("/usr/bin/deno")));
        let inv = with_deno.video("u", &template(), VideoQuality::Best, VideoFormat::Mp4, false);
        assert_eq!(inv.value_of("--js-runtimes").unwrap(), "deno:/usr/bin/deno");

        let inv = ytdlp().video("u", &template(), VideoQuality::Best, VideoFormat::Mp4, false);
        assert_eq!(inv.count("--js-runtimes"), 0);
    }

    #[test]
    fn test_playlist_listing_range() {
        let inv = ytdlp().playlist_listing("https://youtube.com/playlist?list=PL1", 3, Some(7), false);
        assert_eq!(inv.value_of("--playlist-items").unwrap(), "3:7");
        assert_eq!(inv.count("--flat-playlist"), 1);
        assert_eq!(inv.count("--dump-single-json"), 1);

        let open = ytdlp().playlist_listing("u", 2, None, false);
        assert_eq!(open.value_of("--playlist-items").unwrap(), "2:");
    }

    #[test]
    fn test_for_each_line_decodes_lossily() {
        let input: &[u8] = b"Caf\xe9.mp4\r\nplain.mkv\nlast";
        let mut lines = Vec::new();
        for_each_line(input, |line| lines.push(line)).unwrap();
        assert_eq!(lines, vec!["Caf\u{fffd}.mp4", "plain.mkv", "last"]);
    }

    #[cfg(unix)]
    fn fake_ytdlp(dir: &Path, body: &str) -> YtDlp {
        use std::os::unix::fs::PermissionsExt;

        let path = dir.join("yt-dlp");
        std::fs::write(&path, format!("#!/bin/sh\n{body}")).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        YtDlp::new(path, None)
    }

    #[cfg(unix)]
    #[test]
    fn test_run_survives_non_utf8_output() {
        let dir = tempfile::tempdir().unwrap();
        let ytdlp = fake_ytdlp(
            dir.path(),
            r#"printf 'Caf\351.mp4\n'
printf '[download] Destination: Caf\351.mp4\n' >&2
i=0
while [ $i -lt 4000 ]; do
  echo '[download]  50.0% of 1.00MiB at 1.00MiB/s ETA 00:01' >&2
  i=$((i+1))
done
exit 0
"#,
        );

        let files = ytdlp.run(&ytdlp.base()).unwrap();
        assert_eq!(files, vec![PathBuf::from("Caf\u{fffd}.mp4")]);
    }

    #[cfg(unix)]
    #[test]
    fn test_run_reports_tool_error_line() {
        let dir = tempfile::tempdir().unwrap();
        let ytdlp = fake_ytdlp(
            dir.path(),
            "printf 'ERROR: Unsupported URL: caf\\351\\n' >&2\nexit 1\n",
        );

        match ytdlp.run(&ytdlp.base()) {
            Err(Error::ToolFailed { tool, status, message }) => {
                assert_eq!(tool, Tool::YtDlp);
                assert_eq!(status, "exit code 1");
                assert!(message.starts_with("ERROR: Unsupported URL"), "{message}");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_parse_progress() {
        assert_eq!(
            parse_progress("[download]  45.2% of 100.00MiB at 2.00MiB/s ETA 00:27"),
            Some(45.2)
        );
        assert_eq!(parse_progress("[download] 100% of 3.10MiB in 00:00:02"), Some(100.0));
        assert_eq!(parse_progress("[download] Destination: clip.mp4"), None);
        assert_eq!(parse_progress("[youtube] abc: Downloading 50% of nothing"), None);
        assert_eq!(parse_progress("[download] Unknown% of ~"), None);
    }

    #[test]
    fn test_progress_throttle() {
        let mut throttle = ProgressThrottle::default();
        assert_eq!(throttle.update(0.4), Some(0.4));
        assert_eq!(throttle.update(3.0), None);
        assert_eq!(throttle.update(5.5), Some(5.5));
        assert_eq!(throttle.update(99.0), Some(99.0));
        assert_eq!(throttle.update(100.0), Some(100.0));
        assert_eq!(throttle.update(100.0), None);
        // audio stream after video stream
        assert_eq!(throttle.update(1.0), Some(1.0));
    }
}
