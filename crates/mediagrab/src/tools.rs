//! External program discovery and invocations
//!
//! yt-dlp and FFmpeg are found through the settings file, then `PATH`, then
//! well-known per-platform install locations.

use std::ffi::{OsStr, OsString};
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};

use tracing::debug;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tool {
    YtDlp,
    Ffmpeg,
    Deno,
}

impl Tool {
    /// Executable name as found on `PATH`.
    pub fn program(self) -> &'static str {
        match self {
            Tool::YtDlp => "yt-dlp",
            Tool::Ffmpeg => "ffmpeg",
            Tool::Deno => "deno",
        }
    }

    fn version_flag(self) -> &'static str {
        match self {
            Tool::Ffmpeg => "-version",
            Tool::YtDlp | Tool::Deno => "--version",
        }
    }

    pub fn install_hint(self) -> &'static str {
        match self {
            Tool::YtDlp => "Install with: pip install yt-dlp",
            Tool::Ffmpeg => "Install FFmpeg from https://ffmpeg.org/download.html and make sure it is on PATH",
            Tool::Deno => "Install from https://deno.com (optional)",
        }
    }
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.program())
    }
}

/// Whether `program` runs and reports its version.
fn probe(program: &Path, tool: Tool) -> bool {
    Command::new(program)
        .arg(tool.version_flag())
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

/// Find a tool, checking `PATH` first and then common install locations.
pub fn find(tool: Tool) -> Option<PathBuf> {
    let on_path = PathBuf::from(tool.program());
    if probe(&on_path, tool) {
        return Some(on_path);
    }

    platform_candidates(tool)
        .into_iter()
        .find(|candidate| candidate.exists() && probe(candidate, tool))
}

/// Resolve a tool or fail with an install hint.
///
/// A configured path is authoritative: if it does not run, there is no
/// fallback to `PATH`.
pub fn locate(tool: Tool, configured: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = configured {
        if probe(path, tool) {
            debug!("{} (configured): {}", tool, path.display());
            return Ok(path.to_path_buf());
        }
        return Err(Error::ToolNotFound {
            tool,
            hint: format!(
                "Configured path {} did not run. Fix [tools] in the settings file.",
                path.display()
            ),
        });
    }

    match find(tool) {
        Some(path) => {
            debug!("{}: {}", tool, path.display());
            Ok(path)
        }
        None => Err(Error::ToolNotFound {
            tool,
            hint: tool.install_hint().to_string(),
        }),
    }
}

#[cfg(windows)]
fn platform_candidates(tool: Tool) -> Vec<PathBuf> {
    let mut candidates = Vec::new();

    match tool {
        Tool::YtDlp => {
            // pip --user installs under %APPDATA%\Python or %LOCALAPPDATA%\Programs\Python
            let roots = [
                std::env::var_os("APPDATA").map(|p| PathBuf::from(p).join("Python")),
                std::env::var_os("LOCALAPPDATA")
                    .map(|p| PathBuf::from(p).join("Programs").join("Python")),
            ];
            for root in roots.into_iter().flatten() {
                if let Ok(entries) = std::fs::read_dir(&root) {
                    for entry in entries.flatten() {
                        candidates.push(entry.path().join("Scripts").join("yt-dlp.exe"));
                    }
                }
            }
        }
        Tool::Ffmpeg | Tool::Deno => {
            if let Some(local) = std::env::var_os("LOCALAPPDATA") {
                let winget = PathBuf::from(local)
                    .join("Microsoft")
                    .join("WinGet")
                    .join("Packages");
                if let Ok(entries) = std::fs::read_dir(&winget) {
                    for entry in entries.flatten() {
                        let name = entry.file_name().to_string_lossy().to_lowercase();
                        if name.contains(tool.program()) {
                            let exe = format!("{}.exe", tool.program());
                            candidates.push(entry.path().join(&exe));
                            candidates.push(entry.path().join("bin").join(&exe));
                        }
                    }
                }
            }
        }
    }

    candidates
}

#[cfg(not(windows))]
fn platform_candidates(tool: Tool) -> Vec<PathBuf> {
    let mut candidates = vec![
        PathBuf::from("/usr/local/bin").join(tool.program()),
        PathBuf::from("/opt/homebrew/bin").join(tool.program()),
    ];

    if let Some(home) = dirs::home_dir() {
        candidates.push(home.join(".local").join("bin").join(tool.program()));
        if tool == Tool::Deno {
            candidates.push(home.join(".deno").join("bin").join("deno"));
        }
    }

    candidates
}

/// One external program call: resolved program plus ordered arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub tool: Tool,
    pub program: PathBuf,
    pub args: Vec<OsString>,
}

impl Invocation {
    pub fn new(tool: Tool, program: impl Into<PathBuf>) -> Self {
        Self {
            tool,
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(&mut self, arg: impl AsRef<OsStr>) -> &mut Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    pub fn args<I, S>(&mut self, args: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        for arg in args {
            self.arg(arg);
        }
        self
    }

    /// Value following `flag`, if present.
    pub fn value_of(&self, flag: &str) -> Option<&OsStr> {
        self.args
            .iter()
            .position(|a| a == flag)
            .and_then(|i| self.args.get(i + 1))
            .map(OsString::as_os_str)
    }

    /// Number of times `flag` appears.
    pub fn count(&self, flag: &str) -> usize {
        self.args.iter().filter(|a| *a == flag).count()
    }

    pub fn command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        cmd
    }
}

impl fmt::Display for Invocation {
    /// Shell-like rendering for logs.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", quote(self.program.as_os_str()))?;
        for arg in &self.args {
            write!(f, " {}", quote(arg))?;
        }
        Ok(())
    }
}

fn quote(arg: &OsStr) -> String {
    let s = arg.to_string_lossy();
    if !s.is_empty() && !s.contains(|c: char| c.is_whitespace() || c == '\'' || c == '"') {
        return s.into_owned();
    }
    format!("'{}'", s.replace('\'', r"'\''"))
}

/// Human-readable exit status.
pub fn describe_status(status: ExitStatus) -> String {
    match status.code() {
        Some(code) => format!("exit code {code}"),
        None => "terminated by signal".to_string(),
    }
}

/// Last meaningful line of a tool's stderr, preferring explicit errors.
pub fn last_error_line<S: AsRef<str>>(lines: &[S]) -> String {
    let meaningful = || {
        lines
            .iter()
            .map(|l| l.as_ref().trim())
            .filter(|l| !l.is_empty())
    };

    meaningful()
        .filter(|l| l.starts_with("ERROR:") || l.contains("Error") || l.contains("error"))
        .last()
        .or_else(|| meaningful().last())
        .unwrap_or("Unknown error")
        .to_string()
}
