//! Error type shared by every command

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::config::ConfigError;
use crate::tools::Tool;

/// Exit code for usage errors, matching clap's own.
pub const EXIT_USAGE: u8 = 2;

/// Exit code for tool and filesystem failures.
pub const EXIT_FAILURE: u8 = 1;

#[derive(Error, Debug)]
pub enum Error {
    /// Rejected before any external tool runs.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("{tool} not found. {hint}")]
    ToolNotFound { tool: Tool, hint: String },

    #[error("Failed to start {tool}: {source}")]
    Spawn {
        tool: Tool,
        #[source]
        source: io::Error,
    },

    /// The tool ran and reported failure; `message` is its own diagnostic.
    #[error("{tool} failed ({status}): {message}")]
    ToolFailed {
        tool: Tool,
        status: String,
        message: String,
    },

    #[error("Failed to parse {tool} output: {source}")]
    Parse {
        tool: Tool,
        #[source]
        source: serde_json::Error,
    },

    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("All {failed} playlist item(s) failed to download")]
    PlaylistFailed { failed: usize },
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Process exit code for this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::InvalidArgument(_) => EXIT_USAGE,
            _ => EXIT_FAILURE,
        }
    }
}
