//! Pieces shared by the command binaries

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Args;
use tracing::error;

use crate::config::Settings;
use crate::error::{Error, EXIT_FAILURE};
use crate::logging;

/// Flags every command accepts.
#[derive(Args, Debug, Clone)]
pub struct CommonArgs {
    /// Settings file (default: <config dir>/mediagrab/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "info")]
    pub log_level: String,

    /// Only show warnings and errors
    #[arg(long, global = true)]
    pub quiet: bool,
}

/// Set up logging and settings, run one command and turn its outcome into
/// the process exit code.
pub fn run<F>(common: &CommonArgs, command: F) -> ExitCode
where
    F: FnOnce(&Settings) -> anyhow::Result<()>,
{
    logging::init(&common.log_level, common.quiet);

    let result = Settings::load(common.config.as_deref())
        .map_err(anyhow::Error::from)
        .and_then(|settings| command(&settings));

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::from(exit_code(&e))
        }
    }
}

/// Exit code for a failed command.
pub fn exit_code(err: &anyhow::Error) -> u8 {
    err.downcast_ref::<Error>()
        .map(Error::exit_code)
        .unwrap_or(EXIT_FAILURE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    use crate::error::EXIT_USAGE;

    #[test]
    fn test_exit_code_through_context() {
        let err = Err::<(), _>(Error::invalid("start after end"))
            .context("Playlist download failed")
            .unwrap_err();
        assert_eq!(exit_code(&err), EXIT_USAGE);
    }

    #[test]
    fn test_exit_code_for_foreign_error() {
        let err = anyhow::anyhow!("something else");
        assert_eq!(exit_code(&err), EXIT_FAILURE);
    }

    #[test]
    fn test_run_reports_bad_config() {
        let dir = tempfile::tempdir().unwrap();
        let common = CommonArgs {
            config: Some(dir.path().join("missing.toml")),
            log_level: "error".to_string(),
            quiet: true,
        };

        let mut called = false;
        let code = run(&common, |_| {
            called = true;
            Ok(())
        });

        assert!(!called);
        assert_eq!(format!("{code:?}"), format!("{:?}", ExitCode::from(EXIT_FAILURE)));
    }
}
