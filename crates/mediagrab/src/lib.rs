//! mediagrab - download and convert media with yt-dlp and FFmpeg
//!
//! Each command maps its flags onto a request type, turns the request into an
//! [`tools::Invocation`] and hands it to the external tool. Building an
//! invocation never touches the network or the filesystem.

pub mod cli;
pub mod config;
pub mod convert;
pub mod download;
pub mod error;
pub mod logging;
pub mod options;
pub mod timecode;
pub mod tools;
pub mod utils;

pub use error::{Error, Result};
