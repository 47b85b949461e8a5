//! Video, audio and playlist downloads using yt-dlp

mod playlist;
mod ytdlp;

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::config::ToolSettings;
use crate::error::{Error, Result};
use crate::options::{AudioFormat, AudioQuality, VideoFormat, VideoQuality};
use crate::utils;

pub use playlist::{
    download_each, index_prefix, validate_range, FailedItem, PlaylistEntry, PlaylistInfo,
    PlaylistItem, PlaylistReport,
};
pub use ytdlp::{parse_progress, YtDlp, TITLE_TEMPLATE};

/// Audio-only playlist downloads use this format and tier.
pub const PLAYLIST_AUDIO: (AudioFormat, AudioQuality) = (AudioFormat::Mp3, AudioQuality::K192);

#[derive(Debug, Clone)]
pub struct VideoRequest {
    pub url: String,
    pub output_dir: PathBuf,
    pub quality: VideoQuality,
    pub format: VideoFormat,
    pub skip_cert_check: bool,
}

#[derive(Debug, Clone)]
pub struct AudioRequest {
    pub url: String,
    pub output_dir: PathBuf,
    pub format: AudioFormat,
    pub quality: AudioQuality,
    pub skip_cert_check: bool,
}

#[derive(Debug, Clone)]
pub struct PlaylistRequest {
    pub url: String,
    pub output_dir: PathBuf,
    pub quality: VideoQuality,
    pub format: VideoFormat,
    pub audio_only: bool,
    /// 1-based, inclusive.
    pub start: usize,
    /// 1-based, inclusive.
    pub end: Option<usize>,
    pub skip_cert_check: bool,
}

/// Reject anything that is not an http(s) URL.
pub fn validate_url(url: &str) -> Result<()> {
    let url = url.trim();
    let rest = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"));
    match rest {
        Some(host) if !host.is_empty() => Ok(()),
        _ => Err(Error::invalid(format!(
            "'{url}' is not a URL; it must start with http:// or https://"
        ))),
    }
}

fn title_template(dir: &Path) -> PathBuf {
    dir.join(TITLE_TEMPLATE)
}

pub fn download_video(tools: &ToolSettings, request: &VideoRequest) -> Result<Vec<PathBuf>> {
    validate_url(&request.url)?;
    let ytdlp = YtDlp::locate(tools)?;
    utils::ensure_dir(&request.output_dir)?;

    info!("Downloading video from: {}", request.url);
    let invocation = ytdlp.video(
        &request.url,
        &title_template(&request.output_dir),
        request.quality,
        request.format,
        request.skip_cert_check,
    );
    ytdlp.run(&invocation)
}

pub fn download_audio(tools: &ToolSettings, request: &AudioRequest) -> Result<Vec<PathBuf>> {
    validate_url(&request.url)?;
    let ytdlp = YtDlp::locate(tools)?;
    utils::ensure_dir(&request.output_dir)?;

    info!("Downloading audio from: {}", request.url);
    if request.format.is_lossless() {
        debug!(
            "{} is lossless, yt-dlp ignores the {} kbps tier",
            request.format.as_str(),
            request.quality.kbps()
        );
    }
    let invocation = ytdlp.audio(
        &request.url,
        &title_template(&request.output_dir),
        request.format,
        request.quality,
        request.skip_cert_check,
    );
    ytdlp.run(&invocation)
}

/// Enumerate the requested range, then download it item by item.
pub fn download_playlist(tools: &ToolSettings, request: &PlaylistRequest) -> Result<PlaylistReport> {
    validate_range(request.start, request.end)?;
    validate_url(&request.url)?;
    let ytdlp = YtDlp::locate(tools)?;
    utils::ensure_dir(&request.output_dir)?;

    info!("Fetching playlist from: {}", request.url);
    let listing = ytdlp.playlist_listing(
        &request.url,
        request.start,
        request.end,
        request.skip_cert_check,
    );
    let info = PlaylistInfo::parse(&ytdlp.capture(&listing)?)?;
    let items = info.items(&request.url, request.start);

    match &info.title {
        Some(title) => info!("Playlist '{}': {} item(s)", title, items.len()),
        None => info!("{} item(s) to download", items.len()),
    }

    let widest = items.iter().map(|item| item.index).max().unwrap_or(1);
    let mut report = download_each(&items, |item| {
        let name = format!("{} - {}", index_prefix(item.index, widest), TITLE_TEMPLATE);
        let template = request.output_dir.join(name);
        let invocation = if request.audio_only {
            let (format, quality) = PLAYLIST_AUDIO;
            ytdlp.audio(&item.url, &template, format, quality, request.skip_cert_check)
        } else {
            ytdlp.video(
                &item.url,
                &template,
                request.quality,
                request.format,
                request.skip_cert_check,
            )
        };
        ytdlp.run(&invocation)
    });
    report.title = info.title;

    report.into_result()
}
