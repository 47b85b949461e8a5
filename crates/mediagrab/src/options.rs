//! User-facing option values and their yt-dlp/FFmpeg spellings

use std::fmt;
use std::str::FromStr;

use clap::ValueEnum;

/// Video quality for downloads
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum VideoQuality {
    #[default]
    Best,
    #[value(name = "1080p")]
    P1080,
    #[value(name = "720p")]
    P720,
    #[value(name = "480p")]
    P480,
    #[value(name = "360p")]
    P360,
}

impl VideoQuality {
    pub const ALL: [VideoQuality; 5] = [
        VideoQuality::Best,
        VideoQuality::P1080,
        VideoQuality::P720,
        VideoQuality::P480,
        VideoQuality::P360,
    ];

    /// Height cap, `None` for best available.
    pub fn max_height(self) -> Option<u32> {
        match self {
            VideoQuality::Best => None,
            VideoQuality::P1080 => Some(1080),
            VideoQuality::P720 => Some(720),
            VideoQuality::P480 => Some(480),
            VideoQuality::P360 => Some(360),
        }
    }

    /// yt-dlp `-f` selector. Prefers MP4 video with M4A audio and falls back
    /// to the best combined stream under the same height cap.
    pub fn format_selector(self) -> String {
        match self.max_height() {
            None => "bestvideo[ext=mp4]+bestaudio[ext=m4a]/best[ext=mp4]/best".to_string(),
            Some(h) => format!(
                "bestvideo[height<={h}][ext=mp4]+bestaudio[ext=m4a]/best[height<={h}]"
            ),
        }
    }
}

/// Container for downloaded video
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum VideoFormat {
    #[default]
    Mp4,
    Webm,
    Mkv,
}

impl VideoFormat {
    pub const ALL: [VideoFormat; 3] = [VideoFormat::Mp4, VideoFormat::Webm, VideoFormat::Mkv];

    pub fn as_str(self) -> &'static str {
        match self {
            VideoFormat::Mp4 => "mp4",
            VideoFormat::Webm => "webm",
            VideoFormat::Mkv => "mkv",
        }
    }
}

/// Target format for audio extraction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum AudioFormat {
    #[default]
    Mp3,
    M4a,
    Wav,
    Flac,
    Opus,
}

impl AudioFormat {
    pub const ALL: [AudioFormat; 5] = [
        AudioFormat::Mp3,
        AudioFormat::M4a,
        AudioFormat::Wav,
        AudioFormat::Flac,
        AudioFormat::Opus,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            AudioFormat::Mp3 => "mp3",
            AudioFormat::M4a => "m4a",
            AudioFormat::Wav => "wav",
            AudioFormat::Flac => "flac",
            AudioFormat::Opus => "opus",
        }
    }

    pub fn is_lossless(self) -> bool {
        matches!(self, AudioFormat::Wav | AudioFormat::Flac)
    }
}

/// Audio bitrate tier in kbps
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum AudioQuality {
    #[value(name = "320")]
    K320,
    #[value(name = "256")]
    K256,
    #[default]
    #[value(name = "192")]
    K192,
    #[value(name = "128")]
    K128,
    #[value(name = "96")]
    K96,
}

impl AudioQuality {
    pub const ALL: [AudioQuality; 5] = [
        AudioQuality::K320,
        AudioQuality::K256,
        AudioQuality::K192,
        AudioQuality::K128,
        AudioQuality::K96,
    ];

    /// Highest tier offered.
    pub const MAX: AudioQuality = AudioQuality::K320;

    pub fn kbps(self) -> u32 {
        match self {
            AudioQuality::K320 => 320,
            AudioQuality::K256 => 256,
            AudioQuality::K192 => 192,
            AudioQuality::K128 => 128,
            AudioQuality::K96 => 96,
        }
    }

    /// Value for yt-dlp `--audio-quality`.
    pub fn ytdlp_value(self) -> String {
        format!("{}K", self.kbps())
    }
}

/// Container for `convert-video convert`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum ConvertFormat {
    #[default]
    Mp4,
    Webm,
    Mkv,
    Avi,
}

impl ConvertFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ConvertFormat::Mp4 => "mp4",
            ConvertFormat::Webm => "webm",
            ConvertFormat::Mkv => "mkv",
            ConvertFormat::Avi => "avi",
        }
    }
}

/// Output frame size, `WIDTHxHEIGHT`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    /// Argument for FFmpeg `-vf`.
    pub fn scale_filter(&self) -> String {
        format!("scale={}:{}", self.width, self.height)
    }
}

impl FromStr for Resolution {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || format!("'{s}' is not a resolution (expected WIDTHxHEIGHT, e.g. 1280x720)");

        let (w, h) = s.trim().split_once(['x', 'X']).ok_or_else(invalid)?;
        let width: u32 = w.parse().map_err(|_| invalid())?;
        let height: u32 = h.parse().map_err(|_| invalid())?;
        if width == 0 || height == 0 {
            return Err(format!("'{s}' has a zero dimension"));
        }

        Ok(Self { width, height })
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Bitrate in FFmpeg notation: `digits[.digits]` with an optional k/K/m/M suffix
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bitrate(String);

impl Bitrate {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for Bitrate {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let number = s.strip_suffix(['k', 'K', 'm', 'M']).unwrap_or(s);
        let (int, frac) = number.split_once('.').unwrap_or((number, "0"));

        let all_digits = |part: &str| !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit());
        if !all_digits(int) || !all_digits(frac) {
            return Err(format!("'{s}' is not a bitrate (e.g. 192k, 1.5M, 128000)"));
        }
        if int.bytes().chain(frac.bytes()).all(|b| b == b'0') {
            return Err(format!("'{s}' is a zero bitrate"));
        }

        Ok(Self(s.to_string()))
    }
}

impl fmt::Display for Bitrate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_selectors() {
        assert_eq!(
            VideoQuality::Best.format_selector(),
            "bestvideo[ext=mp4]+bestaudio[ext=m4a]/best[ext=mp4]/best"
        );
        assert_eq!(
            VideoQuality::P720.format_selector(),
            "bestvideo[height<=720][ext=mp4]+bestaudio[ext=m4a]/best[height<=720]"
        );
        for quality in VideoQuality::ALL.into_iter().skip(1) {
            let h = quality.max_height().unwrap();
            assert!(quality.format_selector().contains(&format!("[height<={h}]")));
        }
    }

    #[test]
    fn test_cli_names() {
        assert_eq!(VideoQuality::from_str("1080p", false), Ok(VideoQuality::P1080));
        assert_eq!(AudioQuality::from_str("96", false), Ok(AudioQuality::K96));
        assert_eq!(AudioFormat::from_str("opus", false), Ok(AudioFormat::Opus));
        assert_eq!(ConvertFormat::from_str("avi", false), Ok(ConvertFormat::Avi));
        assert!(VideoQuality::from_str("4k", false).is_err());
        assert!(AudioQuality::from_str("64", false).is_err());
    }

    #[test]
    fn test_audio_quality_tiers() {
        assert_eq!(AudioQuality::MAX.kbps(), 320);
        assert!(AudioQuality::ALL.iter().all(|q| q.kbps() <= AudioQuality::MAX.kbps()));
        assert_eq!(AudioQuality::default().ytdlp_value(), "192K");
    }

    #[test]
    fn test_lossless_formats() {
        let lossless: Vec<_> = AudioFormat::ALL.into_iter().filter(|f| f.is_lossless()).collect();
        assert_eq!(lossless, vec![AudioFormat::Wav, AudioFormat::Flac]);
    }

    #[test]
    fn test_resolution_parse() {
        let r: Resolution = "1920x1080".parse().unwrap();
        assert_eq!(r, Resolution { width: 1920, height: 1080 });
        assert_eq!(r.scale_filter(), "scale=1920:1080");
        assert_eq!("1280X720".parse::<Resolution>().unwrap().height, 720);

        assert!("1920".parse::<Resolution>().is_err());
        assert!("1920x".parse::<Resolution>().is_err());
        assert!("0x720".parse::<Resolution>().is_err());
        assert!("-1x720".parse::<Resolution>().is_err());
    }

    #[test]
    fn test_bitrate_parse() {
        assert_eq!("192k".parse::<Bitrate>().unwrap().as_str(), "192k");
        assert_eq!("2M".parse::<Bitrate>().unwrap().as_str(), "2M");
        assert_eq!("128000".parse::<Bitrate>().unwrap().as_str(), "128000");

        assert!("fast".parse::<Bitrate>().is_err());
        assert!("k".parse::<Bitrate>().is_err());
        assert_eq!("1.5M".parse::<Bitrate>().unwrap().as_str(), "1.5M");
        assert_eq!("0.5m".parse::<Bitrate>().unwrap().as_str(), "0.5m");
        assert!("0k".parse::<Bitrate>().is_err());
        assert!("0.0M".parse::<Bitrate>().is_err());
        assert!("1.M".parse::<Bitrate>().is_err());
        assert!(".5M".parse::<Bitrate>().is_err());
        assert!("1.2.3k".parse::<Bitrate>().is_err());
    }
}
