//! Playlist enumeration and best-effort sequential download

use std::path::PathBuf;

use serde::Deserialize;
use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::tools::Tool;

/// Check a 1-based playlist range.
pub fn validate_range(start: usize, end: Option<usize>) -> Result<()> {
    if start == 0 {
        return Err(Error::invalid("--start is 1-based and must be at least 1"));
    }
    if let Some(end) = end {
        if start > end {
            return Err(Error::invalid(format!(
                "--start ({start}) must not be greater than --end ({end})"
            )));
        }
    }
    Ok(())
}

/// `yt-dlp --flat-playlist --dump-single-json` output, reduced to what is used.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlaylistInfo {
    #[serde(rename = "_type")]
    pub kind: Option<String>,
    pub id: Option<String>,
    pub title: Option<String>,
    pub webpage_url: Option<String>,
    #[serde(default)]
    pub entries: Vec<Option<PlaylistEntry>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlaylistEntry {
    pub id: Option<String>,
    pub title: Option<String>,
    pub url: Option<String>,
    pub webpage_url: Option<String>,
    pub playlist_index: Option<usize>,
}

/// One video to download, with its position in the playlist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaylistItem {
    pub index: usize,
    pub url: String,
    pub title: Option<String>,
}

impl PlaylistItem {
    pub fn label(&self) -> String {
        match &self.title {
            Some(title) => format!("#{} {}", self.index, title),
            None => format!("#{} {}", self.index, self.url),
        }
    }
}

impl PlaylistInfo {
    pub fn parse(json: &[u8]) -> Result<Self> {
        serde_json::from_slice(json).map_err(|source| Error::Parse {
            tool: Tool::YtDlp,
            source,
        })
    }

    pub fn is_playlist(&self) -> bool {
        self.kind.as_deref() == Some("playlist") || !self.entries.is_empty()
    }

    /// Items to download. `start` is the index of the first listed entry;
    /// entries that carry their own `playlist_index` keep it. A URL that is
    /// a single video yields one item pointing at `source_url`.
    pub fn items(&self, source_url: &str, start: usize) -> Vec<PlaylistItem> {
        if !self.is_playlist() {
            let url = self
                .webpage_url
                .clone()
                .unwrap_or_else(|| source_url.to_string());
            return vec![PlaylistItem {
                index: start,
                url,
                title: self.title.clone(),
            }];
        }

        self.entries
            .iter()
            .enumerate()
            .filter_map(|(offset, entry)| {
                let entry = entry.as_ref()?;
                let index = entry.playlist_index.unwrap_or(start + offset);
                let url = entry
                    .url
                    .clone()
                    .or_else(|| entry.webpage_url.clone())
                    .or_else(|| entry.id.clone());
                let Some(url) = url else {
                    warn!("Skipping playlist entry #{} without a URL", index);
                    return None;
                };
                Some(PlaylistItem {
                    index,
                    url,
                    title: entry.title.clone(),
                })
            })
            .collect()
    }
}

/// File name prefix for an item, zero-padded to the widest index.
pub fn index_prefix(index: usize, widest: usize) -> String {
    let width = widest.max(1).to_string().len().max(2);
    format!("{index:0width$}")
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedItem {
    pub item: PlaylistItem,
    pub error: String,
}

#[derive(Debug, Default)]
pub struct PlaylistReport {
    pub title: Option<String>,
    pub downloaded: Vec<(PlaylistItem, Vec<PathBuf>)>,
    pub failed: Vec<FailedItem>,
}

impl PlaylistReport {
    pub fn attempted(&self) -> usize {
        self.downloaded.len() + self.failed.len()
    }

    /// Error only when something was attempted and nothing succeeded.
    pub fn into_result(self) -> Result<Self> {
        if self.downloaded.is_empty() && !self.failed.is_empty() {
            return Err(Error::PlaylistFailed {
                failed: self.failed.len(),
            });
        }
        Ok(self)
    }
}

/// Download items one after another. A failed item is logged and recorded
/// and the next item still runs.
pub fn download_each<F>(items: &[PlaylistItem], mut fetch: F) -> PlaylistReport
where
    F: FnMut(&PlaylistItem) -> Result<Vec<PathBuf>>,
{
    let mut report = PlaylistReport::default();
    let total = items.len();

    for (n, item) in items.iter().enumerate() {
        info!("[{}/{}] Downloading {}", n + 1, total, item.label());
        match fetch(item) {
            Ok(files) => report.downloaded.push((item.clone(), files)),
            Err(e) => {
                warn!("[{}/{}] Failed {}: {}", n + 1, total, item.label(), e);
                report.failed.push(FailedItem {
                    item: item.clone(),
                    error: e.to_string(),
                });
            }
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;

    const LISTING: &str = r#"{
        "_type": "playlist",
        "id": "PL123",
        "title": "Road trip",
        "entries": [
            {"_type": "url", "id": "aaa", "title": "First", "url": "https://www.youtube.com/watch?v=aaa"},
            null,
            {"_type": "url", "id": "ccc", "title": "Third", "url": "https://www.youtube.com/watch?v=ccc", "playlist_index": 9},
            {"_type": "url", "id": "ddd", "webpage_url": "https://www.youtube.com/watch?v=ddd"}
        ]
    }"#;

    #[test]
    fn test_validate_range() {
        assert!(validate_range(1, None).is_ok());
        assert!(validate_range(3, Some(3)).is_ok());
        assert!(validate_range(2, Some(10)).is_ok());

        assert!(matches!(validate_range(5, Some(2)), Err(Error::InvalidArgument(_))));
        assert!(matches!(validate_range(0, None), Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn test_parse_listing_items() {
        let info = PlaylistInfo::parse(LISTING.as_bytes()).unwrap();
        assert!(info.is_playlist());
        assert_eq!(info.title.as_deref(), Some("Road trip"));

        let items = info.items("https://www.youtube.com/playlist?list=PL123", 4);
        assert_eq!(items.len(), 3);
        assert_eq!(items[0].index, 4);
        assert_eq!(items[0].url, "https://www.youtube.com/watch?v=aaa");
        assert_eq!(items[1].index, 9);
        assert_eq!(items[2].index, 7);
        assert_eq!(items[2].url, "https://www.youtube.com/watch?v=ddd");
        assert_eq!(items[2].title, None);
    }

    #[test]
    fn test_single_video_url() {
        let info = PlaylistInfo::parse(
            br#"{"_type": "video", "id": "zzz", "title": "Solo", "webpage_url": "https://youtu.be/zzz"}"#,
        )
        .unwrap();
        let items = info.items("https://youtu.be/zzz?t=3", 1);
        assert_eq!(
            items,
            vec![PlaylistItem {
                index: 1,
                url: "https://youtu.be/zzz".to_string(),
                title: Some("Solo".to_string()),
            }]
        );
    }

    #[test]
    fn test_parse_garbage() {
        let err = PlaylistInfo::parse(b"WARNING: not json").unwrap_err();
        assert!(matches!(err, Error::Parse { tool: Tool::YtDlp, .. }));
    }

    #[test]
    fn test_index_prefix() {
        assert_eq!(index_prefix(3, 9), "03");
        assert_eq!(index_prefix(42, 120), "042");
        assert_eq!(index_prefix(1, 1), "01");
    }

    fn item(index: usize) -> PlaylistItem {
        PlaylistItem {
            index,
            url: format!("https://youtu.be/{index}"),
            title: None,
        }
    }

    #[test]
    fn test_failed_item_does_not_stop_the_rest() {
        let items: Vec<_> = (1..=4).map(item).collect();
        let mut seen = Vec::new();

        let report = download_each(&items, |it| {
            seen.push(it.index);
            if it.index == 2 {
                Err(Error::ToolFailed {
                    tool: Tool::YtDlp,
                    status: "exit code 1".to_string(),
                    message: "ERROR: Private video".to_string(),
                })
            } else {
                Ok(vec![PathBuf::from(format!("{:02} - v.mp4", it.index))])
            }
        });

        assert_eq!(seen, vec![1, 2, 3, 4]);
        assert_eq!(report.attempted(), 4);
        assert_eq!(report.downloaded.len(), 3);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].item.index, 2);
        assert!(report.failed[0].error.contains("Private video"));
        assert!(report.into_result().is_ok());
    }

    #[test]
    fn test_all_failed_is_an_error() {
        let items: Vec<_> = (1..=2).map(item).collect();
        let report = download_each(&items, |_| Err(Error::invalid("nope")));

        let err = report.into_result().unwrap_err();
        assert!(matches!(err, Error::PlaylistFailed { failed: 2 }));
    }

    #[test]
    fn test_empty_range_is_ok() {
        let report = download_each(&[], |_| Ok(Vec::new()));
        assert_eq!(report.attempted(), 0);
        assert!(report.into_result().is_ok());
    }
}
