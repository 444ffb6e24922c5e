use serde::{Deserialize, Serialize};

/// One playable quality/encoding variant of a media item.
///
/// The position of a `Format` inside [`MediaItem::formats`] is significant:
/// the list is ordered ascending from lowest to highest quality, with index 0
/// reserved for the audio-only rendition when one exists. Quality shortcuts
/// in the front end rely on this ordering, so the extractor establishes it
/// itself when converting an HLS master playlist (see [`crate::hls`]).
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Format {
    pub format_id: String,
    pub url: String,
}

/// Metadata for one live stream or VOD, as returned by the provider.
///
/// Immutable once returned; owned by the caller for the duration of one
/// command invocation. `duration` is `None` for live streams, `view_count`
/// is `None` when the platform does not report one, and `playlist_index` is
/// set only for entries of a channel video listing (1-based, continuing
/// across pagination).
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct MediaItem {
    pub id: String,
    pub title: String,
    /// Publication time as unix seconds.
    pub timestamp: i64,
    pub duration: Option<u64>,
    pub view_count: Option<u64>,
    pub uploader: Option<String>,
    pub webpage_url: String,
    pub formats: Vec<Format>,
    pub playlist_index: Option<usize>,
}
