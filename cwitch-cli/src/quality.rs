//! Quality shortcuts over an ordered format list.

use clap::ValueEnum;
use twitch_extractor::Format;

/// Quality shortcut names, resolved against the provider's format ordering
/// (ascending quality, index 0 audio-only).
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Quality {
    /// The audio-only rendition (first format).
    Audio,
    /// The highest quality (last format).
    Best,
    /// The second-to-last format. Kept as-is from the original tool; this is
    /// not a true median.
    Middle,
    /// The lowest video quality (second format, index 0 being audio-only).
    Worst,
}

/// Resolve a quality shortcut to one format.
///
/// Shortcuts only apply when at least two formats exist; with fewer the
/// index arithmetic is unsound and the caller falls back to an explicit
/// pick. Returns `None` when no shortcut applies.
pub fn resolve_format<'a>(formats: &'a [Format], quality: Option<Quality>) -> Option<&'a Format> {
    let quality = quality?;
    if formats.len() < 2 {
        return None;
    }

    let index = match quality {
        Quality::Audio => 0,
        Quality::Best => formats.len() - 1,
        Quality::Middle => formats.len() - 2,
        Quality::Worst => 1,
    };

    formats.get(index)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn formats(ids: &[&str]) -> Vec<Format> {
        ids.iter()
            .map(|id| Format {
                format_id: id.to_string(),
                url: format!("https://example.com/{id}"),
            })
            .collect()
    }

    #[test]
    fn test_shortcut_table() {
        let formats = formats(&["Audio_Only", "160p30", "720p60", "Source"]);

        let pick = |q| resolve_format(&formats, Some(q)).unwrap().format_id.as_str();
        assert_eq!(pick(Quality::Audio), "Audio_Only");
        assert_eq!(pick(Quality::Worst), "160p30");
        assert_eq!(pick(Quality::Middle), "720p60");
        assert_eq!(pick(Quality::Best), "Source");
    }

    #[test]
    fn test_single_format_falls_back() {
        let formats = formats(&["Source"]);
        // Never index out of bounds; the caller prompts instead.
        assert!(resolve_format(&formats, Some(Quality::Best)).is_none());
        assert!(resolve_format(&formats, Some(Quality::Worst)).is_none());
    }

    #[test]
    fn test_no_quality_given() {
        let formats = formats(&["Audio_Only", "Source"]);
        assert!(resolve_format(&formats, None).is_none());
    }
}
