use chrono::{DateTime, Utc};
use colored::*;
use twitch_extractor::MediaItem;

/// Print one media item in a readable way.
pub fn print_media_item(item: &MediaItem, verbose: bool) {
    let header = format!("---- {} ----", item.id).cyan();
    match item.playlist_index {
        Some(index) => println!("{header}{}", format!("[{index}]").green()),
        None => println!("{header}"),
    }

    println!("{} {}", "Title:".bold(), item.title);
    println!("{} {}", "Date:".bold(), format_date(item.timestamp));

    // Live streams carry no duration.
    if let Some(duration) = item.duration {
        println!("{} {}", "Duration:".bold(), format_duration(duration));
    }
    if let Some(view_count) = item.view_count {
        println!("{} {}", "View count:".bold(), view_count);
    }

    if verbose {
        if let Some(uploader) = &item.uploader {
            println!("{} {}", "Uploader:".bold(), uploader);
        }
        println!("{} {}", "Webpage URL:".bold(), item.webpage_url);
        let formats: Vec<(&str, &str)> = item
            .formats
            .iter()
            .map(|f| (f.format_id.as_str(), f.url.as_str()))
            .collect();
        println!("{} {:?}", "Stream URLs:".bold(), formats);
    }
}

fn format_date(timestamp: i64) -> String {
    DateTime::<Utc>::from_timestamp(timestamp, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| timestamp.to_string())
}

/// Seconds to `H:MM:SS` (or `M:SS` under an hour), the way players show it.
fn format_duration(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;
    if hours > 0 {
        format!("{hours}:{minutes:02}:{secs:02}")
    } else {
        format!("{minutes}:{secs:02}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(59), "0:59");
        assert_eq!(format_duration(90), "1:30");
        assert_eq!(format_duration(3723), "1:02:03");
    }

    #[test]
    fn test_format_date() {
        assert_eq!(format_date(1614628800), "2021-03-01 20:00:00");
    }
}
