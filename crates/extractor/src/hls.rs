use m3u8_rs::{MasterPlaylist, Playlist};
use reqwest::Client;
use serde::Serialize;
use url::Url;

use crate::error::ExtractorError;
use crate::media::Format;

/// Fetch a usher playlist and convert it into the ordered format list the
/// front end expects: ascending quality, audio-only rendition first.
pub async fn fetch_formats<Q>(
    client: &Client,
    headers: Option<reqwest::header::HeaderMap>,
    params: Option<&Q>,
    m3u8_url: &str,
) -> Result<Vec<Format>, ExtractorError>
where
    Q: Serialize + Send + Sync + ?Sized,
{
    let base_url =
        Url::parse(m3u8_url).map_err(|e| ExtractorError::HlsPlaylistError(e.to_string()))?;

    let mut request = client.get(m3u8_url).headers(headers.unwrap_or_default());

    if let Some(params) = params {
        request = request.query(params);
    }

    let response = request.send().await?.bytes().await?;
    let playlist = m3u8_rs::parse_playlist_res(&response)
        .map_err(|e| ExtractorError::HlsPlaylistError(e.to_string()))?;

    let formats = match playlist {
        Playlist::MasterPlaylist(pl) => formats_from_master(pl, &base_url),
        Playlist::MediaPlaylist(_) => vec![Format {
            format_id: "Source".to_string(),
            url: m3u8_url.to_string(),
        }],
    };

    if formats.is_empty() {
        return Err(ExtractorError::NoStreamsFound);
    }

    Ok(formats)
}

/// Flatten a master playlist into formats ordered lowest to highest quality.
///
/// Twitch master playlists are served best-first; sort by declared bandwidth
/// ascending, then move the audio-only variant to index 0. This ordering is
/// what the quality shortcuts ("audio"/"worst"/"middle"/"best") index into.
pub fn formats_from_master(playlist: MasterPlaylist, base_url: &Url) -> Vec<Format> {
    let mut variants: Vec<(u64, Format)> = playlist
        .variants
        .into_iter()
        .filter_map(|variant| {
            let url = base_url.join(&variant.uri).ok()?;
            let video = variant.video.unwrap_or_default();
            let format_id = match video.as_str() {
                "chunked" => "Source".to_string(),
                "audio_only" => "Audio_Only".to_string(),
                "" => variant
                    .resolution
                    .map(|r| format!("{}x{}", r.width, r.height))
                    .unwrap_or_else(|| "default".to_string()),
                other => other.to_string(),
            };
            Some((
                variant.bandwidth,
                Format {
                    format_id,
                    url: url.to_string(),
                },
            ))
        })
        .collect();

    variants.sort_by_key(|(bandwidth, format)| {
        // audio-only sorts before everything regardless of bandwidth
        (format.format_id != "Audio_Only", *bandwidth)
    });

    variants.into_iter().map(|(_, format)| format).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const MASTER: &str = r#"#EXTM3U
#EXT-X-MEDIA:TYPE=VIDEO,GROUP-ID="chunked",NAME="1080p60 (source)",AUTOSELECT=YES,DEFAULT=YES
#EXT-X-STREAM-INF:BANDWIDTH=6000000,RESOLUTION=1920x1080,CODECS="avc1.64002A,mp4a.40.2",VIDEO="chunked",FRAME-RATE=60.000
https://usher.example/chunked/index.m3u8
#EXT-X-MEDIA:TYPE=VIDEO,GROUP-ID="720p60",NAME="720p60",AUTOSELECT=YES,DEFAULT=YES
#EXT-X-STREAM-INF:BANDWIDTH=3000000,RESOLUTION=1280x720,CODECS="avc1.4D401F,mp4a.40.2",VIDEO="720p60",FRAME-RATE=60.000
https://usher.example/720p60/index.m3u8
#EXT-X-MEDIA:TYPE=VIDEO,GROUP-ID="audio_only",NAME="Audio Only",AUTOSELECT=NO,DEFAULT=NO
#EXT-X-STREAM-INF:BANDWIDTH=160000,CODECS="mp4a.40.2",VIDEO="audio_only"
https://usher.example/audio_only/index.m3u8
#EXT-X-MEDIA:TYPE=VIDEO,GROUP-ID="160p30",NAME="160p30",AUTOSELECT=YES,DEFAULT=YES
#EXT-X-STREAM-INF:BANDWIDTH=230000,RESOLUTION=284x160,CODECS="avc1.4D400C,mp4a.40.2",VIDEO="160p30",FRAME-RATE=30.000
https://usher.example/160p30/index.m3u8
"#;

    #[test]
    fn test_master_playlist_ordering() {
        let playlist = match m3u8_rs::parse_playlist_res(MASTER.as_bytes()).unwrap() {
            Playlist::MasterPlaylist(pl) => pl,
            _ => panic!("expected master playlist"),
        };
        let base = Url::parse("https://usher.example/channel.m3u8").unwrap();

        let formats = formats_from_master(playlist, &base);
        let ids: Vec<&str> = formats.iter().map(|f| f.format_id.as_str()).collect();

        assert_eq!(ids, vec!["Audio_Only", "160p30", "720p60", "Source"]);
    }

    #[test]
    fn test_master_playlist_urls_resolved() {
        let playlist = match m3u8_rs::parse_playlist_res(MASTER.as_bytes()).unwrap() {
            Playlist::MasterPlaylist(pl) => pl,
            _ => panic!("expected master playlist"),
        };
        let base = Url::parse("https://usher.example/channel.m3u8").unwrap();

        let formats = formats_from_master(playlist, &base);
        assert!(
            formats
                .iter()
                .all(|f| f.url.starts_with("https://usher.example/"))
        );
    }
}
