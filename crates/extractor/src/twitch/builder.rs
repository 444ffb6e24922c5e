use std::sync::LazyLock;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::ExtractorError;
use crate::extractor::{Extractor, MetadataProvider, VideoFilter, VideoSort};
use crate::hls;
use crate::media::{Format, MediaItem};
use crate::twitch::models::TwitchResponse;
use async_trait::async_trait;
use rand::Rng;
use regex::Regex;
use reqwest::Client;
use tracing::debug;

static LOGIN_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9_]{2,25}$").unwrap());

static VIDEO_ID_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^v?(\d+)$").unwrap());

/// Twitch metadata provider built on the public GQL persisted-query API and
/// the usher HLS endpoint.
pub struct Twitch {
    extractor: Extractor,
}

impl Twitch {
    const BASE_URL: &str = "https://www.twitch.tv";
    const GQL_API_URL: &str = "https://gql.twitch.tv/gql";
    const USHER_BASE_URL: &str = "https://usher.ttvnw.net";

    // Page size of the videos tower; the API caps a single request at 30.
    const VIDEOS_PAGE_LIMIT: usize = 30;

    pub fn new(client: Client, cookies: Option<String>, oauth_token: Option<String>) -> Self {
        let mut extractor = Extractor::new("Twitch", client);

        extractor.add_header(
            reqwest::header::ACCEPT_LANGUAGE.to_string(),
            "en-US,en;q=0.9",
        );
        extractor.add_header(
            reqwest::header::ACCEPT.to_string(),
            "application/vnd.twitchtv.v5+json",
        );
        extractor.add_header(reqwest::header::REFERER.to_string(), Self::BASE_URL);
        extractor.add_header("device-id", Self::get_device_id());
        extractor.add_header("Client-Id", "kimne78kx3ncx6brgo4mv6wki5h1ko");

        if let Some(token) = oauth_token {
            extractor.add_header(
                reqwest::header::AUTHORIZATION.to_string(),
                format!("OAuth {token}"),
            );
        }

        if let Some(cookies) = cookies {
            extractor.set_cookies_from_string(&cookies);
        }

        Self { extractor }
    }

    fn get_device_id() -> String {
        // random device id of 16 digits
        format!(
            "{}",
            rand::rng().random_range(1000000000000000i64..9999999999999999i64)
        )
    }

    fn validate_login<'a>(&self, channel: &'a str) -> Result<&'a str, ExtractorError> {
        if LOGIN_REGEX.is_match(channel) {
            Ok(channel)
        } else {
            Err(ExtractorError::ValidationError(format!(
                "invalid channel id: {channel}"
            )))
        }
    }

    fn validate_video_id<'a>(&self, video_id: &'a str) -> Result<&'a str, ExtractorError> {
        VIDEO_ID_REGEX
            .captures(video_id)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str())
            .ok_or_else(|| ExtractorError::ValidationError(format!("invalid video id: {video_id}")))
    }

    fn build_persisted_query_request(
        &self,
        operation_name: &str,
        sha256_hash: &str,
        variables: serde_json::Value,
    ) -> String {
        let query = format!(
            r#"
        {{
         "operationName": "{operation_name}",
            "extensions": {{
                "persistedQuery": {{
                "version": 1,
                "sha256Hash": "{sha256_hash}"
            }}
        }},
            "variables": {variables}
        }}
        "#,
            operation_name = operation_name,
            sha256_hash = sha256_hash,
            variables = serde_json::to_string(&variables).unwrap()
        );
        query.trim().to_string()
    }

    async fn post_gql<T: for<'de> serde::Deserialize<'de> + std::fmt::Debug>(
        &self,
        body: String,
    ) -> Result<Vec<T>, ExtractorError> {
        let response = self
            .extractor
            .post(Self::GQL_API_URL)
            .body(body)
            .send()
            .await?;
        let body = response.text().await?;
        debug!("body: {}", body);

        // Try to parse as array first, then as single object if that fails
        let responses: Vec<T> = match serde_json::from_str::<Vec<T>>(&body) {
            Ok(responses) => responses,
            Err(_) => {
                let single_response: T = serde_json::from_str(&body)?;
                vec![single_response]
            }
        };

        Ok(responses)
    }

    /// Request a playback access token (live or VOD) and return (token, sig).
    async fn get_playback_access_token(
        &self,
        login: &str,
        vod_id: Option<&str>,
    ) -> Result<(String, String), ExtractorError> {
        let query = self.build_persisted_query_request(
            "PlaybackAccessToken",
            "0828119ded1c13477966434e15800ff57ddacf13ba1911c129dc2200705b0712",
            serde_json::json!({
                "isLive": vod_id.is_none(),
                "login": login,
                "isVod": vod_id.is_some(),
                "vodID": vod_id.unwrap_or(""),
                "playerType": "site",
                "isClip": false,
                "clipID": ""
            }),
        );

        let response = self.post_gql::<serde_json::Value>(query).await?;
        let token_field = if vod_id.is_some() {
            "videoPlaybackAccessToken"
        } else {
            "streamPlaybackAccessToken"
        };

        let access_token = response
            .first()
            .and_then(|data| data.get("data").and_then(|data| data.get(token_field)))
            .ok_or_else(|| {
                ExtractorError::ValidationError(format!("Could not find {token_field}"))
            })?;

        let value = access_token
            .get("value")
            .and_then(|v| v.as_str())
            .ok_or_else(|| {
                ExtractorError::ValidationError("Could not find token value".to_string())
            })?;
        let signature = access_token
            .get("signature")
            .and_then(|v| v.as_str())
            .ok_or_else(|| {
                ExtractorError::ValidationError("Could not find signature".to_string())
            })?;

        Ok((value.to_string(), signature.to_string()))
    }

    async fn get_usher_formats(
        &self,
        m3u8_url: &str,
        token: &str,
        signature: &str,
    ) -> Result<Vec<Format>, ExtractorError> {
        let epoch_seconds = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs();
        let epoch_seconds_str = epoch_seconds.to_string();

        let headers = self.extractor.get_platform_headers();
        hls::fetch_formats(
            &self.extractor.client,
            Some(headers.clone()),
            Some(&[
                ("player", "twitchweb"),
                ("p", &epoch_seconds_str),
                ("allow_source", "true"),
                ("allow_audio_only", "true"),
                ("fast_bread", "true"),
                ("token", token),
                ("sig", signature),
            ]),
            m3u8_url,
        )
        .await
    }

    async fn get_live_formats(&self, login: &str) -> Result<Vec<Format>, ExtractorError> {
        let (token, signature) = self.get_playback_access_token(login, None).await?;
        let m3u8_url = format!("{}/api/channel/hls/{login}.m3u8", Self::USHER_BASE_URL);
        self.get_usher_formats(&m3u8_url, &token, &signature).await
    }

    async fn get_vod_formats(&self, vod_id: &str) -> Result<Vec<Format>, ExtractorError> {
        let (token, signature) = self.get_playback_access_token("", Some(vod_id)).await?;
        let m3u8_url = format!("{}/vod/{vod_id}.m3u8", Self::USHER_BASE_URL);
        self.get_usher_formats(&m3u8_url, &token, &signature).await
    }

    fn parse_timestamp(value: Option<&str>) -> i64 {
        value
            .and_then(|s| chrono::DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.timestamp())
            .unwrap_or(0)
    }
}

#[async_trait]
impl MetadataProvider for Twitch {
    async fn fetch_stream(&self, channel: &str) -> Result<Option<MediaItem>, ExtractorError> {
        let login = self.validate_login(channel)?;
        debug!("fetching stream for {}", login);

        let queries = [
            self.build_persisted_query_request(
                "ChannelShell",
                "c3ea5a669ec074a58df5c11ce3c27093fa38534c94286dc14b68a25d5adcbf55",
                serde_json::json!({
                    "login": login,
                    "lcpVideosEnabled": false,
                }),
            ),
            self.build_persisted_query_request(
                "StreamMetadata",
                "059c4653b788f5bdb2f5a2d2a24b0ddc3831a15079001a3d927556a96fb0517f",
                serde_json::json!({
                    "channelLogin": login,
                    "previewImageURL": "",
                }),
            ),
        ];
        let queries_string = format!("[{}]", queries.join(","));

        let response = self.post_gql::<TwitchResponse>(queries_string).await?;

        if response.len() < 2 {
            return Err(ExtractorError::ValidationError(
                "Invalid response from Twitch API".to_string(),
            ));
        }

        let channel_shell = response.first().unwrap();
        let stream_metadata = response.get(1).unwrap();

        let user_or_error = channel_shell
            .data
            .user_or_error
            .as_ref()
            .ok_or_else(|| ExtractorError::StreamerNotFound(login.to_string()))?;
        if user_or_error.typename != "User" {
            return Err(ExtractorError::StreamerNotFound(login.to_string()));
        }

        let user = stream_metadata
            .data
            .user
            .as_ref()
            .ok_or_else(|| ExtractorError::StreamerNotFound(login.to_string()))?;

        let stream = match user.stream.as_ref() {
            Some(stream) if stream.stream_type.as_deref() == Some("live") => stream,
            // Channel exists but nothing is being broadcast.
            _ => return Ok(None),
        };

        let title = user
            .last_broadcast
            .as_ref()
            .and_then(|b| b.title.clone())
            .unwrap_or_default();
        let uploader = user_or_error.display_name.clone();

        let formats = self.get_live_formats(login).await?;

        Ok(Some(MediaItem {
            id: stream.id.clone(),
            title,
            timestamp: Self::parse_timestamp(stream.created_at.as_deref()),
            duration: None,
            view_count: stream.viewers_count,
            uploader,
            webpage_url: format!("{}/{login}", Self::BASE_URL),
            formats,
            playlist_index: None,
        }))
    }

    async fn fetch_video(&self, video_id: &str) -> Result<MediaItem, ExtractorError> {
        let vod_id = self.validate_video_id(video_id)?;
        debug!("fetching video {}", vod_id);

        let query = self.build_persisted_query_request(
            "VideoMetadata",
            "226edb3e692509f727fd56821f5653c05740242c82b0388883e0c0e75dcbf687",
            serde_json::json!({
                "channelLogin": "",
                "videoID": vod_id,
            }),
        );

        let response = self.post_gql::<TwitchResponse>(query).await?;
        let video = response
            .first()
            .and_then(|r| r.data.video.as_ref())
            .ok_or_else(|| ExtractorError::VideoNotFound(video_id.to_string()))?;

        let formats = self.get_vod_formats(vod_id).await?;

        Ok(MediaItem {
            id: video.id.clone(),
            title: video.title.clone().unwrap_or_default(),
            timestamp: Self::parse_timestamp(video.published_at.as_deref()),
            duration: video.length_seconds,
            view_count: video.view_count,
            uploader: video
                .owner
                .as_ref()
                .and_then(|o| o.display_name.clone()),
            webpage_url: format!("{}/videos/{vod_id}", Self::BASE_URL),
            formats,
            playlist_index: None,
        })
    }

    async fn fetch_channel_videos(
        &self,
        channel: &str,
        count: usize,
        start_index: usize,
        filter: VideoFilter,
        sort: VideoSort,
    ) -> Result<Vec<MediaItem>, ExtractorError> {
        let login = self.validate_login(channel)?;
        debug!(
            "fetching {} videos for {} starting at {}",
            count, login, start_index
        );

        let skip = start_index.saturating_sub(1);
        let wanted = skip + count;

        let mut collected: Vec<MediaItem> = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let query = self.build_persisted_query_request(
                "FilterableVideoTower_Videos",
                "a937f1d22e269e39a03b509f65a7490f9fc247d7f83d6ac1421523e3b68042cb",
                serde_json::json!({
                    "limit": Self::VIDEOS_PAGE_LIMIT,
                    "channelOwnerLogin": login,
                    "broadcastType": filter.as_broadcast_type(),
                    "videoSort": sort.as_sort_order(),
                    "cursor": cursor.as_deref().unwrap_or(""),
                }),
            );

            let response = self.post_gql::<TwitchResponse>(query).await?;
            let videos = response
                .first()
                .and_then(|r| r.data.user.as_ref())
                .and_then(|u| u.videos.as_ref())
                .ok_or_else(|| ExtractorError::StreamerNotFound(login.to_string()))?;

            let mut last_cursor = None;
            for edge in &videos.edges {
                let node = &edge.node;
                collected.push(MediaItem {
                    id: node.id.clone(),
                    title: node.title.clone().unwrap_or_default(),
                    timestamp: Self::parse_timestamp(node.published_at.as_deref()),
                    duration: node.length_seconds,
                    view_count: node.view_count,
                    uploader: node.owner.as_ref().and_then(|o| o.display_name.clone()),
                    webpage_url: format!("{}/videos/{}", Self::BASE_URL, node.id),
                    formats: Vec::new(),
                    playlist_index: None,
                });
                if let Some(c) = &edge.cursor {
                    last_cursor = Some(c.clone());
                }
            }

            let has_next = videos
                .page_info
                .as_ref()
                .map(|p| p.has_next_page)
                .unwrap_or(false);

            if collected.len() >= wanted || !has_next || last_cursor.is_none() {
                break;
            }
            cursor = last_cursor;
        }

        // Keep only the requested window and fill in the playable formats.
        let window: Vec<MediaItem> = collected.into_iter().skip(skip).take(count).collect();

        let mut items = Vec::with_capacity(window.len());
        for (offset, mut item) in window.into_iter().enumerate() {
            item.formats = self.get_vod_formats(&item.id).await?;
            item.playlist_index = Some(start_index + offset);
            items.push(item);
        }

        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::default::default_client;

    #[test]
    fn test_validate_login() {
        let twitch = Twitch::new(default_client(), None, None);
        assert!(twitch.validate_login("some_channel").is_ok());
        assert!(twitch.validate_login("bad channel!").is_err());
        assert!(twitch.validate_login("").is_err());
    }

    #[test]
    fn test_validate_video_id() {
        let twitch = Twitch::new(default_client(), None, None);
        assert_eq!(twitch.validate_video_id("123456789").unwrap(), "123456789");
        assert_eq!(twitch.validate_video_id("v123456789").unwrap(), "123456789");
        assert!(twitch.validate_video_id("notanid").is_err());
    }

    #[test]
    fn test_parse_timestamp() {
        assert_eq!(
            Twitch::parse_timestamp(Some("2021-03-01T20:00:00Z")),
            1614628800
        );
        assert_eq!(Twitch::parse_timestamp(None), 0);
        assert_eq!(Twitch::parse_timestamp(Some("garbage")), 0);
    }
}
