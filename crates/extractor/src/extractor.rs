use crate::default::DEFAULT_UA;
use crate::error::ExtractorError;
use crate::media::MediaItem;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Method, RequestBuilder};
use rustc_hash::FxHashMap;
use std::str::FromStr;
use tracing::debug;

/// Base extractor holding the HTTP client, platform headers/params and a
/// per-instance cookie store. Cookies are automatically included in every
/// request built through [`Extractor::request`].
#[derive(Debug, Clone)]
pub struct Extractor {
    // name of the platform, e.g. "Twitch"
    pub platform_name: String,
    pub client: Client,
    platform_headers: HeaderMap,
    pub platform_params: FxHashMap<String, String>,
    pub cookies: FxHashMap<String, String>,
}

impl Extractor {
    pub fn new<S: Into<String>>(platform_name: S, client: Client) -> Self {
        let mut default_headers = HeaderMap::new();
        default_headers.insert(reqwest::header::USER_AGENT, DEFAULT_UA.parse().unwrap());
        default_headers.insert(
            reqwest::header::ACCEPT,
            "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"
                .parse()
                .unwrap(),
        );
        default_headers.insert(
            reqwest::header::ACCEPT_ENCODING,
            "gzip, deflate".parse().unwrap(),
        );

        Self {
            platform_name: platform_name.into(),
            client,
            platform_headers: default_headers,
            platform_params: FxHashMap::default(),
            cookies: FxHashMap::default(),
        }
    }

    pub fn add_header<K: Into<String>, V: Into<String>>(&mut self, key: K, value: V) {
        self.platform_headers.insert(
            HeaderName::from_str(&key.into()).unwrap(),
            HeaderValue::from_str(&value.into()).unwrap(),
        );
    }

    pub fn add_param<K: Into<String>, V: Into<String>>(&mut self, key: K, value: V) {
        self.platform_params.insert(key.into(), value.into());
    }

    /// Set cookies from a cookie string (format: "name1=value1; name2=value2").
    pub fn set_cookies_from_string(&mut self, cookie_string: &str) {
        for cookie in cookie_string.split(';') {
            let cookie = cookie.trim();
            if let Some((name, value)) = cookie.split_once('=') {
                self.cookies
                    .insert(name.trim().to_string(), value.trim().to_string());
            }
        }
    }

    fn build_cookie_header(&self) -> Option<String> {
        if self.cookies.is_empty() {
            return None;
        }

        let cookie_string = self
            .cookies
            .iter()
            .map(|(name, value)| format!("{name}={value}"))
            .collect::<Vec<_>>()
            .join("; ");

        Some(cookie_string)
    }

    pub fn get(&self, url: &str) -> RequestBuilder {
        self.request(Method::GET, url)
    }

    pub fn post(&self, url: &str) -> RequestBuilder {
        self.request(Method::POST, url)
    }

    /// Build a request with platform headers, query params and stored cookies
    /// pre-configured.
    pub fn request(&self, method: Method, url: &str) -> RequestBuilder {
        let mut builder = self
            .client
            .request(method, url)
            .headers(self.platform_headers.clone())
            .query(&self.platform_params);

        if let Some(header) = self.build_cookie_header()
            && let Ok(value) = HeaderValue::from_str(&header)
        {
            debug!("Adding cookies to request: {:?}", value);
            builder = builder.header(reqwest::header::COOKIE, value);
        }

        builder
    }

    pub fn get_platform_headers(&self) -> &HeaderMap {
        &self.platform_headers
    }
}

/// The provider seam between the front end and the platform.
///
/// Offline is a normal outcome of [`MetadataProvider::fetch_stream`], not an
/// error; a video id that does not resolve is an error.
#[async_trait]
pub trait MetadataProvider: Send + Sync {
    /// Fetch the active live stream of a channel, or `None` when the channel
    /// is offline.
    async fn fetch_stream(&self, channel: &str) -> Result<Option<MediaItem>, ExtractorError>;

    /// Fetch a single VOD by id.
    async fn fetch_video(&self, video_id: &str) -> Result<MediaItem, ExtractorError>;

    /// Fetch one page of a channel's archived videos, `playlist_index`
    /// assigned from `start_index` (1-based). Returns fewer than `count`
    /// items when the channel has no more videos.
    async fn fetch_channel_videos(
        &self,
        channel: &str,
        count: usize,
        start_index: usize,
        filter: VideoFilter,
        sort: VideoSort,
    ) -> Result<Vec<MediaItem>, ExtractorError>;
}

/// Which kind of archive entries a channel listing should include.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VideoFilter {
    #[default]
    All,
    Archive,
    Highlight,
    Upload,
}

impl VideoFilter {
    pub fn as_broadcast_type(&self) -> Option<&'static str> {
        match self {
            VideoFilter::All => None,
            VideoFilter::Archive => Some("ARCHIVE"),
            VideoFilter::Highlight => Some("HIGHLIGHT"),
            VideoFilter::Upload => Some("UPLOAD"),
        }
    }
}

/// Listing order of a channel's videos.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VideoSort {
    #[default]
    Time,
    Views,
}

impl VideoSort {
    pub fn as_sort_order(&self) -> &'static str {
        match self {
            VideoSort::Time => "TIME",
            VideoSort::Views => "VIEWS",
        }
    }
}
