use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const APP_NAME: &str = "cwitch";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub playlist_fetching: PlaylistFetching,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaylistFetching {
    /// How many videos one channel-listing page fetches.
    pub max_videos_count: usize,
}

impl Default for PlaylistFetching {
    fn default() -> Self {
        Self {
            max_videos_count: 5,
        }
    }
}

impl AppConfig {
    /// Load configuration from an explicit file or the default location.
    /// A missing file (or missing keys) silently yields defaults.
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        match config_path {
            Some(path) => {
                if path.exists() {
                    let content = std::fs::read_to_string(path)
                        .context("Failed to read configuration file")?;
                    toml::from_str(&content).context("Failed to parse configuration file")
                } else {
                    Ok(Self::default())
                }
            }
            None => confy::load(APP_NAME, None).context("Failed to load configuration"),
        }
    }

    /// Get default configuration file path
    pub fn default_config_path() -> Option<PathBuf> {
        confy::get_configuration_file_path(APP_NAME, None).ok()
    }
}

/// One entry of the followed channels list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FollowedChannel {
    pub name: String,
    pub id: String,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct ChannelsFile {
    channels: Vec<ChannelEntry>,
}

#[derive(Debug, Deserialize)]
struct ChannelEntry {
    name: Option<String>,
    id: Option<String>,
}

/// Parse the followed channels list from an explicit file or the
/// `channels.toml` next to the config file. A missing file yields an empty
/// list; entries without an id are skipped, a missing name defaults to the
/// id.
pub fn get_following_channels(channels_path: Option<&Path>) -> Result<Vec<FollowedChannel>> {
    let path = match channels_path {
        Some(path) => path.to_path_buf(),
        None => match default_channels_path() {
            Some(path) => path,
            None => return Ok(Vec::new()),
        },
    };

    if !path.exists() {
        return Ok(Vec::new());
    }

    let content = std::fs::read_to_string(&path).context("Failed to read channels file")?;
    parse_channels(&content)
}

pub fn default_channels_path() -> Option<PathBuf> {
    AppConfig::default_config_path()
        .and_then(|p| p.parent().map(Path::to_path_buf))
        .map(|dir| dir.join("channels.toml"))
}

fn parse_channels(content: &str) -> Result<Vec<FollowedChannel>> {
    let file: ChannelsFile = toml::from_str(content).context("Failed to parse channels file")?;

    Ok(file
        .channels
        .into_iter()
        .filter_map(|entry| {
            let id = entry.id?;
            let name = entry.name.unwrap_or_else(|| id.clone());
            Some(FollowedChannel { name, id })
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert_eq!(config.playlist_fetching.max_videos_count, 5);
    }

    #[test]
    fn test_config_overrides() {
        let config: AppConfig = toml::from_str(
            r#"
            [playlist_fetching]
            max_videos_count = 12
            "#,
        )
        .unwrap();
        assert_eq!(config.playlist_fetching.max_videos_count, 12);
    }

    #[test]
    fn test_parse_channels() {
        let channels = parse_channels(
            r#"
            [[channels]]
            name = "Some Streamer"
            id = "somestreamer"

            [[channels]]
            id = "nameless"

            [[channels]]
            name = "no id, skipped"
            "#,
        )
        .unwrap();

        assert_eq!(
            channels,
            vec![
                FollowedChannel {
                    name: "Some Streamer".to_string(),
                    id: "somestreamer".to_string()
                },
                FollowedChannel {
                    name: "nameless".to_string(),
                    id: "nameless".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_missing_channels_file_is_empty_list() {
        let channels =
            get_following_channels(Some(Path::new("/nonexistent/channels.toml"))).unwrap();
        assert!(channels.is_empty());
    }
}
