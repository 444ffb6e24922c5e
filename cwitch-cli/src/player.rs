use crate::error::{CliError, Result};
use std::process::ExitStatus;
use tokio::process::Command;
use tracing::debug;

/// Ordered playlist handed to mpv for sequential playback.
///
/// Entries keep their titles; mpv receives them through per-file
/// `--force-media-title` option groups so the playlist shows titles instead
/// of raw usher URLs.
#[derive(Debug, Default)]
pub struct Player {
    entries: Vec<PlaylistEntry>,
}

#[derive(Debug, Clone)]
pub struct PlaylistEntry {
    pub url: String,
    pub title: String,
}

impl Player {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, url: impl Into<String>, title: impl Into<String>) {
        self.entries.push(PlaylistEntry {
            url: url.into(),
            title: title.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[PlaylistEntry] {
        &self.entries
    }

    /// Launch mpv on the playlist, starting from the first entry, and wait
    /// for it to shut down. The child's exit status is returned so the
    /// process exit can reflect the playback invocation.
    pub async fn play(self) -> Result<ExitStatus> {
        if self.entries.is_empty() {
            return Err(CliError::player("empty playlist"));
        }

        let mut command = Command::new("mpv");
        command.arg("--title=cwitch");
        for entry in &self.entries {
            command
                .arg("--{")
                .arg(format!("--force-media-title={}", entry.title))
                .arg(&entry.url)
                .arg("--}");
        }

        debug!("launching mpv with {} playlist entries", self.entries.len());

        let mut child = command.spawn().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                CliError::player("mpv was not found on PATH; install mpv to play media")
            } else {
                CliError::Io(e)
            }
        })?;

        let status = child.wait().await?;
        debug!("mpv exited with {}", status);
        Ok(status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_playlist_preserves_append_order() {
        let mut player = Player::new();
        player.append("https://example.com/a", "first");
        player.append("https://example.com/b", "second");

        let titles: Vec<&str> = player.entries().iter().map(|e| e.title.as_str()).collect();
        assert_eq!(titles, vec!["first", "second"]);
    }

    #[tokio::test]
    async fn test_empty_playlist_is_an_error() {
        assert!(Player::new().play().await.is_err());
    }
}
