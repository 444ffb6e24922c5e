use crate::{
    cli::ChannelAction,
    config::{AppConfig, get_following_channels},
    error::{CliError, Result},
    output::print_media_item,
    player::Player,
    prompt,
    quality::Quality,
    select::{DisplaySet, build_playlist},
};
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::BTreeSet;
use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, error};
use twitch_extractor::{
    ExtractorError, MediaItem, MetadataProvider, ProxyConfig, Twitch, VideoFilter, VideoSort,
    create_client,
};

pub struct CommandExecutor {
    config: AppConfig,
    verbose: bool,
    provider: Arc<Twitch>,
}

impl CommandExecutor {
    pub fn new(config: AppConfig, verbose: bool, proxy: Option<ProxyConfig>) -> Self {
        let client = create_client(proxy);
        Self {
            config,
            verbose,
            provider: Arc::new(Twitch::new(client, None, None)),
        }
    }

    /// The `c` subcommand.
    pub async fn channel(
        &self,
        channels_ids: Vec<String>,
        action: ChannelAction,
        quality: Option<Quality>,
        max_list_length: Option<usize>,
        filter: VideoFilter,
        sort: VideoSort,
    ) -> Result<()> {
        if action.stream {
            self.channel_streams(channels_ids, quality).await
        } else {
            let page_size =
                max_list_length.unwrap_or(self.config.playlist_fetching.max_videos_count);
            self.channel_videos(channels_ids, quality, page_size, filter, sort)
                .await
        }
    }

    async fn channel_streams(
        &self,
        channels_ids: Vec<String>,
        quality: Option<Quality>,
    ) -> Result<()> {
        let pb = batch_progress_bar(channels_ids.len(), "Fetching streams data...");
        let provider = Arc::clone(&self.provider);
        let results = fan_out(channels_ids, Some(&pb), move |id| {
            let provider = Arc::clone(&provider);
            async move { provider.fetch_stream(&id).await }
        })
        .await;
        pb.finish_and_clear();

        let mut items = Vec::new();
        for (channel_id, result) in results {
            match result {
                Ok(Some(item)) => items.push(item),
                Ok(None) => {
                    eprintln!("{} ({channel_id}) is {}.", "Error:".red(), "offline".bold());
                }
                Err(e) => {
                    eprintln!("{} ({channel_id}): {e}", "Error:".red());
                }
            }
        }

        if items.is_empty() {
            println!("Nothing to play.");
            return Ok(());
        }

        self.play_media(items, quality).await
    }

    async fn channel_videos(
        &self,
        channels_ids: Vec<String>,
        quality: Option<Quality>,
        page_size: usize,
        filter: VideoFilter,
        sort: VideoSort,
    ) -> Result<()> {
        let pb = batch_progress_bar(channels_ids.len(), "Fetching videos lists...");
        let provider = Arc::clone(&self.provider);
        let results = fan_out(channels_ids, Some(&pb), move |id| {
            let provider = Arc::clone(&provider);
            async move {
                provider
                    .fetch_channel_videos(&id, page_size, 1, filter, sort)
                    .await
            }
        })
        .await;
        pb.finish_and_clear();

        let mut to_watch = Vec::new();
        for (channel_id, result) in results {
            let entries = match result {
                Ok(entries) => entries,
                Err(e) => {
                    eprintln!("{} ({channel_id}): {e}", "Error:".red());
                    continue;
                }
            };
            if entries.is_empty() {
                eprintln!("{} ({channel_id}) has no videos.", "Error:".red());
                continue;
            }

            let picked = self
                .select_videos(&channel_id, entries, page_size, filter, sort)
                .await?;
            to_watch.extend(picked);
        }

        if to_watch.is_empty() {
            println!("Nothing to play.");
            return Ok(());
        }

        self.play_media(to_watch, quality).await
    }

    /// Display a channel's listing and prompt until the user settles on a
    /// selection, growing the listing when an `x[n]` token asks for more.
    async fn select_videos(
        &self,
        channel_id: &str,
        mut entries: Vec<MediaItem>,
        page_size: usize,
        filter: VideoFilter,
        sort: VideoSort,
    ) -> Result<Vec<MediaItem>> {
        let mut display = DisplaySet::new();
        let mut shown = 0;
        // Indices typed alongside an `x` token carry over to the final line.
        let mut pending: BTreeSet<usize> = BTreeSet::new();

        loop {
            for (i, item) in entries.iter().enumerate().skip(shown) {
                display.insert(item.playlist_index.unwrap_or(i + 1), item.title.as_str());
                print_media_item(item, self.verbose);
            }
            shown = entries.len();

            let mut selection = prompt::pick_media(&display, "videos")?;

            if let Some(extra) = selection.extra_request(page_size) {
                pending.extend(selection.chosen_indices);

                let pb = spinner("Fetching more videos...");
                let more = self
                    .provider
                    .fetch_channel_videos(channel_id, extra, shown + 1, filter, sort)
                    .await;
                pb.finish_and_clear();

                match more {
                    Ok(more) if !more.is_empty() => entries.extend(more),
                    Ok(_) => {
                        eprintln!("{} ({channel_id}) has no more videos.", "Error:".red());
                    }
                    Err(e) => {
                        eprintln!("{} ({channel_id}): {e}", "Error:".red());
                    }
                }
                continue;
            }

            selection.chosen_indices.extend(pending);
            return Ok(build_playlist(&entries, &selection));
        }
    }

    /// The `s` subcommand.
    pub async fn following(
        &self,
        online_only: bool,
        channels_file: Option<&Path>,
        quality: Option<Quality>,
    ) -> Result<()> {
        let channels = get_following_channels(channels_file)?;

        if channels.is_empty() {
            eprintln!(
                "{} Can't find any channel on your list! Add some channels to use this command.",
                "Error:".red()
            );
            return Ok(());
        }

        let pb = batch_progress_bar(channels.len(), "Checking for channels...");
        let provider = Arc::clone(&self.provider);
        let ids: Vec<String> = channels.iter().map(|c| c.id.clone()).collect();
        let results = fan_out(ids, Some(&pb), move |id| {
            let provider = Arc::clone(&provider);
            async move { provider.fetch_stream(&id).await }
        })
        .await;
        pb.finish_and_clear();

        let mut display = DisplaySet::new();
        let mut online = Vec::new();
        for (channel, (_, result)) in channels.iter().zip(results) {
            match result {
                Ok(Some(item)) => {
                    let index = online.len() + 1;
                    println!(
                        "{} ({}) is {}",
                        format!("[{index}]").green(),
                        channel.name,
                        "online".green().bold()
                    );
                    online.push(item);
                    display.insert(index, channel.name.clone());
                }
                Ok(None) => {
                    if !online_only {
                        println!(
                            "{} ({}) is {}",
                            "[-]".red(),
                            channel.name,
                            "offline".red().bold()
                        );
                    }
                }
                Err(e) => {
                    eprintln!("{} ({}): {e}", "Error:".red(), channel.name);
                }
            }
        }

        if online.is_empty() {
            println!("Nothing to play.");
            return Ok(());
        }

        let selection = prompt::pick_media(&display, "streams")?;
        let picked = build_playlist(&online, &selection);

        if picked.is_empty() {
            println!("Nothing to play.");
            return Ok(());
        }

        self.play_media(picked, quality).await
    }

    /// The `v` subcommand.
    pub async fn videos(&self, videos_ids: Vec<String>, quality: Option<Quality>) -> Result<()> {
        let pb = batch_progress_bar(videos_ids.len(), "Fetching videos data...");
        let provider = Arc::clone(&self.provider);
        let results = fan_out(videos_ids, Some(&pb), move |id| {
            let provider = Arc::clone(&provider);
            async move { provider.fetch_video(&id).await }
        })
        .await;
        pb.finish_and_clear();

        let mut items = Vec::new();
        for (video_id, result) in results {
            match result {
                Ok(item) => items.push(item),
                Err(e) => {
                    eprintln!("{} ({video_id}): {e}", "Error:".red());
                }
            }
        }

        if items.is_empty() {
            // All requested videos failed to resolve.
            println!("Nothing to play.");
            return Ok(());
        }

        self.play_media(items, quality).await
    }

    /// Resolve one format per item and hand the playlist to the player.
    async fn play_media(&self, items: Vec<MediaItem>, quality: Option<Quality>) -> Result<()> {
        let mut player = Player::new();

        for item in &items {
            print_media_item(item, self.verbose);

            if item.formats.is_empty() {
                eprintln!(
                    "{} ({}) has no playable formats, skipping.",
                    "Error:".red(),
                    item.id
                );
                continue;
            }

            let format = prompt::pick_format(&item.formats, quality)?;
            debug!("picked format {} for {}", format.format_id, item.id);
            player.append(&format.url, &item.title);
        }

        if player.is_empty() {
            println!("Nothing to play.");
            return Ok(());
        }

        let status = player.play().await?;
        if status.success() {
            Ok(())
        } else {
            Err(CliError::player(format!("mpv exited with {status}")))
        }
    }
}

/// One task per id, all spawned immediately, merged in spawn order after
/// every task has finished. Each task owns its result slot (its return
/// value); there is no shared accumulator. Every id keeps its slot in the
/// merged output: a task that panics or is cancelled yields an error in
/// that slot, never a missing entry. No retry, timeout, or cancellation:
/// a hung fetch hangs the whole batch.
pub async fn fan_out<T, F, Fut>(
    ids: Vec<String>,
    progress: Option<&ProgressBar>,
    make: F,
) -> Vec<(String, Result<T>)>
where
    F: Fn(String) -> Fut,
    Fut: Future<Output = std::result::Result<T, ExtractorError>> + Send + 'static,
    T: Send + 'static,
{
    let handles: Vec<(String, JoinHandle<std::result::Result<T, ExtractorError>>)> = ids
        .into_iter()
        .map(|id| {
            let fut = make(id.clone());
            (id, tokio::spawn(fut))
        })
        .collect();

    let mut results = Vec::with_capacity(handles.len());
    for (id, handle) in handles {
        let result = match handle.await {
            Ok(value) => value.map_err(CliError::from),
            Err(e) => {
                error!("fetch task for {id} failed: {e}");
                Err(CliError::Task(e.to_string()))
            }
        };
        results.push((id, result));
        if let Some(pb) = progress {
            pb.inc(1);
        }
    }
    results
}

fn batch_progress_bar(len: usize, message: &str) -> ProgressBar {
    let pb = ProgressBar::new(len as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{msg} {bar:30.cyan/blue} {pos}/{len}")
            .unwrap(),
    );
    pb.set_message(message.to_string());
    pb
}

fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.enable_steady_tick(Duration::from_millis(500));
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .unwrap(),
    );
    pb.set_message(message.to_string());
    pb
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use twitch_extractor::{ExtractorError, Format};

    struct MockProvider;

    fn item(id: &str) -> MediaItem {
        MediaItem {
            id: id.to_string(),
            title: format!("stream {id}"),
            timestamp: 0,
            duration: None,
            view_count: Some(1),
            uploader: None,
            webpage_url: format!("https://www.twitch.tv/{id}"),
            formats: vec![Format {
                format_id: "Source".to_string(),
                url: format!("https://usher.example/{id}.m3u8"),
            }],
            playlist_index: None,
        }
    }

    #[async_trait]
    impl MetadataProvider for MockProvider {
        async fn fetch_stream(&self, channel: &str) -> std::result::Result<Option<MediaItem>, ExtractorError> {
            // "b" is offline; everything else is live.
            if channel == "b" {
                Ok(None)
            } else {
                Ok(Some(item(channel)))
            }
        }

        async fn fetch_video(&self, video_id: &str) -> std::result::Result<MediaItem, ExtractorError> {
            Err(ExtractorError::VideoNotFound(video_id.to_string()))
        }

        async fn fetch_channel_videos(
            &self,
            _channel: &str,
            _count: usize,
            _start_index: usize,
            _filter: VideoFilter,
            _sort: VideoSort,
        ) -> std::result::Result<Vec<MediaItem>, ExtractorError> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn test_fan_out_excludes_offline_channels() {
        let provider = Arc::new(MockProvider);
        let ids = vec!["a".to_string(), "b".to_string(), "c".to_string()];

        let results = fan_out(ids, None, move |id| {
            let provider = Arc::clone(&provider);
            async move { provider.fetch_stream(&id).await }
        })
        .await;

        let live: Vec<&str> = results
            .iter()
            .filter_map(|(_, r)| r.as_ref().ok().and_then(|o| o.as_ref()))
            .map(|item| item.id.as_str())
            .collect();
        assert_eq!(live, vec!["a", "c"]);

        // The offline channel is present in the merged results as an
        // explicit None, not silently dropped.
        assert!(matches!(&results[1], (id, Ok(None)) if id.as_str() == "b"));
    }

    #[tokio::test]
    async fn test_fan_out_keeps_a_slot_for_every_id() {
        let ids = vec!["a".to_string(), "b".to_string(), "c".to_string()];

        let results = fan_out(ids, None, |id| async move {
            if id == "b" {
                panic!("fetch blew up");
            }
            Ok(Some(id))
        })
        .await;

        // A crashed task must not shrink the batch or shift later
        // channels onto the wrong slot.
        assert_eq!(results.len(), 3);
        let returned: Vec<&str> = results.iter().map(|(id, _)| id.as_str()).collect();
        assert_eq!(returned, vec!["a", "b", "c"]);
        assert!(matches!(&results[1].1, Err(CliError::Task(_))));
        assert!(matches!(&results[2].1, Ok(Some(v)) if v == "c"));
    }

    #[tokio::test]
    async fn test_fan_out_preserves_request_order() {
        let provider = Arc::new(MockProvider);
        let ids: Vec<String> = (0..16).map(|i| format!("chan{i}")).collect();

        let results = fan_out(ids.clone(), None, move |id| {
            let provider = Arc::clone(&provider);
            async move { provider.fetch_stream(&id).await }
        })
        .await;

        let returned: Vec<&String> = results.iter().map(|(id, _)| id).collect();
        assert_eq!(returned, ids.iter().collect::<Vec<_>>());
    }
}
