use crate::quality::Quality;
use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use twitch_extractor::{VideoFilter, VideoSort};

#[derive(Parser, Debug)]
#[command(
    name = "cwitch",
    about = "Watch Twitch live streams and videos and track channels' activities.",
    version,
    author
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// An alternative config file
    #[arg(long, global = true, value_name = "FILE")]
    pub config_file: Option<PathBuf>,

    /// Proxy URL (supports http, https, socks5)
    #[arg(long, global = true)]
    pub proxy: Option<String>,

    /// Proxy username (if proxy requires authentication)
    #[arg(long, global = true)]
    pub proxy_username: Option<String>,

    /// Proxy password (if proxy requires authentication)
    #[arg(long, global = true)]
    pub proxy_password: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Play a live stream or search in the previous videos of a channel
    #[command(name = "c")]
    Channel {
        /// The channel ID
        #[arg(value_name = "CHANNEL-ID", required = true)]
        channels_ids: Vec<String>,

        #[command(flatten)]
        action: ChannelAction,

        /// Pick a quality instead of being prompted per item
        #[arg(
            short,
            long,
            value_enum,
            value_name = "format",
            num_args = 0..=1,
            default_missing_value = "best"
        )]
        quality: Option<Quality>,

        /// Override the configured videos-per-page count when listing
        #[arg(short = 'n', long, value_name = "N")]
        max_list_length: Option<usize>,

        /// Which archive entries to list
        #[arg(long, value_enum, default_value = "all")]
        filter: FilterArg,

        /// Listing order
        #[arg(long, value_enum, default_value = "time")]
        sort: SortArg,
    },

    /// List and view the status of the channels that you follow
    #[command(name = "s")]
    Following {
        /// Show only online channels
        #[arg(short, long)]
        online: bool,

        /// An alternative channels list file
        #[arg(long, value_name = "FILE")]
        channels_file: Option<PathBuf>,

        /// Pick a quality instead of being prompted per item
        #[arg(
            short,
            long,
            value_enum,
            value_name = "format",
            num_args = 0..=1,
            default_missing_value = "best"
        )]
        quality: Option<Quality>,
    },

    /// Watch one or more videos by ID, opened as a playlist
    #[command(name = "v")]
    Videos {
        /// One or more video IDs
        #[arg(value_name = "VIDEO-ID", required = true)]
        videos_ids: Vec<String>,

        /// Pick a quality instead of being prompted per item
        #[arg(
            short,
            long,
            value_enum,
            value_name = "format",
            num_args = 0..=1,
            default_missing_value = "best"
        )]
        quality: Option<Quality>,
    },

    /// Generate shell completions
    Completions {
        /// The shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

/// What to do with a channel; exactly one must be picked.
#[derive(ClapArgs, Debug)]
#[group(required = true, multiple = false)]
pub struct ChannelAction {
    /// Play the live stream if there is one
    #[arg(short, long)]
    pub stream: bool,

    /// List the channel's videos
    #[arg(short, long)]
    pub list_videos: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum FilterArg {
    All,
    Archive,
    Highlight,
    Upload,
}

impl From<FilterArg> for VideoFilter {
    fn from(value: FilterArg) -> Self {
        match value {
            FilterArg::All => VideoFilter::All,
            FilterArg::Archive => VideoFilter::Archive,
            FilterArg::Highlight => VideoFilter::Highlight,
            FilterArg::Upload => VideoFilter::Upload,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum SortArg {
    Time,
    Views,
}

impl From<SortArg> for VideoSort {
    fn from(value: SortArg) -> Self {
        match value {
            SortArg::Time => VideoSort::Time,
            SortArg::Views => VideoSort::Views,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_channel_requires_an_action() {
        assert!(Cli::try_parse_from(["cwitch", "c", "somechannel"]).is_err());
        assert!(Cli::try_parse_from(["cwitch", "c", "somechannel", "-s"]).is_ok());
        assert!(Cli::try_parse_from(["cwitch", "c", "somechannel", "-s", "-l"]).is_err());
    }

    #[test]
    fn test_bare_quality_flag_defaults_to_best() {
        let cli = Cli::try_parse_from(["cwitch", "v", "123", "-q"]).unwrap();
        match cli.command {
            Command::Videos { quality, .. } => assert_eq!(quality, Some(Quality::Best)),
            _ => panic!("expected videos command"),
        }
    }

    #[test]
    fn test_quality_flag_with_value() {
        let cli = Cli::try_parse_from(["cwitch", "v", "123", "-q", "audio"]).unwrap();
        match cli.command {
            Command::Videos { quality, .. } => assert_eq!(quality, Some(Quality::Audio)),
            _ => panic!("expected videos command"),
        }
    }

    #[test]
    fn test_multiple_ids() {
        let cli = Cli::try_parse_from(["cwitch", "v", "123", "456"]).unwrap();
        match cli.command {
            Command::Videos { videos_ids, .. } => assert_eq!(videos_ids, vec!["123", "456"]),
            _ => panic!("expected videos command"),
        }
    }
}
