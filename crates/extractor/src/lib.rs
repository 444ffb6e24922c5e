//! Twitch metadata extraction.
//!
//! Resolves channel and video identifiers to playable metadata through the
//! Twitch GQL persisted-query API, with format URLs taken from the usher HLS
//! endpoint. The front end consumes this crate through the
//! [`MetadataProvider`] trait.

mod default;
pub mod error;
pub mod extractor;
pub mod hls;
pub mod media;
pub mod twitch;

pub use default::{ProxyConfig, create_client, default_client};
pub use error::ExtractorError;
pub use extractor::{MetadataProvider, VideoFilter, VideoSort};
pub use media::{Format, MediaItem};
pub use twitch::Twitch;
