//! The contract this tool has with the video platform.
//!
//! Everything the digest needs from YouTube fits in five operations, so the
//! orchestration code is written against [`Platform`] rather than the
//! concrete client. Tests substitute an in-memory implementation; production
//! uses [`crate::youtube_api::YouTubeClient`].

use crate::youtube_api::error::ApiError;
use jiff::Timestamp;
use std::collections::HashSet;

pub use crate::youtube_api::playlists::PrivacyStatus;

/// A video some channel uploaded, as observed through the platform's search
/// index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upload {
    /// The platform's opaque video identifier.
    pub video_id: String,
    pub title: String,
    /// Display name of the uploading channel.
    pub channel_title: String,
    pub published_at: Timestamp,
}

/// Identifies a playlist owned by the authenticated user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaylistRef {
    /// The platform-assigned playlist identifier.
    pub id: String,
    pub title: String,
}

impl PlaylistRef {
    pub fn url(&self) -> String {
        format!("https://www.youtube.com/playlist?list={}", self.id)
    }
}

/// The time window a listing covers, in UTC.
///
/// Both bounds go to the API verbatim as `publishedAfter` /
/// `publishedBefore`, which YouTube treats inclusively.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadWindow {
    pub published_after: Timestamp,
    pub published_before: Timestamp,
}

/// The five platform operations the digest is built on.
///
/// Implementations perform I/O; all errors surface as [`ApiError`] so the
/// orchestration layer can decide which failures are isolated and which end
/// the run.
#[allow(async_fn_in_trait)]
pub trait Platform {
    /// Lists videos uploaded by `channel_id` within `window`.
    ///
    /// An empty result is not an error; a channel that uploaded nothing that
    /// day simply contributes nothing.
    async fn list_uploads(
        &self,
        channel_id: &str,
        window: &UploadWindow,
    ) -> Result<Vec<Upload>, ApiError>;

    /// Finds a playlist of the authenticated user whose title matches
    /// `title` exactly (case-sensitive).
    async fn find_playlist(&self, title: &str) -> Result<Option<PlaylistRef>, ApiError>;

    /// Creates a new, empty playlist owned by the authenticated user.
    async fn create_playlist(
        &self,
        title: &str,
        description: &str,
        privacy: PrivacyStatus,
    ) -> Result<PlaylistRef, ApiError>;

    /// Returns the identifiers of every video currently in the playlist,
    /// across all result pages.
    async fn playlist_members(&self, playlist_id: &str) -> Result<HashSet<String>, ApiError>;

    /// Appends a video to the end of the playlist.
    async fn insert_video(&self, playlist_id: &str, video_id: &str) -> Result<(), ApiError>;
}
