//! Minimal YouTube Data API v3 client.
//!
//! Covers exactly the endpoints the digest needs: `search.list` to find a
//! channel's uploads inside a date window, `playlists.list`/`playlists.insert`
//! to resolve the target playlist, and `playlistItems.list`/
//! `playlistItems.insert` to read and extend its membership. All list
//! endpoints are drained through a lazy paginated stream so no page limit is
//! silently dropped.

pub mod client;
pub mod error;
pub mod playlist_items;
pub mod playlists;
pub mod search;
pub mod types;

pub use client::{RefreshableToken, YouTubeClient};
pub use error::ApiError;
pub use types::PageInfo;
