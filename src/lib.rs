//! Daily playlist digest for a curated set of YouTube channels.
//!
//! Collects the videos uploaded on a target date by the channels of a
//! configured category into a playlist named `<category>_<YYYYMMDD>`,
//! skipping videos the playlist already contains. Re-running for the same
//! category and date targets the same playlist, so the playlist accumulates
//! across runs within a day. Intended to be invoked from cron; one
//! reconciliation pass per invocation, then exit.
//!
//! All dates are interpreted in UTC: what "today" means, the day window sent
//! to the API, and the date embedded in the playlist title. A video uploaded
//! at 23:30 local time may therefore land on the neighboring day's playlist.

pub mod cli;
pub mod config;
pub mod digest;
pub mod oauth;
pub mod platform;
pub mod reconcile;
pub mod youtube_api;

pub use platform::{Platform, PlaylistRef, Upload, UploadWindow};
pub use youtube_api::{ApiError, YouTubeClient};
