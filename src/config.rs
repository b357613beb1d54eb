//! Static configuration: the category → channel registry, playlist
//! settings, and the date-window arithmetic derived from them.
//!
//! Loaded once at startup from a TOML file and passed around explicitly;
//! nothing here performs I/O after [`Config::load`].
//!
//! ```toml
//! default_category = "news"
//!
//! [playlist]
//! privacy = "unlisted"
//!
//! [channels.CNBC]
//! channel_id = "UCrp_UI8XtuYfpiqluWLD7Lw"
//!
//! [categories.news]
//! channels = ["CNBC"]
//! hours_back = 7
//! ```

use crate::platform::{PrivacyStatus, UploadWindow};
use jiff::civil::Date;
use jiff::tz::TimeZone;
use jiff::{SignedDuration, Timestamp};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read configuration file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parse configuration file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("unknown category: {0}")]
    UnknownCategory(String),

    #[error("category {0} has no usable channels")]
    EmptyCategory(String),

    #[error("invalid date {0:?}, expected YYYY-MM-DD")]
    InvalidDate(String),
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Category used when the command line does not name one.
    #[serde(default = "default_category")]
    pub default_category: String,

    /// OAuth client credentials, Google "installed application" format.
    #[serde(default = "default_credentials_file")]
    pub credentials_file: PathBuf,

    /// Where the user token is cached between runs.
    #[serde(default = "default_token_file")]
    pub token_file: PathBuf,

    #[serde(default)]
    pub playlist: PlaylistSettings,

    /// Channel label → channel entry. Labels are only meaningful locally;
    /// the platform sees the channel ids.
    #[serde(default)]
    pub channels: BTreeMap<String, ChannelEntry>,

    #[serde(default)]
    pub categories: BTreeMap<String, CategoryEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChannelEntry {
    pub channel_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CategoryEntry {
    /// Ordered channel labels; the order is kept through listing and acts
    /// as the tie-breaker for videos with equal upload times.
    #[serde(default)]
    pub channels: Vec<String>,
    /// Restrict listing to the last N hours instead of the full day.
    pub hours_back: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PlaylistSettings {
    pub privacy: PrivacyStatus,
    /// Template for the playlist description; `{category}` and `{date}`
    /// are substituted.
    pub description_template: String,
}

impl Default for PlaylistSettings {
    fn default() -> Self {
        Self {
            privacy: PrivacyStatus::Unlisted,
            description_template: "{category} videos uploaded on {date}".to_string(),
        }
    }
}

impl PlaylistSettings {
    pub fn description(&self, category: &str, date: Date) -> String {
        self.description_template
            .replace("{category}", category)
            .replace("{date}", &date.strftime("%Y-%m-%d").to_string())
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_owned(),
            source,
        })?;
        toml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_owned(),
            source,
        })
    }

    /// Resolves a category name into its ordered channel list.
    ///
    /// Labels the category references but the channel table does not define
    /// are logged and skipped; a category left with no channels at all is a
    /// configuration error.
    pub fn category(&self, name: &str) -> Result<Category, ConfigError> {
        let entry = self
            .categories
            .get(name)
            .ok_or_else(|| ConfigError::UnknownCategory(name.to_string()))?;

        let mut channels = Vec::with_capacity(entry.channels.len());
        for label in &entry.channels {
            match self.channels.get(label) {
                Some(channel) => channels.push(ChannelRef {
                    label: label.clone(),
                    channel_id: channel.channel_id.clone(),
                }),
                None => {
                    tracing::warn!(%label, "channel is not configured, skipping");
                }
            }
        }
        if channels.is_empty() {
            return Err(ConfigError::EmptyCategory(name.to_string()));
        }

        Ok(Category {
            name: name.to_string(),
            channels,
            hours_back: entry.hours_back,
        })
    }
}

/// A channel as referenced from a category: the local label plus the
/// platform id.
#[derive(Debug, Clone)]
pub struct ChannelRef {
    pub label: String,
    pub channel_id: String,
}

/// A category resolved against the channel registry.
#[derive(Debug, Clone)]
pub struct Category {
    pub name: String,
    pub channels: Vec<ChannelRef>,
    pub hours_back: Option<i64>,
}

impl Category {
    /// The playlist title for this category on `date`: `<category>_<YYYYMMDD>`.
    ///
    /// The title is the sole key for cross-run playlist reuse, so the format
    /// must stay stable.
    pub fn playlist_title(&self, date: Date) -> String {
        format!("{}_{}", self.name, date.strftime("%Y%m%d"))
    }

    /// The listing window for `date`, in UTC.
    ///
    /// Runs for today end at `now` (there is nothing to find beyond it);
    /// runs for past days cover through end of day. The window opens at
    /// midnight, or `hours_back` hours before the end when the category
    /// configures a recency override.
    pub fn upload_window(&self, date: Date, now: Timestamp) -> UploadWindow {
        let today = now.to_zoned(TimeZone::UTC).date();
        let published_before = if date == today {
            now
        } else {
            date.at(23, 59, 59, 999_999_999)
                .to_zoned(TimeZone::UTC)
                .expect("civil end of day exists in UTC")
                .timestamp()
        };
        let published_after = match self.hours_back {
            Some(hours) => published_before - SignedDuration::from_hours(hours),
            None => date
                .to_zoned(TimeZone::UTC)
                .expect("civil midnight exists in UTC")
                .timestamp(),
        };
        UploadWindow {
            published_after,
            published_before,
        }
    }
}

/// Parses a `YYYY-MM-DD` command-line date.
pub fn parse_date(raw: &str) -> Result<Date, ConfigError> {
    raw.parse()
        .map_err(|_| ConfigError::InvalidDate(raw.to_string()))
}

/// The current date in UTC, the tool's fixed time reference.
pub fn today_utc() -> Date {
    Timestamp::now().to_zoned(TimeZone::UTC).date()
}

fn default_category() -> String {
    "news".to_string()
}

fn default_credentials_file() -> PathBuf {
    PathBuf::from("credentials.json")
}

fn default_token_file() -> PathBuf {
    PathBuf::from("tokens.json")
}
