//! One digest run: list uploads, resolve the playlist, reconcile, insert,
//! and report.
//!
//! The pipeline is strictly linear and never revisits a stage. Per-channel
//! listing failures and per-video insertion failures are collected rather
//! than raised, so one bad channel or video cannot sink the rest of the run.

use crate::config::{Category, PlaylistSettings};
use crate::platform::{Platform, PlaylistRef, PrivacyStatus, Upload, UploadWindow};
use crate::reconcile::reconcile;
use crate::youtube_api::error::ApiError;
use jiff::civil::Date;
use std::collections::HashSet;
use std::fmt;

/// What a completed run did, for the end-of-run summary.
///
/// A report with a non-empty `failures` list still counts as a completed
/// run; partial progress is the point of failure isolation.
#[derive(Debug)]
pub struct RunReport {
    pub category: String,
    pub date: Date,
    pub playlist_title: String,
    /// The resolved playlist; `None` when the run ended before resolving
    /// one (no candidates, or resolution itself failed).
    pub playlist: Option<PlaylistRef>,
    /// Candidate videos found across all channels, before deduplication.
    pub found: usize,
    /// Candidates dropped because they were already in the playlist or
    /// duplicated another candidate.
    pub skipped: usize,
    pub added: usize,
    pub failures: Vec<Failure>,
}

impl RunReport {
    fn empty(category: &Category, date: Date, title: String, failures: Vec<Failure>) -> Self {
        Self {
            category: category.name.clone(),
            date,
            playlist_title: title,
            playlist: None,
            found: 0,
            skipped: 0,
            added: 0,
            failures,
        }
    }

    pub fn print(&self) {
        println!();
        println!("Digest summary for {} on {}", self.category, self.date);
        println!("  playlist: {}", self.playlist_title);
        if let Some(playlist) = &self.playlist {
            println!("  url:      {}", playlist.url());
        }
        println!("  found:    {}", self.found);
        println!("  skipped:  {} (already in the playlist or duplicate)", self.skipped);
        println!("  added:    {}", self.added);
        if self.failures.is_empty() {
            println!("  failures: none");
        } else {
            println!("  failures: {}", self.failures.len());
            for failure in &self.failures {
                println!("    - {failure}");
            }
        }
    }
}

/// A recoverable failure recorded during the run.
#[derive(Debug)]
pub enum Failure {
    Listing {
        label: String,
        channel_id: String,
        error: ApiError,
    },
    Resolve {
        title: String,
        error: ApiError,
    },
    Membership {
        title: String,
        error: ApiError,
    },
    Insert {
        video_id: String,
        title: String,
        error: ApiError,
    },
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Failure::Listing {
                label,
                channel_id,
                error,
            } => write!(f, "listing {label} ({channel_id}): {error}"),
            Failure::Resolve { title, error } => write!(f, "resolving playlist {title}: {error}"),
            Failure::Membership { title, error } => {
                write!(f, "fetching members of {title}: {error}")
            }
            Failure::Insert {
                video_id,
                title,
                error,
            } => write!(f, "adding {title} ({video_id}): {error}"),
        }
    }
}

/// Runs the whole pipeline for one category and date.
pub async fn run<P: Platform>(
    platform: &P,
    category: &Category,
    date: Date,
    window: &UploadWindow,
    playlist_settings: &PlaylistSettings,
) -> RunReport {
    let title = category.playlist_title(date);
    let mut failures = Vec::new();

    let candidates = collect_candidates(platform, category, window, &mut failures).await;
    let found = candidates.len();
    if candidates.is_empty() {
        tracing::info!(category = %category.name, %date, "no uploads found, leaving playlists untouched");
        return RunReport::empty(category, date, title, failures);
    }

    let description = playlist_settings.description(&category.name, date);
    let resolved =
        match resolve_playlist(platform, &title, &description, playlist_settings.privacy).await {
            Ok(resolved) => resolved,
            Err(error) => {
                tracing::error!(%title, %error, "could not resolve target playlist");
                let mut report = RunReport::empty(category, date, title.clone(), failures);
                report.found = found;
                report.failures.push(Failure::Resolve { title, error });
                return report;
            }
        };

    // A playlist created moments ago is empty; only pre-existing ones need
    // their membership fetched.
    let already_present = if resolved.created {
        HashSet::new()
    } else {
        match platform.playlist_members(&resolved.playlist.id).await {
            Ok(members) => members,
            Err(error) => {
                // Without the membership set, inserting could double up
                // videos added by an earlier run; stop here instead.
                tracing::error!(%title, %error, "could not fetch playlist membership");
                let mut report = RunReport::empty(category, date, title.clone(), failures);
                report.found = found;
                report.playlist = Some(resolved.playlist);
                report.failures.push(Failure::Membership { title, error });
                return report;
            }
        }
    };

    let to_insert = reconcile(candidates, &already_present);
    let skipped = found - to_insert.len();
    let added = append_videos(platform, &resolved.playlist, &to_insert, &mut failures).await;

    RunReport {
        category: category.name.clone(),
        date,
        playlist_title: title,
        playlist: Some(resolved.playlist),
        found,
        skipped,
        added,
        failures,
    }
}

/// Lists uploads for every channel of the category, isolating per-channel
/// failures, and merges the results oldest-first.
async fn collect_candidates<P: Platform>(
    platform: &P,
    category: &Category,
    window: &UploadWindow,
    failures: &mut Vec<Failure>,
) -> Vec<Upload> {
    let mut candidates = Vec::new();
    for channel in &category.channels {
        match platform.list_uploads(&channel.channel_id, window).await {
            Ok(uploads) => {
                tracing::info!(channel = %channel.label, count = uploads.len(), "listed uploads");
                candidates.extend(uploads);
            }
            Err(error) => {
                tracing::warn!(
                    channel = %channel.label,
                    %error,
                    "listing failed, continuing with remaining channels"
                );
                failures.push(Failure::Listing {
                    label: channel.label.clone(),
                    channel_id: channel.channel_id.clone(),
                    error,
                });
            }
        }
    }
    // Upload time ascending across all channels; the stable sort keeps
    // per-channel order (and thus category channel order) for ties.
    candidates.sort_by_key(|upload| upload.published_at);
    candidates
}

pub(crate) struct ResolvedPlaylist {
    pub playlist: PlaylistRef,
    pub created: bool,
}

/// Finds the playlist with exactly `title`, creating it when absent.
///
/// Search-then-create is not atomic; two simultaneous runs for the same
/// category and date can both miss and both create. The platform offers no
/// stronger primitive, so this stays a documented limitation.
pub(crate) async fn resolve_playlist<P: Platform>(
    platform: &P,
    title: &str,
    description: &str,
    privacy: PrivacyStatus,
) -> Result<ResolvedPlaylist, ApiError> {
    if let Some(existing) = platform.find_playlist(title).await? {
        tracing::info!(%title, id = %existing.id, "reusing existing playlist");
        return Ok(ResolvedPlaylist {
            playlist: existing,
            created: false,
        });
    }
    let created = platform.create_playlist(title, description, privacy).await?;
    tracing::info!(%title, id = %created.id, "created playlist");
    Ok(ResolvedPlaylist {
        playlist: created,
        created: true,
    })
}

/// Appends the reconciled videos in order, continuing past individual
/// failures. Once the quota is exhausted the remaining inserts are
/// abandoned; they would all fail the same way.
async fn append_videos<P: Platform>(
    platform: &P,
    playlist: &PlaylistRef,
    videos: &[Upload],
    failures: &mut Vec<Failure>,
) -> usize {
    let mut added = 0;
    for (index, video) in videos.iter().enumerate() {
        match platform.insert_video(&playlist.id, &video.video_id).await {
            Ok(()) => {
                tracing::info!(title = %video.title, channel = %video.channel_title, "added video");
                added += 1;
            }
            Err(error) => {
                tracing::warn!(video_id = %video.video_id, %error, "failed to add video");
                let quota_exhausted = error.is_quota();
                failures.push(Failure::Insert {
                    video_id: video.video_id.clone(),
                    title: video.title.clone(),
                    error,
                });
                if quota_exhausted {
                    let remaining = videos.len() - index - 1;
                    if remaining > 0 {
                        tracing::warn!(remaining, "quota exhausted, abandoning remaining insertions");
                    }
                    break;
                }
            }
        }
    }
    added
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ChannelRef;
    use http::Method;
    use jiff::Timestamp;
    use jiff::civil::date;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct FakeState {
        playlists: Vec<FakePlaylist>,
        created: usize,
    }

    struct FakePlaylist {
        id: String,
        title: String,
        members: Vec<String>,
    }

    /// In-memory stand-in for the five platform operations.
    #[derive(Default)]
    struct FakePlatform {
        uploads: HashMap<String, Vec<Upload>>,
        failing_channels: HashSet<String>,
        failing_inserts: HashSet<String>,
        quota_on_insert: HashSet<String>,
        membership_fetches: AtomicUsize,
        state: Mutex<FakeState>,
    }

    impl FakePlatform {
        fn with_uploads(uploads: &[(&str, &[Upload])]) -> Self {
            Self {
                uploads: uploads
                    .iter()
                    .map(|(channel, videos)| (channel.to_string(), videos.to_vec()))
                    .collect(),
                ..Self::default()
            }
        }

        fn seed_playlist(&self, id: &str, title: &str, members: &[&str]) {
            self.state.lock().unwrap().playlists.push(FakePlaylist {
                id: id.to_string(),
                title: title.to_string(),
                members: members.iter().map(|m| m.to_string()).collect(),
            });
        }

        fn members_of(&self, title: &str) -> Vec<String> {
            self.state
                .lock()
                .unwrap()
                .playlists
                .iter()
                .find(|p| p.title == title)
                .map(|p| p.members.clone())
                .unwrap_or_default()
        }

        fn playlist_count(&self) -> usize {
            self.state.lock().unwrap().playlists.len()
        }
    }

    fn backend_error() -> ApiError {
        ApiError::Status {
            method: Method::GET,
            endpoint: "https://example.invalid".to_string(),
            status: 500,
            message: "backend exploded".to_string(),
        }
    }

    impl Platform for FakePlatform {
        async fn list_uploads(
            &self,
            channel_id: &str,
            _window: &UploadWindow,
        ) -> Result<Vec<Upload>, ApiError> {
            if self.failing_channels.contains(channel_id) {
                return Err(backend_error());
            }
            Ok(self.uploads.get(channel_id).cloned().unwrap_or_default())
        }

        async fn find_playlist(&self, title: &str) -> Result<Option<PlaylistRef>, ApiError> {
            Ok(self
                .state
                .lock()
                .unwrap()
                .playlists
                .iter()
                .find(|p| p.title == title)
                .map(|p| PlaylistRef {
                    id: p.id.clone(),
                    title: p.title.clone(),
                }))
        }

        async fn create_playlist(
            &self,
            title: &str,
            _description: &str,
            _privacy: PrivacyStatus,
        ) -> Result<PlaylistRef, ApiError> {
            let mut state = self.state.lock().unwrap();
            state.created += 1;
            let id = format!("PL{:03}", state.created);
            state.playlists.push(FakePlaylist {
                id: id.clone(),
                title: title.to_string(),
                members: Vec::new(),
            });
            Ok(PlaylistRef {
                id,
                title: title.to_string(),
            })
        }

        async fn playlist_members(&self, playlist_id: &str) -> Result<HashSet<String>, ApiError> {
            self.membership_fetches.fetch_add(1, Ordering::SeqCst);
            Ok(self
                .state
                .lock()
                .unwrap()
                .playlists
                .iter()
                .find(|p| p.id == playlist_id)
                .map(|p| p.members.iter().cloned().collect())
                .unwrap_or_default())
        }

        async fn insert_video(&self, playlist_id: &str, video_id: &str) -> Result<(), ApiError> {
            if self.quota_on_insert.contains(video_id) {
                return Err(ApiError::QuotaExceeded {
                    message: "daily quota exhausted".to_string(),
                });
            }
            if self.failing_inserts.contains(video_id) {
                return Err(backend_error());
            }
            let mut state = self.state.lock().unwrap();
            let playlist = state
                .playlists
                .iter_mut()
                .find(|p| p.id == playlist_id)
                .expect("inserting into a playlist that exists");
            playlist.members.push(video_id.to_string());
            Ok(())
        }
    }

    fn upload(video_id: &str, second: i64) -> Upload {
        Upload {
            video_id: video_id.to_string(),
            title: format!("video {video_id}"),
            channel_title: "Test Channel".to_string(),
            published_at: Timestamp::from_second(second).unwrap(),
        }
    }

    fn category(channels: &[(&str, &str)]) -> Category {
        Category {
            name: "news".to_string(),
            channels: channels
                .iter()
                .map(|(label, id)| ChannelRef {
                    label: label.to_string(),
                    channel_id: id.to_string(),
                })
                .collect(),
            hours_back: None,
        }
    }

    fn window() -> UploadWindow {
        UploadWindow {
            published_after: Timestamp::from_second(0).unwrap(),
            published_before: Timestamp::from_second(86_400).unwrap(),
        }
    }

    async fn run_news(platform: &FakePlatform, channels: &[(&str, &str)]) -> RunReport {
        run(
            platform,
            &category(channels),
            date(2025, 9, 16),
            &window(),
            &PlaylistSettings::default(),
        )
        .await
    }

    #[tokio::test]
    async fn builds_playlist_oldest_first_across_channels() {
        let platform = FakePlatform::with_uploads(&[
            ("UC-a", &[upload("a2", 40), upload("a1", 10)]),
            ("UC-b", &[upload("b1", 20)]),
        ]);

        let report = run_news(&platform, &[("A", "UC-a"), ("B", "UC-b")]).await;

        assert_eq!(report.found, 3);
        assert_eq!(report.added, 3);
        assert_eq!(report.skipped, 0);
        assert!(report.failures.is_empty());
        assert_eq!(report.playlist_title, "news_20250916");
        assert_eq!(platform.members_of("news_20250916"), ["a1", "b1", "a2"]);
    }

    #[tokio::test]
    async fn midday_rerun_appends_only_the_new_video() {
        let platform = FakePlatform::with_uploads(&[(
            "UC-a",
            &[upload("v1", 10), upload("v2", 20), upload("v3", 30)],
        )]);
        platform.seed_playlist("PL-existing", "news_20250916", &["v1", "v2"]);

        let report = run_news(&platform, &[("A", "UC-a")]).await;

        assert_eq!(report.found, 3);
        assert_eq!(report.skipped, 2);
        assert_eq!(report.added, 1);
        assert_eq!(platform.playlist_count(), 1);
        assert_eq!(
            platform.members_of("news_20250916"),
            ["v1", "v2", "v3"]
        );
    }

    #[tokio::test]
    async fn resolve_is_idempotent_per_title() {
        let platform = FakePlatform::default();

        let first = resolve_playlist(&platform, "news_20250916", "", PrivacyStatus::Unlisted)
            .await
            .unwrap();
        let second = resolve_playlist(&platform, "news_20250916", "", PrivacyStatus::Unlisted)
            .await
            .unwrap();

        assert!(first.created);
        assert!(!second.created);
        assert_eq!(first.playlist.id, second.playlist.id);
        assert_eq!(platform.playlist_count(), 1);
    }

    #[tokio::test]
    async fn title_matching_is_case_sensitive() {
        let platform = FakePlatform::default();
        platform.seed_playlist("PL-upper", "News_20250916", &[]);

        let resolved = resolve_playlist(&platform, "news_20250916", "", PrivacyStatus::Unlisted)
            .await
            .unwrap();

        assert!(resolved.created);
        assert_eq!(platform.playlist_count(), 2);
    }

    #[tokio::test]
    async fn freshly_created_playlist_skips_membership_fetch() {
        let platform = FakePlatform::with_uploads(&[("UC-a", &[upload("v1", 10)])]);

        let report = run_news(&platform, &[("A", "UC-a")]).await;

        assert_eq!(report.added, 1);
        assert_eq!(platform.membership_fetches.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn one_failing_channel_does_not_block_the_others() {
        let mut platform = FakePlatform::with_uploads(&[("UC-b", &[upload("b1", 20)])]);
        platform.failing_channels.insert("UC-a".to_string());

        let report = run_news(&platform, &[("A", "UC-a"), ("B", "UC-b")]).await;

        assert_eq!(report.found, 1);
        assert_eq!(report.added, 1);
        assert_eq!(report.failures.len(), 1);
        assert!(matches!(
            &report.failures[0],
            Failure::Listing { label, .. } if label.as_str() == "A"
        ));
        assert_eq!(platform.members_of("news_20250916"), ["b1"]);
    }

    #[tokio::test]
    async fn one_failing_insert_does_not_block_the_rest() {
        let mut platform = FakePlatform::with_uploads(&[(
            "UC-a",
            &[upload("v1", 10), upload("v2", 20), upload("v3", 30)],
        )]);
        platform.failing_inserts.insert("v2".to_string());

        let report = run_news(&platform, &[("A", "UC-a")]).await;

        assert_eq!(report.added, 2);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(platform.members_of("news_20250916"), ["v1", "v3"]);
    }

    #[tokio::test]
    async fn quota_exhaustion_abandons_remaining_inserts() {
        let mut platform = FakePlatform::with_uploads(&[(
            "UC-a",
            &[upload("v1", 10), upload("v2", 20), upload("v3", 30)],
        )]);
        platform.quota_on_insert.insert("v2".to_string());

        let report = run_news(&platform, &[("A", "UC-a")]).await;

        assert_eq!(report.added, 1);
        assert_eq!(report.failures.len(), 1);
        // v3 was never attempted
        assert_eq!(platform.members_of("news_20250916"), ["v1"]);
    }

    #[tokio::test]
    async fn no_candidates_means_no_playlist() {
        let platform = FakePlatform::default();

        let report = run_news(&platform, &[("A", "UC-a")]).await;

        assert_eq!(report.found, 0);
        assert_eq!(report.added, 0);
        assert!(report.playlist.is_none());
        assert_eq!(platform.playlist_count(), 0);
    }

    #[tokio::test]
    async fn membership_failure_stops_before_inserting() {
        struct MembershipFails(FakePlatform);

        impl Platform for MembershipFails {
            async fn list_uploads(
                &self,
                channel_id: &str,
                window: &UploadWindow,
            ) -> Result<Vec<Upload>, ApiError> {
                self.0.list_uploads(channel_id, window).await
            }
            async fn find_playlist(&self, title: &str) -> Result<Option<PlaylistRef>, ApiError> {
                self.0.find_playlist(title).await
            }
            async fn create_playlist(
                &self,
                title: &str,
                description: &str,
                privacy: PrivacyStatus,
            ) -> Result<PlaylistRef, ApiError> {
                self.0.create_playlist(title, description, privacy).await
            }
            async fn playlist_members(&self, _: &str) -> Result<HashSet<String>, ApiError> {
                Err(backend_error())
            }
            async fn insert_video(&self, playlist_id: &str, video_id: &str) -> Result<(), ApiError> {
                self.0.insert_video(playlist_id, video_id).await
            }
        }

        let inner = FakePlatform::with_uploads(&[("UC-a", &[upload("v1", 10)])]);
        inner.seed_playlist("PL-existing", "news_20250916", &["v0"]);
        let platform = MembershipFails(inner);

        let report = run(
            &platform,
            &category(&[("A", "UC-a")]),
            date(2025, 9, 16),
            &window(),
            &PlaylistSettings::default(),
        )
        .await;

        assert_eq!(report.added, 0);
        assert!(matches!(&report.failures[0], Failure::Membership { .. }));
        // Nothing was inserted blind.
        assert_eq!(platform.0.members_of("news_20250916"), ["v0"]);
    }
}
