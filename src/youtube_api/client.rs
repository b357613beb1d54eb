//! Authenticated client for the YouTube Data API v3.

use crate::oauth::OAuthBroker;
use crate::platform::{Platform, PlaylistRef, PrivacyStatus, Upload, UploadWindow};
use crate::youtube_api::error::ApiError;
use crate::youtube_api::playlist_items::{
    PlaylistItem, PlaylistItemInsertRequest, PlaylistItemInsertSnippet, PlaylistItemListResponse,
    ResourceId,
};
use crate::youtube_api::playlists::{
    Playlist, PlaylistInsertRequest, PlaylistInsertSnippet, PlaylistListResponse, PlaylistStatus,
};
use crate::youtube_api::search::SearchListResponse;
use crate::youtube_api::types::{Page, paged};
use http::Method;
use jiff::Timestamp;
use oauth2::TokenResponse;
use oauth2::basic::BasicTokenResponse;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tokio::sync::Mutex;
use tokio_stream::{Stream, StreamExt};
use tracing::instrument;

const SEARCH_ENDPOINT: &str = "https://www.googleapis.com/youtube/v3/search";
const PLAYLISTS_ENDPOINT: &str = "https://www.googleapis.com/youtube/v3/playlists";
const PLAYLIST_ITEMS_ENDPOINT: &str = "https://www.googleapis.com/youtube/v3/playlistItems";

/// Largest page size the list endpoints accept.
const PAGE_SIZE: &str = "50";

/// Cap on uploads fetched per channel per run. A curated channel uploading
/// more than this in one day is firmly outside this tool's use case.
const MAX_UPLOADS_PER_CHANNEL: usize = 50;

/// An OAuth2 token paired with the instant it stops being trustworthy.
///
/// The cutoff is the token's `expires_in` minus a five-minute buffer, so a
/// request started just before expiry does not race the clock.
#[derive(Debug)]
pub struct RefreshableToken {
    token: BasicTokenResponse,
    valid_until: SystemTime,
}

impl RefreshableToken {
    /// Wraps a token obtained just now, trusting its `expires_in`.
    pub fn fresh(token: BasicTokenResponse) -> Self {
        Self {
            valid_until: Self::expiry(&token),
            token,
        }
    }

    /// Wraps a token of unknown age as already expired, forcing a refresh
    /// before first use. This is the right constructor for tokens loaded
    /// from the cache file.
    pub fn stale(token: BasicTokenResponse) -> Self {
        Self {
            valid_until: SystemTime::UNIX_EPOCH,
            token,
        }
    }

    pub fn raw(&self) -> &BasicTokenResponse {
        &self.token
    }

    /// Exchanges the refresh token for a new access token.
    ///
    /// Returns `Ok(false)` when the platform no longer honors the refresh
    /// token (revoked, or absent entirely); the caller then needs a full
    /// interactive authorization.
    pub async fn refresh(&mut self, broker: &OAuthBroker) -> eyre::Result<bool> {
        match broker.refresh(&self.token).await? {
            Some(new_token) => {
                let previous = std::mem::replace(&mut self.token, new_token);
                // Google frequently omits the refresh token from refresh
                // responses; keep the one we already hold.
                if self.token.refresh_token().is_none() {
                    self.token
                        .set_refresh_token(previous.refresh_token().cloned());
                }
                self.valid_until = Self::expiry(&self.token);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn expiry(token: &BasicTokenResponse) -> SystemTime {
        let now = SystemTime::now();
        match token.expires_in() {
            Some(expires_in) => now + expires_in - Duration::from_secs(300),
            // no expires_in: assume the usual one-hour lifetime, minus buffer
            None => now + Duration::from_secs(3300),
        }
    }
}

/// Client for the YouTube Data API v3, scoped to what the digest needs.
///
/// Holds the OAuth2 token behind a mutex and refreshes it transparently
/// before any request once it passes its expiry cutoff.
#[derive(Debug, Clone)]
pub struct YouTubeClient {
    token: Arc<Mutex<RefreshableToken>>,
    broker: Arc<OAuthBroker>,
    http: reqwest::Client,
}

impl YouTubeClient {
    pub fn new(token: RefreshableToken, broker: OAuthBroker) -> Self {
        Self {
            token: Arc::new(Mutex::new(token)),
            broker: Arc::new(broker),
            http: reqwest::Client::new(),
        }
    }

    /// Returns a clone of the current token, e.g. for persisting to the
    /// cache file after a refresh.
    pub async fn token(&self) -> BasicTokenResponse {
        self.token.lock().await.raw().clone()
    }

    /// Cheap probe that the token works and carries the playlist scope.
    pub async fn validate_token(&self) -> Result<(), ApiError> {
        let query = [("part", "id"), ("mine", "true"), ("maxResults", "1")];
        self.request(Method::GET, PLAYLISTS_ENDPOINT, Some(&query), None::<&()>)
            .await?;
        Ok(())
    }

    /// Gets a guaranteed-fresh access token, refreshing first if the cached
    /// one has passed its cutoff.
    async fn fresh_access_token(&self) -> Result<String, ApiError> {
        let mut token = self.token.lock().await;
        if SystemTime::now() >= token.valid_until {
            tracing::debug!("access token past its cutoff, refreshing");
            match token.refresh(&self.broker).await {
                Ok(true) => tracing::debug!("access token refreshed"),
                Ok(false) => {
                    return Err(ApiError::Auth {
                        message: "expired access token could not be refreshed".to_string(),
                    });
                }
                Err(e) => {
                    return Err(ApiError::Auth {
                        message: format!("token refresh failed: {e:#}"),
                    });
                }
            }
        }
        Ok(token.raw().access_token().secret().clone())
    }

    /// Makes one authenticated request and maps non-success responses into
    /// the [`ApiError`] taxonomy.
    async fn request(
        &self,
        method: Method,
        endpoint: &str,
        query: Option<&[(&str, &str)]>,
        body: Option<&impl Serialize>,
    ) -> Result<reqwest::Response, ApiError> {
        let access_token = self.fresh_access_token().await?;

        let mut request = self
            .http
            .request(method.clone(), endpoint)
            .header("Authorization", format!("Bearer {access_token}"));
        if let Some(query) = query {
            request = request.query(query);
        }
        if let Some(body) = body {
            request = request
                .header("Content-Type", "application/json")
                .json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let text = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(ApiError::from_response(method, endpoint, status, &text));
        }

        Ok(response)
    }

    /// Streams videos uploaded by `channel_id` inside `window`, in the
    /// API's `order=date` ordering (newest first), across all pages.
    ///
    /// Search results whose `id` is not a video (which `type=video` should
    /// already rule out) are skipped rather than treated as errors.
    fn search_channel_uploads(
        &self,
        channel_id: &str,
        window: &UploadWindow,
    ) -> impl Stream<Item = Result<Upload, ApiError>> {
        let channel_id = channel_id.to_owned();
        let published_after = rfc3339(window.published_after);
        let published_before = rfc3339(window.published_before);
        paged(move |page_token| {
            let channel_id = channel_id.clone();
            let published_after = published_after.clone();
            let published_before = published_before.clone();
            async move {
                let mut query = vec![
                    ("part", "snippet"),
                    ("channelId", channel_id.as_str()),
                    ("type", "video"),
                    ("order", "date"),
                    ("publishedAfter", published_after.as_str()),
                    ("publishedBefore", published_before.as_str()),
                    ("maxResults", PAGE_SIZE),
                ];
                if let Some(token) = page_token.as_deref() {
                    query.push(("pageToken", token));
                }

                let response = self
                    .request(Method::GET, SEARCH_ENDPOINT, Some(&query), None::<&()>)
                    .await?;
                let page: SearchListResponse = response.json().await?;

                let items = page
                    .items
                    .into_iter()
                    .filter_map(|result| {
                        let video_id = result.id.video_id?;
                        Some(Upload {
                            video_id,
                            title: result.snippet.title,
                            channel_title: result.snippet.channel_title,
                            published_at: result.snippet.published_at,
                        })
                    })
                    .collect();
                Ok(Page {
                    items,
                    next_page_token: page.next_page_token,
                })
            }
        })
    }

    /// Streams all playlists owned by the authenticated user, across pages.
    fn list_my_playlists(&self) -> impl Stream<Item = Result<Playlist, ApiError>> + use<'_> {
        paged(move |page_token| async move {
            let mut query = vec![("part", "id,snippet"), ("mine", "true"), ("maxResults", PAGE_SIZE)];
            if let Some(token) = page_token.as_deref() {
                query.push(("pageToken", token));
            }

            let response = self
                .request(Method::GET, PLAYLISTS_ENDPOINT, Some(&query), None::<&()>)
                .await?;
            let page: PlaylistListResponse = response.json().await?;
            Ok(Page {
                items: page.items,
                next_page_token: page.next_page_token,
            })
        })
    }

    /// Streams every entry of a playlist, across pages.
    fn list_playlist_items(
        &self,
        playlist_id: &str,
    ) -> impl Stream<Item = Result<PlaylistItem, ApiError>> {
        let playlist_id = playlist_id.to_owned();
        paged(move |page_token| {
            let playlist_id = playlist_id.clone();
            async move {
                let mut query = vec![
                    ("part", "contentDetails"),
                    ("playlistId", playlist_id.as_str()),
                    ("maxResults", PAGE_SIZE),
                ];
                if let Some(token) = page_token.as_deref() {
                    query.push(("pageToken", token));
                }

                let response = self
                    .request(
                        Method::GET,
                        PLAYLIST_ITEMS_ENDPOINT,
                        Some(&query),
                        None::<&()>,
                    )
                    .await?;
                let page: PlaylistItemListResponse = response.json().await?;
                Ok(Page {
                    items: page.items,
                    next_page_token: page.next_page_token,
                })
            }
        })
    }
}

impl Platform for YouTubeClient {
    #[instrument(skip(self, window))]
    async fn list_uploads(
        &self,
        channel_id: &str,
        window: &UploadWindow,
    ) -> Result<Vec<Upload>, ApiError> {
        let stream = self
            .search_channel_uploads(channel_id, window)
            .take(MAX_UPLOADS_PER_CHANNEL);
        let mut stream = std::pin::pin!(stream);

        let mut uploads = Vec::new();
        while let Some(upload) = stream.next().await {
            uploads.push(upload?);
        }
        tracing::debug!(channel_id, count = uploads.len(), "listed channel uploads");
        Ok(uploads)
    }

    async fn find_playlist(&self, title: &str) -> Result<Option<PlaylistRef>, ApiError> {
        let stream = self.list_my_playlists();
        let mut stream = std::pin::pin!(stream);

        while let Some(playlist) = stream.next().await {
            let playlist = playlist?;
            // Exact, case-sensitive comparison; the title is the sole key
            // for cross-run playlist reuse.
            if playlist.snippet.title == title {
                return Ok(Some(PlaylistRef {
                    id: playlist.id,
                    title: playlist.snippet.title,
                }));
            }
        }
        Ok(None)
    }

    #[instrument(skip(self, description, privacy))]
    async fn create_playlist(
        &self,
        title: &str,
        description: &str,
        privacy: PrivacyStatus,
    ) -> Result<PlaylistRef, ApiError> {
        let query = [("part", "snippet,status")];
        let body = PlaylistInsertRequest {
            snippet: PlaylistInsertSnippet {
                title: title.to_owned(),
                description: description.to_owned(),
            },
            status: PlaylistStatus {
                privacy_status: privacy,
            },
        };

        let response = self
            .request(Method::POST, PLAYLISTS_ENDPOINT, Some(&query), Some(&body))
            .await?;
        let playlist: Playlist = response.json().await?;
        tracing::debug!(id = %playlist.id, "created playlist");
        Ok(PlaylistRef {
            id: playlist.id,
            title: playlist.snippet.title,
        })
    }

    async fn playlist_members(&self, playlist_id: &str) -> Result<HashSet<String>, ApiError> {
        let stream = self.list_playlist_items(playlist_id);
        let mut stream = std::pin::pin!(stream);

        let mut members = HashSet::new();
        while let Some(item) = stream.next().await {
            members.insert(item?.content_details.video_id);
        }
        tracing::debug!(playlist_id, count = members.len(), "fetched playlist membership");
        Ok(members)
    }

    async fn insert_video(&self, playlist_id: &str, video_id: &str) -> Result<(), ApiError> {
        let query = [("part", "snippet")];
        let body = PlaylistItemInsertRequest {
            snippet: PlaylistItemInsertSnippet {
                playlist_id: playlist_id.to_owned(),
                resource_id: ResourceId::video(video_id),
            },
        };

        self.request(
            Method::POST,
            PLAYLIST_ITEMS_ENDPOINT,
            Some(&query),
            Some(&body),
        )
        .await?;
        Ok(())
    }
}

/// Formats a timestamp the way the API expects its date bounds, UTC with
/// whole seconds.
fn rfc3339(timestamp: Timestamp) -> String {
    timestamp.strftime("%Y-%m-%dT%H:%M:%SZ").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rfc3339_is_second_precision_utc() {
        let timestamp: Timestamp = "2025-09-16T23:59:59.999999999Z".parse().unwrap();

        assert_eq!(rfc3339(timestamp), "2025-09-16T23:59:59Z");
    }
}
