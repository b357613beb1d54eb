//! Types for the `playlists.list` and `playlists.insert` endpoints.

use crate::youtube_api::types::PageInfo;
use serde::{Deserialize, Serialize};

/// Response structure for the `playlists.list` API call.
///
/// See: <https://developers.google.com/youtube/v3/docs/playlists/list>
#[derive(Debug, Deserialize)]
pub struct PlaylistListResponse {
    /// Identifies the API resource's type.
    ///
    /// The value will be `youtube#playlistListResponse`.
    pub kind: String,
    /// The playlists owned by the authenticated user on this page.
    pub items: Vec<Playlist>,
    #[serde(rename = "pageInfo")]
    pub page_info: PageInfo,
    /// Token that can be used as the value of the pageToken parameter to retrieve the next page in the result set.
    #[serde(rename = "nextPageToken")]
    pub next_page_token: Option<String>,
}

/// A `playlist` resource represents a YouTube playlist.
///
/// See: <https://developers.google.com/youtube/v3/docs/playlists#resource>
#[derive(Debug, Deserialize)]
pub struct Playlist {
    /// The ID that YouTube uses to uniquely identify the playlist.
    pub id: String,
    pub snippet: PlaylistSnippet,
}

/// Basic details about a playlist.
#[derive(Debug, Deserialize)]
pub struct PlaylistSnippet {
    pub title: String,
    #[serde(default)]
    pub description: String,
}

/// Request body for `playlists.insert`.
///
/// See: <https://developers.google.com/youtube/v3/docs/playlists/insert>
#[derive(Debug, Serialize)]
pub struct PlaylistInsertRequest {
    pub snippet: PlaylistInsertSnippet,
    pub status: PlaylistStatus,
}

#[derive(Debug, Serialize)]
pub struct PlaylistInsertSnippet {
    pub title: String,
    pub description: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistStatus {
    pub privacy_status: PrivacyStatus,
}

/// Playlist visibility.
///
/// Also appears in the configuration file, spelled in lowercase
/// (`privacy = "unlisted"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrivacyStatus {
    Public,
    Unlisted,
    Private,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_request_matches_wire_format() {
        let request = PlaylistInsertRequest {
            snippet: PlaylistInsertSnippet {
                title: "news_20250916".to_string(),
                description: "news videos uploaded on 2025-09-16".to_string(),
            },
            status: PlaylistStatus {
                privacy_status: PrivacyStatus::Unlisted,
            },
        };

        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["snippet"]["title"], "news_20250916");
        assert_eq!(json["status"]["privacyStatus"], "unlisted");
    }

    #[test]
    fn deserializes_playlist_page() {
        let body = r#"{
            "kind": "youtube#playlistListResponse",
            "pageInfo": {"totalResults": 2, "resultsPerPage": 50},
            "items": [
                {
                    "kind": "youtube#playlist",
                    "id": "PLx0sYbCqOb8TBPRdmBHs5Iftvv9TPboYG",
                    "snippet": {"title": "news_20250916", "description": ""}
                },
                {
                    "kind": "youtube#playlist",
                    "id": "PLy1sYbCqOb8TBPRdmBHs5Iftvv9TPboYH",
                    "snippet": {"title": "dev_20250915"}
                }
            ]
        }"#;

        let page: PlaylistListResponse = serde_json::from_str(body).unwrap();

        assert!(page.next_page_token.is_none());
        assert_eq!(page.items[0].snippet.title, "news_20250916");
        // description may be absent from the snippet
        assert_eq!(page.items[1].snippet.description, "");
    }
}
