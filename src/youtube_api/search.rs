//! Types for the `search.list` endpoint.
//!
//! The digest uses search (scoped to a channel, `type=video`, bounded by
//! `publishedAfter`/`publishedBefore`) as its upload lister; YouTube has no
//! cheaper "uploads on this date" endpoint.

use crate::youtube_api::types::PageInfo;
use jiff::Timestamp;
use serde::Deserialize;

/// Response structure for the `search.list` API call.
///
/// See: <https://developers.google.com/youtube/v3/docs/search/list>
#[derive(Debug, Deserialize)]
pub struct SearchListResponse {
    /// Identifies the API resource's type.
    ///
    /// The value will be `youtube#searchListResponse`.
    pub kind: String,
    /// A list of results that match the search criteria.
    pub items: Vec<SearchResult>,
    #[serde(rename = "pageInfo")]
    pub page_info: PageInfo,
    /// Token that can be used as the value of the pageToken parameter to retrieve the next page in the result set.
    #[serde(rename = "nextPageToken")]
    pub next_page_token: Option<String>,
}

/// A single search result.
///
/// See: <https://developers.google.com/youtube/v3/docs/search#resource>
#[derive(Debug, Deserialize)]
pub struct SearchResult {
    pub id: SearchResultId,
    pub snippet: SearchSnippet,
}

/// Names the resource a search result matched.
///
/// Search can return videos, channels, and playlists; only video matches
/// carry a `videoId`. With `type=video` in the request everything should be
/// a video, but the field stays optional so an unexpected mix does not fail
/// deserialization of the whole page.
#[derive(Debug, Deserialize)]
pub struct SearchResultId {
    /// The type of the matched resource, e.g. `youtube#video`.
    pub kind: String,
    #[serde(rename = "videoId")]
    pub video_id: Option<String>,
}

/// Basic details about a search result.
///
/// This is a subset of the full snippet data available from the API,
/// containing only the fields this tool needs.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchSnippet {
    pub title: String,
    /// The ID of the channel that published the resource.
    pub channel_id: String,
    /// The display title of that channel.
    pub channel_title: String,
    /// The creation date and time of the matched resource, ISO 8601.
    pub published_at: Timestamp,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_search_page() {
        let body = r#"{
            "kind": "youtube#searchListResponse",
            "nextPageToken": "CDIQAA",
            "pageInfo": {"totalResults": 93, "resultsPerPage": 50},
            "items": [
                {
                    "kind": "youtube#searchResult",
                    "id": {"kind": "youtube#video", "videoId": "dQw4w9WgXcQ"},
                    "snippet": {
                        "publishedAt": "2025-09-16T14:05:00Z",
                        "channelId": "UCrp_UI8XtuYfpiqluWLD7Lw",
                        "title": "Market open coverage",
                        "description": "Live from the floor.",
                        "channelTitle": "CNBC Television"
                    }
                }
            ]
        }"#;

        let page: SearchListResponse = serde_json::from_str(body).unwrap();

        assert_eq!(page.next_page_token.as_deref(), Some("CDIQAA"));
        assert_eq!(page.items.len(), 1);
        let result = &page.items[0];
        assert_eq!(result.id.video_id.as_deref(), Some("dQw4w9WgXcQ"));
        assert_eq!(result.snippet.channel_title, "CNBC Television");
        assert_eq!(
            result.snippet.published_at,
            "2025-09-16T14:05:00Z".parse().unwrap()
        );
    }
}
