//! Shared paging infrastructure for YouTube list endpoints.

use crate::youtube_api::error::ApiError;
use async_stream::try_stream;
use serde::Deserialize;
use std::future::Future;
use tokio_stream::Stream;

/// Paging details for lists of resources.
///
/// See: <https://developers.google.com/youtube/v3/docs/pageInfo>
#[derive(Debug, Deserialize)]
pub struct PageInfo {
    /// The total number of results in the result set.
    #[serde(rename = "totalResults")]
    pub total_results: u32,
    /// The number of results included in the API response.
    #[serde(rename = "resultsPerPage")]
    pub results_per_page: u32,
}

/// One page of results from a list endpoint, already mapped to item type `T`.
pub(crate) struct Page<T> {
    pub items: Vec<T>,
    pub next_page_token: Option<String>,
}

/// Turns a page-fetching closure into a lazy stream of items.
///
/// `fetch` is called with `None` for the first page and with the previous
/// response's `nextPageToken` afterwards, until a page arrives without one.
/// Pages are only requested as the stream is polled, so a consumer that
/// stops early (a title match, a per-channel cap) never pays for the
/// remaining pages, while a fully drained stream has visited every page.
pub(crate) fn paged<'a, T, F, Fut>(fetch: F) -> impl Stream<Item = Result<T, ApiError>> + 'a
where
    T: 'a,
    F: Fn(Option<String>) -> Fut + 'a,
    Fut: Future<Output = Result<Page<T>, ApiError>> + 'a,
{
    try_stream! {
        let mut page_token: Option<String> = None;
        loop {
            let page = fetch(page_token.take()).await?;
            for item in page.items {
                yield item;
            }
            match page.next_page_token {
                Some(next) => page_token = Some(next),
                None => break,
            }
        }
    }
}
