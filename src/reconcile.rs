//! Decides which of the day's uploads actually get inserted.
//!
//! This is the only real decision logic in the tool, and it is deliberately
//! a pure computation over in-memory data: the caller fetches candidates and
//! current playlist membership, and performs the insertions afterwards.

use crate::platform::Upload;
use std::collections::HashSet;

/// Filters `candidates` down to the videos that still need to be inserted.
///
/// The relative order of `candidates` is preserved, so the caller's ordering
/// (upload time ascending, oldest first) is also the insertion order and,
/// because playlist insertion is append-only, the final playlist order.
///
/// A video is dropped when its identifier is already in `already_present`,
/// or when an earlier candidate carried the same identifier (two channels
/// can surface the same video; it should be appended once).
pub fn reconcile(candidates: Vec<Upload>, already_present: &HashSet<String>) -> Vec<Upload> {
    let mut picked = HashSet::new();
    candidates
        .into_iter()
        .filter(|video| {
            !already_present.contains(&video.video_id) && picked.insert(video.video_id.clone())
        })
        .collect()
}
