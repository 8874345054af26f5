//! Pure candidate planning; no I/O and no state.

use std::collections::HashSet;

use slidecast_model::Post;

use super::{Lane, PrefetchCandidate, SlideshowSnapshot};
use crate::cache_key::normalize;
use crate::tracker::ResourceTracker;

/// Indices of the next `count` items after `current`, wrapping around a
/// list of `len` items.
pub fn lookahead_indices(current: usize, count: usize, len: usize) -> Vec<usize> {
    if len == 0 {
        return Vec::new();
    }
    let start = current % len;
    (1..=count).map(|step| (start + step % len) % len).collect()
}

/// Tracker identity for a post's media.
pub fn resource_id(post: &Post) -> String {
    normalize(&post.file_url)
}

/// Candidates `lane` should acquire for `snapshot`, in ascending lookahead
/// order.
///
/// Skips posts of another lane and posts already in `tracker`. When the
/// lookahead wraps past the whole list a post is planned only once.
pub fn plan_candidates(
    snapshot: &SlideshowSnapshot,
    lane: Lane,
    tracker: &ResourceTracker,
) -> Vec<PrefetchCandidate> {
    if !snapshot.is_active() {
        return Vec::new();
    }

    let posts = &snapshot.posts;
    let indices = lookahead_indices(
        snapshot.current_index,
        snapshot.settings.preload_count,
        posts.len(),
    );

    let mut seen: HashSet<String> = HashSet::with_capacity(indices.len());
    let mut out = Vec::with_capacity(indices.len());

    for (offset, index) in indices.into_iter().enumerate() {
        let post = &posts[index];
        if !lane.accepts(post.kind) {
            continue;
        }
        let id = resource_id(post);
        if tracker.has(&id) || !seen.insert(id.clone()) {
            continue;
        }
        out.push(PrefetchCandidate {
            lookahead: offset + 1,
            index,
            post_id: post.id.clone(),
            kind: post.kind,
            url: post.file_url.clone(),
            resource_id: id,
        });
    }

    out
}
