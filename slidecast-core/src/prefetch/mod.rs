//! Lookahead prefetching for the slideshow.
//!
//! The sequencer publishes [`SlideshowSnapshot`]s (post list, current index
//! and the user's preload settings). For every snapshot each [`Lane`]
//! plans the next `preload_count` items of its kind that are not yet
//! tracked, and dispatches them concurrently through a [`MediaFetcher`].
//! Completions flow back to the owning scheduler, which marks successes in
//! its [`ResourceTracker`](crate::tracker::ResourceTracker) and only logs
//! failures.

pub mod fetcher;
pub mod pipeline;
pub mod planner;
pub mod scheduler;

use std::fmt::{self, Display, Formatter};
use std::sync::Arc;

use slidecast_model::{MediaKind, Post, PostId};

use crate::config::PrefetchConfig;
use crate::error::PrefetchError;

pub use fetcher::{HttpMediaFetcher, MediaFetcher};
pub use pipeline::{
    LaneStatus, PipelineHandle, PipelineStatus, start_pipeline,
};
pub use planner::{lookahead_indices, plan_candidates, resource_id};
pub use scheduler::{CompletionDisposition, PassPlan, PrefetchScheduler};

/// Which tracker and loader a post goes through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Lane {
    /// Still images and gifs, fully downloaded and decoded.
    Image,
    /// Videos, only the leading metadata bytes are fetched.
    Video,
}

impl Lane {
    pub const fn of(kind: MediaKind) -> Self {
        if kind.is_image_like() {
            Lane::Image
        } else {
            Lane::Video
        }
    }

    pub const fn accepts(self, kind: MediaKind) -> bool {
        matches!(
            (self, Lane::of(kind)),
            (Lane::Image, Lane::Image) | (Lane::Video, Lane::Video)
        )
    }
}

impl Display for Lane {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Lane::Image => write!(f, "image"),
            Lane::Video => write!(f, "video"),
        }
    }
}

/// User preferences read from the settings store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlideshowSettings {
    pub preload_count: usize,
    pub enabled: bool,
}

impl Default for SlideshowSettings {
    fn default() -> Self {
        Self::from(&PrefetchConfig::default())
    }
}

impl From<&PrefetchConfig> for SlideshowSettings {
    fn from(config: &PrefetchConfig) -> Self {
        Self {
            preload_count: config.preload_count,
            enabled: config.enabled,
        }
    }
}

/// What the sequencer currently shows.
#[derive(Debug, Clone)]
pub struct SlideshowSnapshot {
    pub posts: Arc<[Post]>,
    pub current_index: usize,
    pub settings: SlideshowSettings,
}

impl SlideshowSnapshot {
    pub fn new(
        posts: impl Into<Arc<[Post]>>,
        current_index: usize,
        settings: SlideshowSettings,
    ) -> Self {
        Self {
            posts: posts.into(),
            current_index,
            settings,
        }
    }

    /// Whether this snapshot asks for any prefetching at all.
    pub fn is_active(&self) -> bool {
        self.settings.enabled && !self.posts.is_empty()
    }
}

/// Monotonic identifier of a scheduling pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct PassId(pub u64);

impl PassId {
    pub fn next(self) -> Self {
        PassId(self.0.wrapping_add(1))
    }
}

/// One upcoming item selected for acquisition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrefetchCandidate {
    /// Distance ahead of the current index (1-based).
    pub lookahead: usize,
    /// Index into the post list.
    pub index: usize,
    pub post_id: PostId,
    pub kind: MediaKind,
    /// URL to fetch.
    pub url: String,
    /// Tracker identity: the normalized URL.
    pub resource_id: String,
}

/// Result of one candidate's acquisition.
#[derive(Debug)]
pub enum PrefetchOutcome {
    Acquired(String),
    Failed(String, PrefetchError),
}

impl PrefetchOutcome {
    pub fn resource_id(&self) -> &str {
        match self {
            PrefetchOutcome::Acquired(id) | PrefetchOutcome::Failed(id, _) => id,
        }
    }
}

/// Outcome tagged with the pass that dispatched it.
#[derive(Debug)]
pub struct Completion {
    pub pass: PassId,
    pub lane: Lane,
    pub outcome: PrefetchOutcome,
}
