//! Per-lane scheduling state machine.
//!
//! A scheduler owns one lane's tracker and the bookkeeping for the current
//! pass. Starting a pass detaches the previous one: completions stamped with
//! an older [`PassId`] are ignored even though their transfers may still be
//! running.

use std::collections::HashMap;

use tracing::{debug, trace, warn};

use super::{
    Completion, Lane, PassId, PrefetchCandidate, PrefetchOutcome,
    SlideshowSnapshot, planner::plan_candidates,
};
use crate::tracker::ResourceTracker;

/// Candidates to dispatch for one pass.
#[derive(Debug, Clone)]
pub struct PassPlan {
    pub pass: PassId,
    pub lane: Lane,
    pub candidates: Vec<PrefetchCandidate>,
}

impl PassPlan {
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }
}

/// What the scheduler did with a completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionDisposition {
    Acquired,
    Failed,
    /// Belonged to a superseded pass or a torn down slideshow.
    Detached,
}

#[derive(Debug)]
pub struct PrefetchScheduler {
    lane: Lane,
    tracker: ResourceTracker,
    pass: PassId,
    pending: HashMap<String, PrefetchCandidate>,
    acquired_total: u64,
    failed_total: u64,
    detached_total: u64,
}

impl PrefetchScheduler {
    pub fn new(lane: Lane, tracker_capacity: usize) -> Self {
        Self {
            lane,
            tracker: ResourceTracker::new(tracker_capacity),
            pass: PassId::default(),
            pending: HashMap::new(),
            acquired_total: 0,
            failed_total: 0,
            detached_total: 0,
        }
    }

    pub fn lane(&self) -> Lane {
        self.lane
    }

    pub fn tracker(&self) -> &ResourceTracker {
        &self.tracker
    }

    pub fn current_pass(&self) -> PassId {
        self.pass
    }

    /// Candidates of the current pass still in flight.
    pub fn pending(&self) -> impl Iterator<Item = &PrefetchCandidate> {
        self.pending.values()
    }

    pub fn is_idle(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn acquired_total(&self) -> u64 {
        self.acquired_total
    }

    pub fn failed_total(&self) -> u64 {
        self.failed_total
    }

    pub fn detached_total(&self) -> u64 {
        self.detached_total
    }

    /// Start a new pass for `snapshot` and return what to dispatch.
    ///
    /// The previous pass is detached first. A disabled or empty snapshot
    /// yields an empty plan and leaves the scheduler idle.
    pub fn begin_pass(&mut self, snapshot: &SlideshowSnapshot) -> PassPlan {
        self.detach_pending();

        let candidates = plan_candidates(snapshot, self.lane, &self.tracker);
        for candidate in &candidates {
            self.pending
                .insert(candidate.resource_id.clone(), candidate.clone());
        }

        debug!(
            lane = %self.lane,
            pass = self.pass.0,
            current_index = snapshot.current_index,
            posts = snapshot.posts.len(),
            preload_count = snapshot.settings.preload_count,
            enabled = snapshot.settings.enabled,
            planned = candidates.len(),
            "prefetch pass planned"
        );

        PassPlan {
            pass: self.pass,
            lane: self.lane,
            candidates,
        }
    }

    /// Apply a completion. Failures are logged and never retried here; the
    /// next pass picks the item up again if it is still ahead.
    pub fn complete(&mut self, completion: Completion) -> CompletionDisposition {
        let Completion {
            pass,
            lane,
            outcome,
        } = completion;

        if pass != self.pass || lane != self.lane {
            self.detached_total += 1;
            trace!(
                lane = %self.lane,
                completion_pass = pass.0,
                current_pass = self.pass.0,
                resource = outcome.resource_id(),
                "ignoring completion from a detached pass"
            );
            return CompletionDisposition::Detached;
        }

        match outcome {
            PrefetchOutcome::Acquired(id) => {
                self.pending.remove(&id);
                self.acquired_total += 1;
                trace!(lane = %self.lane, resource = %id, "prefetch acquired");
                self.tracker.mark_acquired(id);
                CompletionDisposition::Acquired
            }
            PrefetchOutcome::Failed(id, cause) => {
                self.pending.remove(&id);
                self.failed_total += 1;
                warn!(
                    lane = %self.lane,
                    resource = %id,
                    error = %cause,
                    "prefetch failed"
                );
                CompletionDisposition::Failed
            }
        }
    }

    /// Slideshow closed: detach everything and forget what was acquired.
    pub fn teardown(&mut self) {
        self.detach_pending();
        self.tracker.clear();
        debug!(lane = %self.lane, pass = self.pass.0, "prefetch torn down");
    }

    // Ids still in flight are dropped from `pending` and planned again by
    // the next pass, so a quick advance re-requests them through the gate.
    // Nothing outside the transfer records their bytes, so a detached
    // completion cannot stand in for the new pass's own request.
    fn detach_pending(&mut self) {
        self.pass = self.pass.next();
        if !self.pending.is_empty() {
            trace!(
                lane = %self.lane,
                detached = self.pending.len(),
                "detaching in-flight prefetches"
            );
            self.pending.clear();
        }
    }
}
