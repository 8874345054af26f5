//! Prefetch pipeline actor.
//!
//! One task owns both lane schedulers and is their only writer. The
//! sequencer talks to it through a [`PipelineHandle`]; fetches run as
//! detached tasks and report back over a channel.

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, trace};

use super::{
    Completion, Lane, MediaFetcher, PassPlan, PrefetchOutcome,
    PrefetchScheduler, SlideshowSnapshot,
};
use crate::config::TrackerConfig;
use crate::error::PrefetchError;

/// Per-lane view of the pipeline state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LaneStatus {
    pub pass: u64,
    /// Resource ids still in flight for the current pass.
    pub pending: Vec<String>,
    /// Tracked resource ids, oldest first.
    pub tracked: Vec<String>,
    pub acquired_total: u64,
    pub failed_total: u64,
    pub detached_total: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineStatus {
    pub image: LaneStatus,
    pub video: LaneStatus,
}

impl PipelineStatus {
    pub fn is_idle(&self) -> bool {
        self.image.pending.is_empty() && self.video.pending.is_empty()
    }
}

#[derive(Debug)]
enum PipelineCommand {
    Schedule(SlideshowSnapshot),
    Teardown,
    Status(oneshot::Sender<PipelineStatus>),
    Shutdown,
}

/// Handle used by the sequencer to drive the pipeline.
#[derive(Debug, Clone)]
pub struct PipelineHandle {
    tx: mpsc::UnboundedSender<PipelineCommand>,
}

impl PipelineHandle {
    /// Publish a new sequencer snapshot. Supersedes the previous pass.
    pub fn schedule(&self, snapshot: SlideshowSnapshot) {
        let _ = self.tx.send(PipelineCommand::Schedule(snapshot));
    }

    /// Slideshow closed: detach pending loads and clear both trackers.
    pub fn teardown(&self) {
        let _ = self.tx.send(PipelineCommand::Teardown);
    }

    /// Current state, or `None` once the pipeline has stopped.
    pub async fn status(&self) -> Option<PipelineStatus> {
        let (reply, rx) = oneshot::channel();
        self.tx.send(PipelineCommand::Status(reply)).ok()?;
        rx.await.ok()
    }

    /// Stop the pipeline task. In-flight fetches keep running but their
    /// results are dropped.
    pub fn shutdown(&self) {
        let _ = self.tx.send(PipelineCommand::Shutdown);
    }
}

/// Start the pipeline task.
pub fn start_pipeline(
    trackers: TrackerConfig,
    fetcher: Arc<dyn MediaFetcher>,
) -> (PipelineHandle, tokio::task::JoinHandle<()>) {
    let (tx, mut rx) = mpsc::unbounded_channel::<PipelineCommand>();
    let handle = PipelineHandle { tx };

    let join = tokio::spawn(async move {
        let mut image = PrefetchScheduler::new(Lane::Image, trackers.image_capacity);
        let mut video = PrefetchScheduler::new(Lane::Video, trackers.video_capacity);
        let (done_tx, mut done_rx) = mpsc::unbounded_channel::<Completion>();

        loop {
            tokio::select! {
                command = rx.recv() => {
                    let Some(first) = command else { break };

                    // Drain whatever queued up behind it; of a run of
                    // consecutive snapshots only the last one is planned.
                    let mut batch = vec![first];
                    while let Ok(next) = rx.try_recv() {
                        batch.push(next);
                    }
                    let batch_len = batch.len();

                    let mut stop = false;
                    let mut commands = batch.into_iter().peekable();
                    while let Some(command) = commands.next() {
                        match command {
                            PipelineCommand::Schedule(snapshot) => {
                                if matches!(
                                    commands.peek(),
                                    Some(PipelineCommand::Schedule(_))
                                ) {
                                    continue;
                                }
                                for scheduler in [&mut image, &mut video] {
                                    let plan = scheduler.begin_pass(&snapshot);
                                    dispatch(plan, &fetcher, &done_tx);
                                }
                            }
                            PipelineCommand::Teardown => {
                                image.teardown();
                                video.teardown();
                            }
                            PipelineCommand::Status(reply) => {
                                let _ = reply.send(PipelineStatus {
                                    image: lane_status(&image),
                                    video: lane_status(&video),
                                });
                            }
                            PipelineCommand::Shutdown => {
                                stop = true;
                                break;
                            }
                        }
                    }
                    if batch_len > 1 {
                        trace!(commands = batch_len, "pipeline drained command batch");
                    }
                    if stop {
                        break;
                    }
                }
                Some(completion) = done_rx.recv() => {
                    let lane = completion.lane;
                    match lane {
                        Lane::Image => image.complete(completion),
                        Lane::Video => video.complete(completion),
                    };
                }
            }
        }

        debug!("prefetch pipeline stopped");
    });

    (handle, join)
}

/// Fire every candidate of `plan` concurrently, in ascending lookahead
/// order, without waiting for any of them.
fn dispatch(
    plan: PassPlan,
    fetcher: &Arc<dyn MediaFetcher>,
    done_tx: &mpsc::UnboundedSender<Completion>,
) {
    let PassPlan {
        pass,
        lane,
        candidates,
    } = plan;

    for candidate in candidates {
        let fetcher = Arc::clone(fetcher);
        let done_tx = done_tx.clone();
        tokio::spawn(async move {
            let resource_id = candidate.resource_id.clone();
            // Run the fetch in its own task so a panicking fetcher still
            // reports a failure instead of leaving the item pending.
            let result =
                tokio::spawn(async move { fetcher.acquire(&candidate).await })
                    .await
                    .unwrap_or_else(|err| {
                        Err(PrefetchError::Task(err.to_string()))
                    });

            let outcome = match result {
                Ok(()) => PrefetchOutcome::Acquired(resource_id),
                Err(cause) => PrefetchOutcome::Failed(resource_id, cause),
            };
            let _ = done_tx.send(Completion {
                pass,
                lane,
                outcome,
            });
        });
    }
}

fn lane_status(scheduler: &PrefetchScheduler) -> LaneStatus {
    let mut pending: Vec<String> = scheduler
        .pending()
        .map(|candidate| candidate.resource_id.clone())
        .collect();
    pending.sort();

    LaneStatus {
        pass: scheduler.current_pass().0,
        pending,
        tracked: scheduler.tracker().iter().map(str::to_string).collect(),
        acquired_total: scheduler.acquired_total(),
        failed_total: scheduler.failed_total(),
        detached_total: scheduler.detached_total(),
    }
}
