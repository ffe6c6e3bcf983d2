//! One poll-and-publish cycle.
//!
//! ```text
//! LOADING_CHECKPOINT -> FETCHING -> PROCESSING(event) -> {ADVANCE, STOP} -> PERSISTING -> DONE
//! ```
//!
//! Events are handled strictly in ascending order. The checkpoint only moves
//! past an event once its disposition is final, so a fatal error leaves the
//! checkpoint on the last event that was fully handled.

use thiserror::Error;
use tracing::{debug, error, info};

use crate::checkpoint::{CheckpointError, CheckpointStore};
use crate::datatracker::{EventId, EventSource, FetchError};
use crate::publish::{Connector, PublishError, PublishOutcome, Publisher};
use crate::render::{RenderError, Renderer};
use crate::resume::ResumptionEngine;

/// Failures that prevent a run from processing or persisting anything.
#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Checkpoint(#[from] CheckpointError),

    #[error("failed to fetch events: {0}")]
    Fetch(#[from] FetchError),
}

/// Why processing stopped early.
#[derive(Debug, Error)]
pub enum StopReason {
    #[error(transparent)]
    Render(#[from] RenderError),

    #[error("event {event_id}: {source}")]
    Publish {
        event_id: EventId,
        #[source]
        source: PublishError,
    },
}

/// Summary of a run.
#[derive(Debug, Default)]
pub struct RunReport {
    /// Checkpoint the run started from.
    pub started_from: Option<EventId>,
    /// Checkpoint persisted at the end.
    pub checkpoint: Option<EventId>,
    /// Events returned by the resumption engine.
    pub fetched: usize,
    /// Events skipped as not interesting.
    pub skipped: usize,
    /// Messages posted (or logged in dry-run mode).
    pub published: usize,
    pub duplicates: usize,
    pub abandoned: usize,
    /// The starting checkpoint could not be found in the feed.
    pub stale_checkpoint: bool,
    /// Set when a fatal condition ended processing early.
    pub stop: Option<StopReason>,
}

impl RunReport {
    #[must_use]
    pub const fn stopped(&self) -> bool {
        self.stop.is_some()
    }
}

/// Drives one run against an event source and a publisher.
pub struct RunController<S, C: Connector> {
    source: S,
    store: CheckpointStore,
    engine: ResumptionEngine,
    renderer: Renderer,
    publisher: Publisher<C>,
}

impl<S, C> RunController<S, C>
where
    S: EventSource,
    C: Connector,
{
    #[must_use]
    pub fn new(
        source: S,
        store: CheckpointStore,
        engine: ResumptionEngine,
        renderer: Renderer,
        publisher: Publisher<C>,
    ) -> Self {
        Self {
            source,
            store,
            engine,
            renderer,
            publisher,
        }
    }

    /// Run a full cycle, persisting whatever checkpoint was reached.
    ///
    /// `Err` means nothing was processed (bad checkpoint, feed unavailable)
    /// or the final checkpoint could not be written. A run stopped by a
    /// fatal render or publish error still returns `Ok` with
    /// [`RunReport::stop`] set.
    pub async fn run(&mut self, override_id: Option<EventId>) -> Result<RunReport, RunError> {
        let last_seen = self.store.load(override_id)?;
        info!(last_seen = ?last_seen, "Resuming at event");

        let resolution = self.engine.resolve(&self.source, last_seen).await?;

        let mut report = RunReport {
            started_from: last_seen,
            checkpoint: last_seen,
            fetched: resolution.events.len(),
            stale_checkpoint: resolution.stale_checkpoint,
            ..RunReport::default()
        };

        for event in &resolution.events {
            debug!(event_id = event.id, kind = %event.kind, description = %event.description, "Event");

            let message = match self.renderer.render(&self.source, event).await {
                Ok(Some(message)) => message,
                Ok(None) => {
                    report.skipped += 1;
                    report.checkpoint = Some(event.id);
                    continue;
                }
                Err(e) => {
                    error!(event_id = event.id, error = %e, "Rendering failed. Stopping run");
                    report.stop = Some(StopReason::Render(e));
                    break;
                }
            };

            info!(event_id = event.id, message = %message, "Message");
            match self.publisher.publish(&message).await {
                Ok(outcome) => {
                    match outcome {
                        PublishOutcome::Posted | PublishOutcome::DryRun => report.published += 1,
                        PublishOutcome::Duplicate => report.duplicates += 1,
                        PublishOutcome::Abandoned => report.abandoned += 1,
                    }
                    report.checkpoint = Some(event.id);
                }
                Err(source) => {
                    report.stop = Some(StopReason::Publish {
                        event_id: event.id,
                        source,
                    });
                    break;
                }
            }
        }

        info!(last_seen = ?report.checkpoint, "Last event seen");
        self.store.save(report.checkpoint)?;
        Ok(report)
    }
}
