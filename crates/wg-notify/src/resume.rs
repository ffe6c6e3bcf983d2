//! Locating the checkpoint in the event feed.
//!
//! The feed can only be walked from the newest page toward older ones, so to
//! find everything newer than the checkpoint the engine keeps following the
//! `next` link, prepending each page (reversed to oldest-first) to an
//! ascending window, until the checkpoint shows up or the request limit is
//! spent.

use tracing::{debug, info, warn};

use crate::datatracker::{Event, EventId, EventSource, FetchError};

/// Events that still need processing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolution {
    /// Strictly ascending, no duplicates.
    pub events: Vec<Event>,
    /// A checkpoint was given and every fetched event is newer than it, so
    /// the walk ended (lookback bound spent or feed exhausted) without
    /// reaching it. A checkpoint newer than the whole feed is not stale: it
    /// simply yields no events.
    pub stale_checkpoint: bool,
    /// Older pages fetched beyond the first one.
    pub extra_pages: usize,
}

/// Bounded backward walk over the feed.
#[derive(Debug, Clone, Copy)]
pub struct ResumptionEngine {
    request_limit: usize,
}

impl ResumptionEngine {
    /// `request_limit` is the number of older pages that may be fetched while
    /// searching for the checkpoint.
    #[must_use]
    pub const fn new(request_limit: usize) -> Self {
        Self { request_limit }
    }

    #[must_use]
    pub const fn request_limit(&self) -> usize {
        self.request_limit
    }

    /// Return the events newer than `last_seen`, oldest-first.
    ///
    /// Without a checkpoint only the most recent page is returned; anything
    /// older than that page is never seen.
    pub async fn resolve<S>(
        &self,
        source: &S,
        last_seen: Option<EventId>,
    ) -> Result<Resolution, FetchError>
    where
        S: EventSource + ?Sized,
    {
        let first = source.latest_page().await?;
        let mut next = first.meta.next.clone();
        let mut window = first.into_ascending();

        let Some(last_seen) = last_seen else {
            info!(events = window.len(), "No checkpoint; using the latest page only");
            return Ok(Resolution {
                events: window,
                ..Resolution::default()
            });
        };

        let mut extra_pages = 0;
        while !contains(&window, last_seen) && extra_pages < self.request_limit {
            let Some(link) = next.take() else {
                debug!(last_seen, "Reached the end of the feed");
                break;
            };

            let page = source.page(&link).await?;
            extra_pages += 1;
            next = page.meta.next.clone();
            prepend(&mut window, page.into_ascending());

            debug!(
                extra_pages,
                window = window.len(),
                oldest = window.first().map(|e| e.id),
                "Extended lookback window"
            );
        }

        let window_len = window.len();
        let events: Vec<Event> = window.into_iter().filter(|e| e.id > last_seen).collect();

        let stale_checkpoint = events.len() == window_len;
        if stale_checkpoint {
            warn!(
                last_seen,
                extra_pages,
                request_limit = self.request_limit,
                "Event ID {last_seen} not found; processing every event fetched"
            );
        }

        Ok(Resolution {
            events,
            stale_checkpoint,
            extra_pages,
        })
    }
}

fn contains(window: &[Event], id: EventId) -> bool {
    window.iter().any(|e| e.id == id)
}

/// Put an older ascending page in front of the window.
///
/// Only events older than the current head are taken, so an event that slid
/// from one page to the next between requests is not duplicated.
fn prepend(window: &mut Vec<Event>, older: Vec<Event>) {
    let head = window.first().map(|e| e.id);
    let mut merged: Vec<Event> = older
        .into_iter()
        .filter(|e| head.is_none_or(|head| e.id < head))
        .collect();
    merged.append(window);
    *window = merged;
}
