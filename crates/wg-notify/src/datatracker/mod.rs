//! Datatracker event feed access.
//!
//! [`EventSource`] is the seam between the resumption logic and the network;
//! [`DatatrackerClient`] is the HTTP implementation.

mod client;
mod types;

pub use client::{DatatrackerClient, FetchError};
pub use types::{Document, Event, EventId, EventPage, PageMeta};

use async_trait::async_trait;

/// Read access to the event feed and the documents it references.
#[async_trait]
pub trait EventSource: Send + Sync {
    /// Fetch the most recent page of events.
    async fn latest_page(&self) -> Result<EventPage, FetchError>;

    /// Follow a pagination link to an older page.
    async fn page(&self, link: &str) -> Result<EventPage, FetchError>;

    /// Fetch the document an event refers to.
    async fn document(&self, reference: &str) -> Result<Document, FetchError>;
}
