//! Datatracker API payloads.

use serde::{Deserialize, Serialize};

/// Event identifiers are assigned by the Datatracker in increasing order.
pub type EventId = u64;

/// A single document event from the `docevent` feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    /// Event type, e.g. `new_revision` or `changed_state`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Free-text description; some kinds are only interesting for specific values.
    #[serde(rename = "desc", default)]
    pub description: String,
    /// API path of the document the event belongs to.
    #[serde(rename = "doc")]
    pub document_ref: String,
}

/// Pagination metadata of a feed page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMeta {
    /// Link to the next (older) page, absent on the last page.
    #[serde(default)]
    pub next: Option<String>,
}

/// One page of the event feed. `objects` are newest-first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventPage {
    #[serde(default)]
    pub objects: Vec<Event>,
    #[serde(default)]
    pub meta: PageMeta,
}

impl EventPage {
    /// Consume the page, returning its events oldest-first.
    #[must_use]
    pub fn into_ascending(self) -> Vec<Event> {
        let mut events = self.objects;
        events.reverse();
        events
    }
}

/// The document fields a notice needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub name: String,
    pub title: String,
    /// Current revision; RFCs and some other documents carry none.
    #[serde(default)]
    pub rev: Option<String>,
}
