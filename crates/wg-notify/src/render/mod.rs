//! Event filtering and message rendering.

mod templates;

pub use templates::{Placeholders, Template, TemplateError, TemplateSet};

use thiserror::Error;
use tracing::debug;

use crate::config::Config;
use crate::datatracker::{Event, EventSource, FetchError};

/// Rendering an interesting event failed; the run must not advance past it.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("failed to fetch document for event {event_id}: {source}")]
    Document {
        event_id: u64,
        #[source]
        source: FetchError,
    },

    #[error("failed to render event {event_id}: {source}")]
    Template {
        event_id: u64,
        #[source]
        source: TemplateError,
    },
}

/// Decides which events are announced and what the announcement says.
#[derive(Debug)]
pub struct Renderer {
    templates: TemplateSet,
    draft_prefix: String,
    config: Config,
}

impl Renderer {
    /// Renderer for one working group's drafts, e.g. group `tls` matches
    /// documents containing `draft-ietf-tls`.
    #[must_use]
    pub fn new(group: &str, templates: TemplateSet, config: Config) -> Self {
        Self {
            templates,
            draft_prefix: format!("draft-ietf-{group}"),
            config,
        }
    }

    /// Whether the event's document belongs to the group.
    #[must_use]
    pub fn in_group(&self, event: &Event) -> bool {
        event.document_ref.contains(&self.draft_prefix)
    }

    /// Template for the event, or `None` when the event is not announced.
    #[must_use]
    pub fn template_for(&self, event: &Event) -> Option<&str> {
        if !self.in_group(event) {
            return None;
        }
        self.templates.lookup(&event.kind, &event.description)
    }

    /// Render the announcement for an event.
    ///
    /// `Ok(None)` means the event is not interesting. The document is only
    /// fetched once a template matched.
    pub async fn render<S>(&self, source: &S, event: &Event) -> Result<Option<String>, RenderError>
    where
        S: EventSource + ?Sized,
    {
        let Some(template) = self.template_for(event) else {
            return Ok(None);
        };

        let document = source
            .document(&event.document_ref)
            .await
            .map_err(|source| RenderError::Document {
                event_id: event.id,
                source,
            })?;
        debug!(event_id = event.id, name = %document.name, "Fetched document");

        let values = Placeholders {
            link: self.config.document_link(&document.name),
            title: document.title,
            name: document.name,
            rev: document.rev.unwrap_or_default(),
            ev_id: event.id,
        };

        self.templates
            .render(template, &values)
            .map(Some)
            .map_err(|source| RenderError::Template {
                event_id: event.id,
                source,
            })
    }
}
