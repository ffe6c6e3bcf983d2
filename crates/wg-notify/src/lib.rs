//! Working group event announcer.
//!
//! This crate polls the IETF Datatracker event feed, picks out the events that
//! concern one working group's drafts, renders a short notice for each
//! interesting one, and posts it to Twitter/X.
//!
//! # Architecture
//!
//! - [`CheckpointStore`] reads and writes the id of the last processed event
//! - [`DatatrackerClient`] implements [`EventSource`] over the HTTP API
//! - [`ResumptionEngine`] walks the newest-first feed backward until it
//!   re-finds the checkpoint, bounded by a request limit
//! - [`Renderer`] filters events and renders messages from a [`TemplateSet`]
//! - [`Publisher`] posts messages through a lazily connected session and
//!   classifies failures
//! - [`RunController`] ties them together for a single poll-and-publish cycle
//!
//! # Configuration
//!
//! See [`Config`] for the environment variables that tune endpoints, page
//! sizes, lookback, and retry behavior.

#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod checkpoint;
pub mod config;
pub mod datatracker;
pub mod publish;
pub mod render;
pub mod resume;
pub mod run;

#[cfg(test)]
pub(crate) mod test_support;

pub use checkpoint::{CheckpointError, CheckpointStore};
pub use config::Config;
pub use datatracker::{DatatrackerClient, Document, Event, EventId, EventPage, EventSource, FetchError};
pub use publish::{
    Connector, Credentials, CredentialsError, FailureClass, PostError, PublishError,
    PublishOutcome, Publisher, RetryPolicy, StatusPoster, TwitterConnector,
};
pub use render::{RenderError, Renderer, Template, TemplateError, TemplateSet};
pub use resume::{Resolution, ResumptionEngine};
pub use run::{RunController, RunError, RunReport, StopReason};
