//! Posting announcements.
//!
//! [`Publisher`] owns the publishing session for a run. The session is opened
//! through a [`Connector`] on the first live post and reused afterwards.
//! Failures are classified into rate limits (retried with a fixed backoff,
//! then abandoned), duplicates (treated as success), and everything else
//! (fatal for the run).

mod credentials;
mod twitter;

pub use credentials::{Credentials, CredentialsError};
pub use twitter::{TwitterConnector, TwitterSession};

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use thiserror::Error;
use tracing::{error, info, warn};

/// Error codes the Twitter API uses for throttling (rate limit exceeded, over capacity).
pub const RATE_LIMIT_CODES: [u32; 2] = [88, 130];

/// Error code for "status is a duplicate".
pub const DUPLICATE_CODE: u32 = 187;

/// Errors from a single post attempt.
#[derive(Debug, Error)]
pub enum PostError {
    /// The service answered with an error.
    #[error("API error (HTTP {status}, code {code:?}): {message}")]
    Api {
        status: StatusCode,
        code: Option<u32>,
        message: String,
    },

    /// Transport failure or timeout.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The session could not be set up.
    #[error("session setup failed: {0}")]
    Setup(String),
}

/// How a failed post is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    /// Wait and try the same message again.
    RateLimited,
    /// The service already has this message.
    Duplicate,
    /// Stop the run.
    Fatal,
}

impl PostError {
    #[must_use]
    pub fn class(&self) -> FailureClass {
        match self {
            Self::Api {
                code: Some(code), ..
            } if RATE_LIMIT_CODES.contains(code) => FailureClass::RateLimited,
            Self::Api {
                code: Some(DUPLICATE_CODE),
                ..
            } => FailureClass::Duplicate,
            Self::Api {
                status, code: None, ..
            } if *status == StatusCode::TOO_MANY_REQUESTS => FailureClass::RateLimited,
            Self::Api { .. } | Self::Http(_) | Self::Setup(_) => FailureClass::Fatal,
        }
    }
}

/// A post that ended the run.
#[derive(Debug, Error)]
pub enum PublishError {
    #[error("could not open publishing session: {0}")]
    Connect(#[source] PostError),

    #[error("post rejected: {0}")]
    Rejected(#[source] PostError),
}

/// Terminal result of publishing one message. All of these let the
/// checkpoint advance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishOutcome {
    Posted,
    /// The service already had an identical post.
    Duplicate,
    /// Still rate limited after every retry; the message is dropped.
    Abandoned,
    /// Dry run; nothing was sent.
    DryRun,
}

/// Fixed-delay retry budget for rate-limited posts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub delay: Duration,
}

impl RetryPolicy {
    #[must_use]
    pub const fn new(max_retries: u32, delay: Duration) -> Self {
        Self { max_retries, delay }
    }
}

/// A connected session that can post a status.
#[async_trait]
pub trait StatusPoster: Send + Sync {
    async fn post_status(&self, text: &str) -> Result<(), PostError>;
}

/// Opens publishing sessions.
pub trait Connector: Send + Sync {
    type Session: StatusPoster;

    fn connect(&self) -> Result<Self::Session, PostError>;
}

/// Publishes messages for one run.
pub struct Publisher<C: Connector> {
    connector: Option<C>,
    session: Option<C::Session>,
    retry: RetryPolicy,
}

impl<C: Connector> Publisher<C> {
    /// Publisher that posts through `connector`.
    #[must_use]
    pub fn live(connector: C, retry: RetryPolicy) -> Self {
        Self {
            connector: Some(connector),
            session: None,
            retry,
        }
    }

    /// Publisher that only logs messages.
    #[must_use]
    pub fn dry_run() -> Self {
        Self {
            connector: None,
            session: None,
            retry: RetryPolicy::new(0, Duration::ZERO),
        }
    }

    #[must_use]
    pub const fn is_dry_run(&self) -> bool {
        self.connector.is_none()
    }

    /// Publish one message.
    ///
    /// Rate limits are retried up to the policy's limit and then abandoned;
    /// duplicates count as delivered. Any other failure is returned as an
    /// error and the caller must stop.
    pub async fn publish(&mut self, message: &str) -> Result<PublishOutcome, PublishError> {
        let Some(connector) = self.connector.as_ref() else {
            info!(message, "Dry run; not posting");
            return Ok(PublishOutcome::DryRun);
        };

        let session = match self.session.take() {
            Some(session) => session,
            None => {
                let session = connector.connect().map_err(|e| {
                    error!(error = %e, "Failed to open publishing session");
                    PublishError::Connect(e)
                })?;
                info!("Publishing session established");
                session
            }
        };
        let session = self.session.insert(session);

        let mut retries = 0;
        loop {
            let err = match session.post_status(message).await {
                Ok(()) => {
                    info!(message, "Posted");
                    return Ok(PublishOutcome::Posted);
                }
                Err(err) => err,
            };

            match err.class() {
                FailureClass::RateLimited if retries < self.retry.max_retries => {
                    retries += 1;
                    warn!(
                        error = %err,
                        retry = retries,
                        max_retries = self.retry.max_retries,
                        delay_secs = self.retry.delay.as_secs(),
                        "Rate limited. Retrying"
                    );
                    tokio::time::sleep(self.retry.delay).await;
                }
                FailureClass::RateLimited => {
                    warn!(error = %err, message, "Exceeded max retries. Giving up");
                    return Ok(PublishOutcome::Abandoned);
                }
                FailureClass::Duplicate => {
                    warn!(message, "Duplicate post");
                    return Ok(PublishOutcome::Duplicate);
                }
                FailureClass::Fatal => {
                    error!(error = %err, "Post failed. Aborting run");
                    return Err(PublishError::Rejected(err));
                }
            }
        }
    }
}
