//! HTTP client for the Datatracker REST API.

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, instrument, warn};
use url::Url;

use async_trait::async_trait;

use super::types::{Document, EventPage};
use super::EventSource;
use crate::config::Config;

/// Path of the document event feed.
const EVENT_FEED_PATH: &str = "/api/v1/doc/docevent/";

/// Errors from fetching feed pages or documents.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The API base or a reference could not be turned into a URL.
    #[error("invalid URL <{reference}>: {source}")]
    InvalidUrl {
        reference: String,
        #[source]
        source: url::ParseError,
    },

    /// HTTP client could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    /// Transport failure or timeout.
    #[error("request for <{url}> failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// Any status other than 200.
    #[error("status code {status} from <{url}>")]
    Status { url: String, status: StatusCode },

    /// Body was not the JSON we expected.
    #[error("JSON parse error from <{url}>: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Datatracker API client.
#[derive(Debug, Clone)]
pub struct DatatrackerClient {
    client: reqwest::Client,
    base: Url,
    chunk_size: usize,
}

impl DatatrackerClient {
    /// Create a client for the configured API base.
    pub fn new(config: &Config) -> Result<Self, FetchError> {
        let base = Url::parse(&config.api_base).map_err(|source| FetchError::InvalidUrl {
            reference: config.api_base.clone(),
            source,
        })?;

        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(FetchError::Client)?;

        Ok(Self {
            client,
            base,
            chunk_size: config.chunk_size,
        })
    }

    /// Resolve a site-relative path or absolute URL against the API base.
    fn resolve(&self, reference: &str) -> Result<Url, FetchError> {
        self.base
            .join(reference)
            .map_err(|source| FetchError::InvalidUrl {
                reference: reference.to_string(),
                source,
            })
    }

    /// GET a JSON resource. Failures are logged here and returned to the caller.
    #[instrument(skip(self), level = "debug")]
    async fn get_json<T: DeserializeOwned>(&self, reference: &str) -> Result<T, FetchError> {
        let url = self.resolve(reference)?;
        debug!(url = %url, "Fetching");

        let response = match self.client.get(url.clone()).send().await {
            Ok(response) => response,
            Err(source) => {
                warn!(url = %url, error = %source, "Request exception");
                return Err(FetchError::Request {
                    url: url.to_string(),
                    source,
                });
            }
        };

        let status = response.status();
        if status != StatusCode::OK {
            warn!(url = %url, status = status.as_u16(), "Unexpected status code");
            return Err(FetchError::Status {
                url: url.to_string(),
                status,
            });
        }

        let body = response.bytes().await.map_err(|source| {
            warn!(url = %url, error = %source, "Failed to read response body");
            FetchError::Request {
                url: url.to_string(),
                source,
            }
        })?;

        serde_json::from_slice(&body).map_err(|source| {
            warn!(url = %url, error = %source, "JSON parse error");
            FetchError::Decode {
                url: url.to_string(),
                source,
            }
        })
    }
}

#[async_trait]
impl EventSource for DatatrackerClient {
    async fn latest_page(&self) -> Result<EventPage, FetchError> {
        let reference = format!("{EVENT_FEED_PATH}?format=json&limit={}", self.chunk_size);
        self.get_json(&reference).await
    }

    async fn page(&self, link: &str) -> Result<EventPage, FetchError> {
        self.get_json(link).await
    }

    async fn document(&self, reference: &str) -> Result<Document, FetchError> {
        self.get_json(reference).await
    }
}
