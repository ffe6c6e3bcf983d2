//! Twitter API credentials.

use std::env;
use std::fmt;

use thiserror::Error;

pub const ENV_CONSUMER_KEY: &str = "TWITTER_CONSUMER_KEY";
pub const ENV_CONSUMER_SECRET: &str = "TWITTER_CONSUMER_SECRET";
pub const ENV_TOKEN_KEY: &str = "TWITTER_TOKEN_KEY";
pub const ENV_TOKEN_SECRET: &str = "TWITTER_TOKEN_SECRET";

#[derive(Debug, Error)]
pub enum CredentialsError {
    #[error("environment variable not found: {0}")]
    Missing(&'static str),
}

/// OAuth 1.0a consumer and access token pairs.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub consumer_key: String,
    pub consumer_secret: String,
    pub token_key: String,
    pub token_secret: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("consumer_key", &self.consumer_key)
            .field("consumer_secret", &"<redacted>")
            .field("token_key", &self.token_key)
            .field("token_secret", &"<redacted>")
            .finish()
    }
}

impl Credentials {
    /// Read all four values from the environment.
    pub fn from_env() -> Result<Self, CredentialsError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Read all four values through `lookup`. Empty values count as missing.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, CredentialsError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let require = |key: &'static str| {
            lookup(key)
                .filter(|v| !v.is_empty())
                .ok_or(CredentialsError::Missing(key))
        };

        Ok(Self {
            consumer_key: require(ENV_CONSUMER_KEY)?,
            consumer_secret: require(ENV_CONSUMER_SECRET)?,
            token_key: require(ENV_TOKEN_KEY)?,
            token_secret: require(ENV_TOKEN_SECRET)?,
        })
    }
}
