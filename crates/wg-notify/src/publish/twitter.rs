//! Twitter API v1.1 session with OAuth 1.0a request signing.

use std::time::Duration;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use hmac::{Hmac, Mac};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use serde::Deserialize;
use sha1::Sha1;
use tracing::debug;
use url::Url;

use super::{Connector, Credentials, PostError, StatusPoster};
use crate::config::Config;

type HmacSha1 = Hmac<Sha1>;

/// Status update endpoint, relative to the API base.
const UPDATE_PATH: &str = "/1.1/statuses/update.json";

/// Opens [`TwitterSession`]s.
#[derive(Debug, Clone)]
pub struct TwitterConnector {
    credentials: Credentials,
    api_base: String,
    timeout: Duration,
}

impl TwitterConnector {
    #[must_use]
    pub fn new(credentials: Credentials, config: &Config) -> Self {
        Self {
            credentials,
            api_base: config.publish_api_base.clone(),
            timeout: config.request_timeout,
        }
    }
}

impl Connector for TwitterConnector {
    type Session = TwitterSession;

    fn connect(&self) -> Result<TwitterSession, PostError> {
        let endpoint = Url::parse(&self.api_base)
            .and_then(|base| base.join(UPDATE_PATH))
            .map_err(|e| PostError::Setup(format!("invalid API base {}: {e}", self.api_base)))?;

        let client = reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| PostError::Setup(format!("failed to build HTTP client: {e}")))?;

        Ok(TwitterSession {
            client,
            endpoint,
            credentials: self.credentials.clone(),
        })
    }
}

/// An authenticated session used for every post in a run.
#[derive(Debug)]
pub struct TwitterSession {
    client: reqwest::Client,
    endpoint: Url,
    credentials: Credentials,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    errors: Vec<ApiErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    code: Option<u32>,
    message: Option<String>,
}

#[async_trait]
impl StatusPoster for TwitterSession {
    async fn post_status(&self, text: &str) -> Result<(), PostError> {
        let params = [("status", text)];
        let nonce = uuid::Uuid::new_v4().simple().to_string();
        let timestamp = chrono::Utc::now().timestamp().to_string();
        let authorization = authorization_header(
            &self.credentials,
            "POST",
            self.endpoint.as_str(),
            &params,
            &nonce,
            &timestamp,
        )?;

        let body = format!("status={}", percent_encode(text));
        debug!(endpoint = %self.endpoint, len = text.len(), "Posting status");

        let response = self
            .client
            .post(self.endpoint.clone())
            .header(AUTHORIZATION, authorization)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(body)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let raw = response.text().await.unwrap_or_default();
        let detail = serde_json::from_str::<ErrorBody>(&raw)
            .ok()
            .and_then(|body| body.errors.into_iter().next());

        Err(PostError::Api {
            status,
            code: detail.as_ref().and_then(|d| d.code),
            message: detail
                .and_then(|d| d.message)
                .unwrap_or_else(|| "unknown issue".to_string()),
        })
    }
}

/// RFC 3986 encoding as OAuth 1.0a requires: everything but `A-Za-z0-9-._~`.
fn percent_encode(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}

/// Compute the HMAC-SHA1 signature over a request.
///
/// `params` holds every query and form parameter plus the `oauth_*` values
/// except the signature itself.
fn signature(
    method: &str,
    url: &str,
    params: &[(&str, &str)],
    consumer_secret: &str,
    token_secret: &str,
) -> Result<String, PostError> {
    let mut encoded: Vec<(String, String)> = params
        .iter()
        .map(|(k, v)| (percent_encode(k), percent_encode(v)))
        .collect();
    encoded.sort();

    let parameter_string = encoded
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");

    let base = format!(
        "{}&{}&{}",
        method.to_ascii_uppercase(),
        percent_encode(url),
        percent_encode(&parameter_string)
    );
    let key = format!("{}&{}", percent_encode(consumer_secret), percent_encode(token_secret));

    let mut mac = HmacSha1::new_from_slice(key.as_bytes())
        .map_err(|e| PostError::Setup(format!("invalid signing key: {e}")))?;
    mac.update(base.as_bytes());
    Ok(STANDARD.encode(mac.finalize().into_bytes()))
}

/// Build the `Authorization: OAuth ...` header value.
fn authorization_header(
    credentials: &Credentials,
    method: &str,
    url: &str,
    request_params: &[(&str, &str)],
    nonce: &str,
    timestamp: &str,
) -> Result<String, PostError> {
    let oauth = [
        ("oauth_consumer_key", credentials.consumer_key.as_str()),
        ("oauth_nonce", nonce),
        ("oauth_signature_method", "HMAC-SHA1"),
        ("oauth_timestamp", timestamp),
        ("oauth_token", credentials.token_key.as_str()),
        ("oauth_version", "1.0"),
    ];

    let mut all: Vec<(&str, &str)> = oauth.to_vec();
    all.extend_from_slice(request_params);
    let signature = signature(
        method,
        url,
        &all,
        &credentials.consumer_secret,
        &credentials.token_secret,
    )?;

    let mut fields: Vec<String> = oauth
        .iter()
        .map(|(k, v)| format!("{}=\"{}\"", percent_encode(k), percent_encode(v)))
        .collect();
    fields.push(format!("oauth_signature=\"{}\"", percent_encode(&signature)));
    fields.sort();

    Ok(format!("OAuth {}", fields.join(", ")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;
    use serde_json::json;
    use wiremock::matchers::{body_string, header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::publish::FailureClass;

    // Reference request from Twitter's "Creating a signature" guide.
    const STATUS: &str = "Hello Ladies + Gentlemen, a signed OAuth request!";

    fn reference_credentials() -> Credentials {
        Credentials {
            consumer_key: "xvz1evFS4wEEPTGEFPHBog".to_string(),
            consumer_secret: "kAcSOqF21Fu85e7zjz7ZN2U4ZRhfV3WpwPAoE3Z7kBw".to_string(),
            token_key: "370773112-GmHxMAgYyLbNEtIKZeRNFsMKPR9EyMZeS9weJAEb".to_string(),
            token_secret: "LswwdoUaIvS8ltyTt5jkRh4J50vUPVVHtR2YPi5kE".to_string(),
        }
    }

    #[test]
    fn test_reference_signature() {
        let creds = reference_credentials();
        let params = [
            ("include_entities", "true"),
            ("oauth_consumer_key", creds.consumer_key.as_str()),
            ("oauth_nonce", "kYjzVBB8Y0ZFabxSWbWovY3uYSQ2pTgmZeNu2VS4cg"),
            ("oauth_signature_method", "HMAC-SHA1"),
            ("oauth_timestamp", "1318622958"),
            ("oauth_token", creds.token_key.as_str()),
            ("oauth_version", "1.0"),
            ("status", STATUS),
        ];
        let sig = signature(
            "POST",
            "https://api.twitter.com/1.1/statuses/update.json",
            &params,
            &creds.consumer_secret,
            &creds.token_secret,
        )
        .unwrap();
        assert_eq!(sig, "hCtSmYh+iHYCEqBWrE7C7hYmtUk=");
    }

    #[test]
    fn test_percent_encoding() {
        assert_eq!(
            percent_encode(STATUS),
            "Hello%20Ladies%20%2B%20Gentlemen%2C%20a%20signed%20OAuth%20request%21"
        );
        assert_eq!(percent_encode("a-b_c.d~e"), "a-b_c.d~e");
    }

    #[test]
    fn test_authorization_header_fields() {
        let header = authorization_header(
            &reference_credentials(),
            "POST",
            "https://api.twitter.com/1.1/statuses/update.json",
            &[("status", "hi")],
            "nonce",
            "1",
        )
        .unwrap();
        assert!(header.starts_with("OAuth "));
        for field in [
            "oauth_consumer_key=\"xvz1evFS4wEEPTGEFPHBog\"",
            "oauth_nonce=\"nonce\"",
            "oauth_signature=\"",
            "oauth_signature_method=\"HMAC-SHA1\"",
            "oauth_timestamp=\"1\"",
            "oauth_version=\"1.0\"",
        ] {
            assert!(header.contains(field), "{field} missing from {header}");
        }
        assert!(!header.contains("status="));
    }

    fn session_for(server: &MockServer) -> TwitterSession {
        let config = Config {
            publish_api_base: server.uri(),
            ..Config::default()
        };
        TwitterConnector::new(reference_credentials(), &config)
            .connect()
            .unwrap()
    }

    #[tokio::test]
    async fn test_post_status_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(UPDATE_PATH))
            .and(header_exists("authorization"))
            .and(body_string("status=New%20revision%2003%20of%20Foo"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 1})))
            .expect(1)
            .mount(&server)
            .await;

        session_for(&server)
            .post_status("New revision 03 of Foo")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_error_body_is_decoded() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(UPDATE_PATH))
            .respond_with(ResponseTemplate::new(403).set_body_json(json!({
                "errors": [{"code": 187, "message": "Status is a duplicate."}]
            })))
            .mount(&server)
            .await;

        let err = session_for(&server).post_status("hi").await.unwrap_err();
        match &err {
            PostError::Api {
                status,
                code,
                message,
            } => {
                assert_eq!(*status, StatusCode::FORBIDDEN);
                assert_eq!(*code, Some(187));
                assert_eq!(message, "Status is a duplicate.");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(err.class(), FailureClass::Duplicate);
    }

    #[tokio::test]
    async fn test_bare_429_is_rate_limited() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_string("Too Many Requests"))
            .mount(&server)
            .await;

        let err = session_for(&server).post_status("hi").await.unwrap_err();
        assert!(matches!(err, PostError::Api { code: None, .. }));
        assert_eq!(err.class(), FailureClass::RateLimited);
    }

    #[test]
    fn test_invalid_api_base_fails_connect() {
        let config = Config {
            publish_api_base: "::nope::".to_string(),
            ..Config::default()
        };
        let result = TwitterConnector::new(reference_credentials(), &config).connect();
        assert!(matches!(result, Err(PostError::Setup(_))));
    }
}
