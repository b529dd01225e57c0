//! Shared upstream HTTP context
//!
//! One `ContextClient` is built from `[upstream]` configuration and shared by
//! every lookup service, so connection pooling, timeouts and default headers
//! are configured in a single place.

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;

use super::error::{LookupError, Result};
use crate::config::{UpstreamConfig, ID_PLACEHOLDER};
use crate::logger;

pub struct ContextClient {
    client: Client,
}

impl ContextClient {
    pub fn new(config: &UpstreamConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        for (name, value) in &config.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| LookupError::Client(format!("invalid header name '{name}': {e}")))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| LookupError::Client(format!("invalid value for header '{name}': {e}")))?;
            headers.insert(name, value);
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout))
            .connect_timeout(Duration::from_secs(config.connect_timeout))
            .user_agent(config.user_agent.as_str())
            .default_headers(headers)
            .build()?;

        Ok(Self { client })
    }

    /// Fetch a JSON record
    ///
    /// Returns `Ok(None)` when the upstream has no record: a 404 or 204
    /// status, an empty body, or a JSON `null`. Errors never carry the URL;
    /// it is written to the error log instead.
    pub async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<Option<T>> {
        logger::log_upstream_request(url);
        let result = self.fetch(url).await;
        if let Err(ref err) = result {
            logger::log_error(&format!("[Upstream] GET {url} failed: {err}"));
        }
        result
    }

    async fn fetch<T: DeserializeOwned>(&self, url: &str) -> Result<Option<T>> {
        let response = self.client.get(url).send().await.map_err(redact)?;
        let status = response.status();

        if status == StatusCode::NOT_FOUND || status == StatusCode::NO_CONTENT {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(LookupError::Status {
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(redact)?;
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(None);
        }
        Ok(serde_json::from_slice::<Option<T>>(&body)?)
    }
}

fn redact(err: reqwest::Error) -> LookupError {
    LookupError::Transport(err.without_url())
}

/// Substitute the looked-up number into a URL template
pub fn expand_template(template: &str, id: &str) -> String {
    template.replace(ID_PLACEHOLDER, id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lookup::Person;
    use httpmock::prelude::*;
    use serde_json::json;

    fn client() -> ContextClient {
        ContextClient::new(&UpstreamConfig::default()).unwrap()
    }

    #[test]
    fn test_expand_template() {
        assert_eq!(
            expand_template("http://upstream/dni/{id}?full=1", "12345678"),
            "http://upstream/dni/12345678?full=1"
        );
    }

    #[test]
    fn test_invalid_header_rejected() {
        let mut config = UpstreamConfig::default();
        config
            .headers
            .insert("bad header".to_string(), "x".to_string());
        assert!(matches!(
            ContextClient::new(&config),
            Err(LookupError::Client(_))
        ));
    }

    #[tokio::test]
    async fn test_get_json_record() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/dni/12345678")
                    .header("x-api-key", "secret");
                then.status(200).json_body(json!({
                    "dni": "12345678",
                    "nombres": "ANA",
                    "apellidoPaterno": "QUISPE",
                    "apellidoMaterno": "MAMANI",
                    "codVerifica": "4"
                }));
            })
            .await;

        let mut config = UpstreamConfig::default();
        config
            .headers
            .insert("x-api-key".to_string(), "secret".to_string());
        let client = ContextClient::new(&config).unwrap();

        let person: Option<Person> = client
            .get_json(&server.url("/dni/12345678"))
            .await
            .unwrap();
        mock.assert_async().await;
        let person = person.unwrap();
        assert_eq!(person.nombres, "ANA");
        assert_eq!(person.cod_verifica.as_deref(), Some("4"));
    }

    #[tokio::test]
    async fn test_get_json_not_found_variants() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.path("/missing");
                then.status(404);
            })
            .await;
        server
            .mock_async(|when, then| {
                when.path("/null");
                then.status(200).body("null");
            })
            .await;
        server
            .mock_async(|when, then| {
                when.path("/empty");
                then.status(200).body("");
            })
            .await;

        let client = client();
        for path in ["/missing", "/null", "/empty"] {
            let result: Option<Person> = client.get_json(&server.url(path)).await.unwrap();
            assert!(result.is_none(), "{path} should be treated as not found");
        }
    }

    #[tokio::test]
    async fn test_get_json_upstream_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.path("/boom");
                then.status(502).body("bad gateway");
            })
            .await;

        let err = client()
            .get_json::<Person>(&server.url("/boom"))
            .await
            .unwrap_err();
        assert!(matches!(err, LookupError::Status { status: 502 }));
        assert!(err.to_string().contains("HTTP 502"));
    }

    #[tokio::test]
    async fn test_errors_hide_upstream_url() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.path("/ruc/20100070970");
                then.status(503);
            })
            .await;

        let client = client();
        let err = client
            .get_json::<Person>(&server.url("/ruc/20100070970?token=s3cr3t"))
            .await
            .unwrap_err();
        assert!(!err.to_string().contains("s3cr3t"), "{err}");
        assert!(!err.to_string().contains("20100070970"), "{err}");

        // Nothing listens on port 1
        let err = client
            .get_json::<Person>("http://127.0.0.1:1/dni/12345678?token=s3cr3t")
            .await
            .unwrap_err();
        assert!(matches!(err, LookupError::Transport(_)));
        assert!(!err.to_string().contains("s3cr3t"), "{err}");
    }

    #[tokio::test]
    async fn test_get_json_malformed_body() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.path("/html");
                then.status(200).body("<html>captcha</html>");
            })
            .await;

        let err = client()
            .get_json::<Person>(&server.url("/html"))
            .await
            .unwrap_err();
        assert!(matches!(err, LookupError::Decode(_)));
    }
}
