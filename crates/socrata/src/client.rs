//! Transport seam: one GET against a Socrata portal, parsed as JSON.

use crate::error::RemoteError;
use async_trait::async_trait;
use serde_json::Value;

const USER_AGENT: &str = concat!("opengov-socrata/", env!("CARGO_PKG_VERSION"));
const APP_TOKEN_HEADER: &str = "X-App-Token";

/// Issues a GET to `base_url + path` with the given query pairs and returns
/// the parsed JSON body.
///
/// Every engine operation goes through this trait so tests can swap in an
/// in-memory portal.
#[async_trait]
pub trait SocrataApi: Send + Sync {
    async fn fetch(
        &self,
        base_url: &str,
        path: &str,
        params: &[(String, String)],
    ) -> Result<Value, RemoteError>;
}

/// Normalizes a portal domain into a base URL.
///
/// Bare hosts get an `https://` scheme; explicit `http://` or `https://`
/// prefixes are kept. Trailing slashes are dropped.
pub fn base_url_for(domain: &str) -> String {
    let trimmed = domain.trim().trim_end_matches('/');
    if trimmed.starts_with("https://") || trimmed.starts_with("http://") {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    }
}

/// Returns the bare host of a domain or base URL (no scheme, no path).
pub fn domain_host(domain: &str) -> &str {
    let trimmed = domain.trim();
    let without_scheme = trimmed
        .strip_prefix("https://")
        .or_else(|| trimmed.strip_prefix("http://"))
        .unwrap_or(trimmed);
    without_scheme
        .split('/')
        .next()
        .unwrap_or(without_scheme)
}

/// `SocrataApi` over HTTPS using a shared `reqwest` client.
#[derive(Clone)]
pub struct HttpSocrataApi {
    client: reqwest::Client,
    app_token: Option<String>,
}

impl HttpSocrataApi {
    /// Builds a client with the configured timeout and app token.
    pub fn from_env() -> Result<Self, RemoteError> {
        let client = reqwest::Client::builder()
            .timeout(opengov_state::http_timeout())
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| RemoteError::Request(e.to_string()))?;
        Ok(Self {
            client,
            app_token: opengov_state::app_token(),
        })
    }

    pub fn with_app_token(mut self, token: Option<String>) -> Self {
        self.app_token = token.filter(|t| !t.trim().is_empty());
        self
    }

    fn request(&self, url: &str, params: &[(String, String)]) -> reqwest::RequestBuilder {
        let builder = self
            .client
            .get(url)
            .query(params)
            .header(reqwest::header::ACCEPT, "application/json");
        match &self.app_token {
            Some(token) => builder.header(APP_TOKEN_HEADER, token),
            None => builder,
        }
    }
}

#[async_trait]
impl SocrataApi for HttpSocrataApi {
    async fn fetch(
        &self,
        base_url: &str,
        path: &str,
        params: &[(String, String)],
    ) -> Result<Value, RemoteError> {
        let url = format!("{}{}", base_url.trim_end_matches('/'), path);
        tracing::debug!(target: "opengov::fetch", %url, params = params.len(), "GET");

        let response = self
            .request(&url, params)
            .send()
            .await
            .map_err(|e| classify(&url, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let err = RemoteError::Api {
                status: status.as_u16(),
                status_text: status.canonical_reason().unwrap_or_default().to_string(),
                body,
            };
            tracing::warn!(target: "opengov::fetch", %url, kind = err.kind(), status = status.as_u16(), "Socrata request failed");
            return Err(err);
        }

        let text = response.text().await.map_err(|e| classify(&url, e))?;
        serde_json::from_str(&text).map_err(|e| {
            tracing::warn!(target: "opengov::fetch", %url, error = %e, "response body is not JSON");
            RemoteError::InvalidBody(e.to_string())
        })
    }
}

fn classify(url: &str, err: reqwest::Error) -> RemoteError {
    let err = if err.is_builder() {
        RemoteError::Request(err.to_string())
    } else {
        RemoteError::Unreachable(err.to_string())
    };
    tracing::warn!(target: "opengov::fetch", %url, kind = err.kind(), error = %err, "Socrata request failed");
    err
}

#[cfg(test)]
mod tests {
    use super::*;
    use opengov_test_utils::{env_guard, set_env_var};
    use serde_json::json;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn api() -> HttpSocrataApi {
        HttpSocrataApi {
            client: reqwest::Client::new(),
            app_token: None,
        }
    }

    fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_base_url_adds_https_to_bare_host() {
        assert_eq!(
            base_url_for("data.cityofchicago.org"),
            "https://data.cityofchicago.org"
        );
    }

    #[test]
    fn test_base_url_keeps_explicit_scheme() {
        assert_eq!(base_url_for("http://localhost:8080/"), "http://localhost:8080");
        assert_eq!(
            base_url_for("  https://data.sfgov.org  "),
            "https://data.sfgov.org"
        );
    }

    #[test]
    fn test_domain_host_strips_scheme_and_path() {
        assert_eq!(domain_host("https://data.sfgov.org/"), "data.sfgov.org");
        assert_eq!(domain_host("data.ny.gov"), "data.ny.gov");
        assert_eq!(domain_host("http://127.0.0.1:9000/api"), "127.0.0.1:9000");
    }

    #[tokio::test]
    async fn test_fetch_sends_query_pairs_and_parses_json() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/resource/abcd-1234.json"))
            .and(query_param("$limit", "5"))
            .and(query_param("$where", "ward = '3'"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"ward": "3"}])))
            .expect(1)
            .mount(&server)
            .await;

        let body = api()
            .fetch(
                &server.uri(),
                "/resource/abcd-1234.json",
                &pairs(&[("$limit", "5"), ("$where", "ward = '3'")]),
            )
            .await
            .unwrap();
        assert_eq!(body, json!([{"ward": "3"}]));
    }

    #[tokio::test]
    async fn test_fetch_attaches_app_token_header() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(header("X-App-Token", "tok-123"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(1)
            .mount(&server)
            .await;

        let client = api().with_app_token(Some("tok-123".into()));
        client
            .fetch(&server.uri(), "/resource/x.json", &[])
            .await
            .unwrap();
    }

    #[test]
    fn test_from_env_picks_up_app_token() {
        let _g = env_guard();
        let _token = set_env_var(opengov_state::ENV_APP_TOKEN, Some(" tok-env "));
        let client = HttpSocrataApi::from_env().unwrap();
        assert_eq!(client.app_token.as_deref(), Some("tok-env"));
    }

    #[test]
    fn test_blank_app_token_is_ignored() {
        let client = api().with_app_token(Some("   ".into()));
        assert!(client.app_token.is_none());
    }

    #[tokio::test]
    async fn test_fetch_maps_http_errors_with_status_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404).set_body_string("dataset.missing"))
            .mount(&server)
            .await;

        let err = api()
            .fetch(&server.uri(), "/resource/nope-nope.json", &[])
            .await
            .unwrap_err();
        match err {
            RemoteError::Api {
                status,
                status_text,
                body,
            } => {
                assert_eq!(status, 404);
                assert_eq!(status_text, "Not Found");
                assert_eq!(body, "dataset.missing");
            }
            other => panic!("expected Api error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_fetch_rejects_non_json_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
            .mount(&server)
            .await;

        let err = api()
            .fetch(&server.uri(), "/resource/x.json", &[])
            .await
            .unwrap_err();
        assert!(matches!(err, RemoteError::InvalidBody(_)), "{err:?}");
    }

    #[tokio::test]
    async fn test_fetch_reports_unreachable_host() {
        // Bind and drop a listener so the port is known to be closed.
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let err = api()
            .fetch(&format!("http://127.0.0.1:{port}"), "/resource/x.json", &[])
            .await
            .unwrap_err();
        assert!(matches!(err, RemoteError::Unreachable(_)), "{err:?}");
    }
}
