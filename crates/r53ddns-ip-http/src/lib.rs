// # HTTP IP Source
//
// Resolves the caller's public IP address with a single GET to a
// "what is my IP" service (ifconfig.me, api.ipify.org, icanhazip.com, ...)
// that answers with the address as plain text.
//
// ## Failure Model
//
// Any failure is logged at WARN and reported as `None`:
// - transport errors (DNS, connect, TLS)
// - non-2xx status codes
// - unreadable bodies
// - bodies that are not an IP address (e.g. an HTML error page)
//
// No retries and no timeout beyond the HTTP client defaults.

use r53ddns_core::config::DEFAULT_IP_LOOKUP_URL;
use r53ddns_core::traits::IpSource;
use r53ddns_core::{Error, Result};

use std::net::IpAddr;

/// HTTP-based public IP resolver
#[derive(Debug, Clone)]
pub struct HttpIpSource {
    /// URL to fetch the IP from
    url: String,

    /// HTTP client
    client: reqwest::Client,
}

impl HttpIpSource {
    /// Create a new HTTP IP source
    ///
    /// # Parameters
    ///
    /// - `url`: URL answering with the caller's IP as plain text
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            client: reqwest::Client::new(),
        }
    }

    /// The URL this source queries
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Fetch the current IP, reporting why resolution failed
    ///
    /// The returned value is the trimmed response body.
    pub async fn fetch_ip(&self) -> Result<String> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| Error::http(format!("Request to {} failed: {}", self.url, e)))?;

        if !response.status().is_success() {
            return Err(Error::http(format!(
                "{} answered with status {}",
                self.url,
                response.status()
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| Error::http(format!("Failed to read response: {}", e)))?;

        let ip_text = body.trim();
        ip_text
            .parse::<IpAddr>()
            .map_err(|_| Error::ip_source(format!("Invalid IP address in response: {:?}", ip_text)))?;

        Ok(ip_text.to_string())
    }
}

impl Default for HttpIpSource {
    fn default() -> Self {
        Self::new(DEFAULT_IP_LOOKUP_URL)
    }
}

#[async_trait::async_trait]
impl IpSource for HttpIpSource {
    async fn resolve(&self) -> Option<String> {
        match self.fetch_ip().await {
            Ok(ip) => {
                tracing::debug!("Resolved public IP {} via {}", ip, self.url);
                Some(ip)
            }
            Err(e) => {
                tracing::warn!("Public IP lookup failed: {}", e);
                None
            }
        }
    }

    fn source_name(&self) -> &'static str {
        "http"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn source_answering(template: ResponseTemplate) -> (MockServer, HttpIpSource) {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ip"))
            .respond_with(template)
            .expect(1)
            .mount(&server)
            .await;

        let source = HttpIpSource::new(format!("{}/ip", server.uri()));
        (server, source)
    }

    #[test]
    fn default_url() {
        assert_eq!(HttpIpSource::default().url(), "https://ifconfig.me/ip");
    }

    #[tokio::test]
    async fn resolves_plain_text_ip() {
        let (_server, source) =
            source_answering(ResponseTemplate::new(200).set_body_string("203.0.113.7")).await;

        assert_eq!(source.resolve().await.as_deref(), Some("203.0.113.7"));
    }

    #[tokio::test]
    async fn trims_trailing_newline() {
        let (_server, source) =
            source_answering(ResponseTemplate::new(200).set_body_string("2001:db8::7\n")).await;

        assert_eq!(source.resolve().await.as_deref(), Some("2001:db8::7"));
    }

    #[tokio::test]
    async fn error_status_is_absent() {
        let (_server, source) =
            source_answering(ResponseTemplate::new(503).set_body_string("203.0.113.7")).await;

        assert_eq!(source.resolve().await, None);
    }

    #[tokio::test]
    async fn non_ip_body_is_absent() {
        let (_server, source) = source_answering(
            ResponseTemplate::new(200).set_body_string("<html>rate limited</html>"),
        )
        .await;

        assert_eq!(source.resolve().await, None);
    }

    #[tokio::test]
    async fn non_ip_body_is_a_fetch_error() {
        let (_server, source) = source_answering(
            ResponseTemplate::new(200).set_body_string("<html>rate limited</html>"),
        )
        .await;

        let err = source.fetch_ip().await.unwrap_err();
        assert!(matches!(err, Error::IpSource(_)), "got {:?}", err);
    }

    #[tokio::test]
    async fn unreachable_service_is_absent() {
        let server = MockServer::start().await;
        let url = format!("{}/ip", server.uri());
        drop(server);

        let source = HttpIpSource::new(url);
        assert_eq!(source.resolve().await, None);
    }
}
