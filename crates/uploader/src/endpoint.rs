//! Endpoint seam: abstract trait plus the reqwest implementation.

use std::future::Future;
use std::pin::Pin;

use handin_protocol::constants::TEXT_CONTENT_TYPE;
use reqwest::header::CONTENT_TYPE;

use crate::error::UploadError;

/// Raw reply from the endpoint, before JSON interpretation.
#[derive(Debug, Clone)]
pub struct EndpointReply {
    pub status: u16,
    pub content_type: String,
    pub body: String,
}

impl EndpointReply {
    /// `true` for 2xx statuses.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// `true` when the reply is a document rather than data — the usual
    /// shape of a misrouted or misdeployed intermediary.
    pub fn looks_like_html(&self) -> bool {
        self.content_type.to_ascii_lowercase().contains("text/html")
    }
}

/// Abstract submission endpoint.
///
/// Implemented over HTTP by [`HttpEndpoint`]; tests use scripted mocks.
/// The trait keeps the transport loop decoupled from the wire.
pub trait SubmissionEndpoint: Send + Sync {
    /// Posts one JSON text body and resolves to the raw reply.
    fn post(
        &self,
        body: String,
    ) -> Pin<Box<dyn Future<Output = Result<EndpointReply, UploadError>> + Send + '_>>;
}

/// Endpoint POSTing to a fixed URL.
///
/// Requests go out with a plain-text content type: the body is JSON, but a
/// JSON content type would trigger a CORS preflight the intermediary cannot
/// answer.
pub struct HttpEndpoint {
    http: reqwest::Client,
    url: String,
}

impl HttpEndpoint {
    /// Creates an endpoint for `url`.
    pub fn new(url: impl Into<String>) -> Result<Self, UploadError> {
        let http = reqwest::Client::builder().build()?;
        Ok(Self {
            http,
            url: url.into(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl SubmissionEndpoint for HttpEndpoint {
    fn post(
        &self,
        body: String,
    ) -> Pin<Box<dyn Future<Output = Result<EndpointReply, UploadError>> + Send + '_>> {
        Box::pin(async move {
            let resp = self
                .http
                .post(&self.url)
                .header(CONTENT_TYPE, TEXT_CONTENT_TYPE)
                .body(body)
                .send()
                .await?;

            let status = resp.status().as_u16();
            let content_type = resp
                .headers()
                .get(CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .unwrap_or_default()
                .to_string();
            let body = resp.text().await?;

            Ok(EndpointReply {
                status,
                content_type,
                body,
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reply_success_range() {
        let mut reply = EndpointReply {
            status: 200,
            content_type: "application/json".into(),
            body: String::new(),
        };
        assert!(reply.is_success());
        reply.status = 299;
        assert!(reply.is_success());
        reply.status = 302;
        assert!(!reply.is_success());
        reply.status = 500;
        assert!(!reply.is_success());
    }

    #[test]
    fn html_sniffing_is_case_insensitive() {
        let reply = EndpointReply {
            status: 200,
            content_type: "Text/HTML; charset=utf-8".into(),
            body: "<html></html>".into(),
        };
        assert!(reply.looks_like_html());
    }

    #[test]
    fn json_reply_is_not_html() {
        let reply = EndpointReply {
            status: 200,
            content_type: "application/json".into(),
            body: "{}".into(),
        };
        assert!(!reply.looks_like_html());
    }

    #[test]
    fn http_endpoint_keeps_url() {
        let ep = HttpEndpoint::new("https://example.com/upload").unwrap();
        assert_eq!(ep.url(), "https://example.com/upload");
    }
}
