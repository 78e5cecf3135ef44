//! HTTP implementation of [`Authority`]
//!
//! Uses `ureq` for simple blocking HTTP. Each request runs on tokio's
//! blocking pool so the single-threaded event loop keeps drawing while it is
//! outstanding.

use super::{Authority, OperationRequest, OperationResponse};
use crate::errors::TransportError;
use std::time::Duration;

/// Path of the snapshot endpoint
pub const SNAPSHOT_PATH: &str = "/memory_blocks";
/// Path of the operation endpoint
pub const OPERATION_PATH: &str = "/operation";

#[derive(Debug, Clone)]
pub struct HttpAuthority {
    base_url: String,
    agent: ureq::Agent,
}

impl HttpAuthority {
    /// Create a client for the authority at `base_url`
    ///
    /// `timeout` bounds each request at the socket level as well; the sync
    /// and dispatch layers enforce their own deadline on top.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let agent = ureq::AgentBuilder::new().timeout(timeout).build();
        HttpAuthority { base_url, agent }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl Authority for HttpAuthority {
    async fn fetch_snapshot(&self) -> Result<String, TransportError> {
        let agent = self.agent.clone();
        let url = self.endpoint(SNAPSHOT_PATH);
        log::debug!("GET {}", url);

        run_blocking(move || {
            let response = agent.get(&url).call().map_err(transport_error)?;
            response
                .into_string()
                .map_err(|e| TransportError::Decode(e.to_string()))
        })
        .await
    }

    async fn submit(&self, request: &OperationRequest) -> Result<OperationResponse, TransportError> {
        let body =
            serde_json::to_string(request).map_err(|e| TransportError::Decode(e.to_string()))?;
        let agent = self.agent.clone();
        let url = self.endpoint(OPERATION_PATH);
        log::debug!("POST {} {}", url, body);

        run_blocking(move || {
            match agent
                .post(&url)
                .set("Content-Type", "application/json")
                .send_string(&body)
            {
                Ok(response) => {
                    let status = response.status();
                    let text = response
                        .into_string()
                        .map_err(|e| TransportError::Decode(e.to_string()))?;
                    verdict(status, &text)
                }
                Err(ureq::Error::Status(status, response)) => {
                    let text = response.into_string().unwrap_or_default();
                    verdict(status, &text)
                }
                Err(e) => Err(transport_error(e)),
            }
        })
        .await
    }
}

/// Map an operation response's status and body to the authority's verdict
///
/// An error status still counts as a verdict when its body is a
/// `success: false` response.
fn verdict(status: u16, text: &str) -> Result<OperationResponse, TransportError> {
    if (200..300).contains(&status) {
        return serde_json::from_str(text).map_err(|e| TransportError::Decode(e.to_string()));
    }
    match serde_json::from_str::<OperationResponse>(text) {
        Ok(response) if !response.success => Ok(response),
        _ => Err(TransportError::Status { status }),
    }
}

async fn run_blocking<T, F>(task: F) -> Result<T, TransportError>
where
    F: FnOnce() -> Result<T, TransportError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(task)
        .await
        .map_err(|e| TransportError::Network(format!("request task failed: {}", e)))?
}

fn transport_error(error: ureq::Error) -> TransportError {
    match error {
        ureq::Error::Status(status, _) => TransportError::Status { status },
        ureq::Error::Transport(transport) => TransportError::Network(transport.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoints_strip_trailing_slash() {
        let authority = HttpAuthority::new("http://127.0.0.1:5000/", Duration::from_secs(1));
        assert_eq!(authority.base_url(), "http://127.0.0.1:5000");
        assert_eq!(
            authority.endpoint(SNAPSHOT_PATH),
            "http://127.0.0.1:5000/memory_blocks"
        );
        assert_eq!(
            authority.endpoint(OPERATION_PATH),
            "http://127.0.0.1:5000/operation"
        );
    }

    #[test]
    fn test_success_status_decodes_body() {
        let response = verdict(200, r#"{"success": true, "message": "Process 4 allocated"}"#)
            .unwrap();
        assert_eq!(response, OperationResponse::ok("Process 4 allocated"));

        assert!(matches!(
            verdict(200, "not json"),
            Err(TransportError::Decode(_))
        ));
    }

    #[test]
    fn test_error_status_with_rejection_body_is_a_verdict() {
        let response = verdict(400, r#"{"success": false, "message": "Process 4 not found"}"#)
            .unwrap();
        assert_eq!(response, OperationResponse::failed("Process 4 not found"));
    }

    #[test]
    fn test_error_status_without_verdict_is_transport_error() {
        assert_eq!(
            verdict(500, "Internal Server Error"),
            Err(TransportError::Status { status: 500 })
        );
        // A success body under an error status is not trusted
        assert_eq!(
            verdict(502, r#"{"success": true}"#),
            Err(TransportError::Status { status: 502 })
        );
    }
}
