//! Boundary with the remote allocation authority
//!
//! The authority owns the real allocator. The client only ever asks it for
//! a snapshot or submits one operation, through the [`Authority`] trait:
//!
//! - `GET  /memory_blocks` returns the snapshot body (see [`crate::model::RawSnapshot`])
//! - `POST /operation` takes an [`OperationRequest`] and answers with an
//!   [`OperationResponse`]
//!
//! [`http::HttpAuthority`] is the production implementation. Tests provide
//! their own in-memory implementations.

pub mod http;

use crate::errors::TransportError;
use crate::model::{ProcessId, Scheme};
use serde::{Deserialize, Serialize};

pub use http::HttpAuthority;

/// Request body for `POST /operation`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum OperationRequest {
    Create {
        pid: ProcessId,
        size: u64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        strategy: Option<Scheme>,
    },
    Delete {
        pid: ProcessId,
    },
    Convert {
        scheme: Scheme,
    },
}

impl OperationRequest {
    pub fn kind(&self) -> OperationKind {
        match self {
            OperationRequest::Create { .. } => OperationKind::Create,
            OperationRequest::Delete { .. } => OperationKind::Delete,
            OperationRequest::Convert { .. } => OperationKind::Convert,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    Create,
    Delete,
    Convert,
}

impl OperationKind {
    pub fn name(&self) -> &'static str {
        match self {
            OperationKind::Create => "create",
            OperationKind::Delete => "delete",
            OperationKind::Convert => "convert",
        }
    }
}

/// Response body for `POST /operation`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationResponse {
    pub success: bool,
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pid: Option<ProcessId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,
}

impl OperationResponse {
    pub fn ok(message: impl Into<String>) -> Self {
        OperationResponse {
            success: true,
            message: message.into(),
            pid: None,
            base: None,
            limit: None,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        OperationResponse {
            success: false,
            ..OperationResponse::ok(message)
        }
    }
}

/// The remote side of the memory map
///
/// The client is single-threaded, so implementations may return futures
/// that are not `Send`. Timeouts are applied by the caller.
#[allow(async_fn_in_trait)]
pub trait Authority {
    /// Fetch the raw snapshot body
    async fn fetch_snapshot(&self) -> Result<String, TransportError>;

    /// Submit one operation and return the authority's verdict
    async fn submit(&self, request: &OperationRequest) -> Result<OperationResponse, TransportError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_wire_format() {
        let create = OperationRequest::Create {
            pid: ProcessId(7),
            size: 300,
            strategy: None,
        };
        assert_eq!(
            serde_json::to_string(&create).unwrap(),
            r#"{"action":"create","pid":7,"size":300}"#
        );

        let hinted = OperationRequest::Create {
            pid: ProcessId(7),
            size: 300,
            strategy: Some(Scheme::BestFit),
        };
        assert_eq!(
            serde_json::to_string(&hinted).unwrap(),
            r#"{"action":"create","pid":7,"size":300,"strategy":"best-fit"}"#
        );

        assert_eq!(
            serde_json::to_string(&OperationRequest::Delete { pid: ProcessId(3) }).unwrap(),
            r#"{"action":"delete","pid":3}"#
        );
        assert_eq!(
            serde_json::to_string(&OperationRequest::Convert {
                scheme: Scheme::Compaction
            })
            .unwrap(),
            r#"{"action":"convert","scheme":"compaction"}"#
        );
    }

    #[test]
    fn test_response_with_placement() {
        let body = r#"{"success": true, "message": "Process 1 created.", "pid": 1, "base": 0, "limit": 299}"#;
        let response: OperationResponse = serde_json::from_str(body).unwrap();
        assert!(response.success);
        assert_eq!(response.pid, Some(ProcessId(1)));
        assert_eq!(response.limit, Some(299));
    }

    #[test]
    fn test_response_without_message() {
        let response: OperationResponse = serde_json::from_str(r#"{"success": false}"#).unwrap();
        assert_eq!(response, OperationResponse::failed(""));
    }
}
