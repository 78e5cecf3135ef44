// Scripted in-memory authority shared by the integration tests

#![allow(dead_code)]

use memtty::authority::{Authority, OperationRequest, OperationResponse};
use memtty::errors::TransportError;
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::time::Duration;

/// One scripted answer to a snapshot request
pub enum Fetch {
    Body { body: String, delay: Duration },
    Fail(TransportError),
    Hang,
}

/// One scripted answer to an operation request
pub enum Submit {
    Reply {
        response: OperationResponse,
        delay: Duration,
    },
    Fail(TransportError),
    Hang,
}

#[derive(Default)]
pub struct ScriptedAuthority {
    fetches: RefCell<VecDeque<Fetch>>,
    submits: RefCell<VecDeque<Submit>>,
    fetch_count: Cell<usize>,
    submitted: RefCell<Vec<OperationRequest>>,
}

impl ScriptedAuthority {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self, body: String) -> &Self {
        self.snapshot_after(body, Duration::ZERO)
    }

    pub fn snapshot_after(&self, body: String, delay: Duration) -> &Self {
        self.fetches.borrow_mut().push_back(Fetch::Body { body, delay });
        self
    }

    pub fn fetch(&self, step: Fetch) -> &Self {
        self.fetches.borrow_mut().push_back(step);
        self
    }

    pub fn reply(&self, response: OperationResponse) -> &Self {
        self.reply_after(response, Duration::ZERO)
    }

    pub fn reply_after(&self, response: OperationResponse, delay: Duration) -> &Self {
        self.submits
            .borrow_mut()
            .push_back(Submit::Reply { response, delay });
        self
    }

    pub fn submit_step(&self, step: Submit) -> &Self {
        self.submits.borrow_mut().push_back(step);
        self
    }

    pub fn fetch_count(&self) -> usize {
        self.fetch_count.get()
    }

    pub fn submitted(&self) -> Vec<OperationRequest> {
        self.submitted.borrow().clone()
    }
}

impl Authority for ScriptedAuthority {
    async fn fetch_snapshot(&self) -> Result<String, TransportError> {
        self.fetch_count.set(self.fetch_count.get() + 1);
        let step = self.fetches.borrow_mut().pop_front();
        match step {
            Some(Fetch::Body { body, delay }) => {
                tokio::time::sleep(delay).await;
                Ok(body)
            }
            Some(Fetch::Fail(e)) => Err(e),
            Some(Fetch::Hang) => std::future::pending::<Result<String, TransportError>>().await,
            None => Err(TransportError::Network("no scripted snapshot".to_string())),
        }
    }

    async fn submit(&self, request: &OperationRequest) -> Result<OperationResponse, TransportError> {
        self.submitted.borrow_mut().push(request.clone());
        let step = self.submits.borrow_mut().pop_front();
        match step {
            Some(Submit::Reply { response, delay }) => {
                tokio::time::sleep(delay).await;
                Ok(response)
            }
            Some(Submit::Fail(e)) => Err(e),
            Some(Submit::Hang) => {
                std::future::pending::<Result<OperationResponse, TransportError>>().await
            }
            None => Err(TransportError::Network("no scripted response".to_string())),
        }
    }
}

/// Snapshot body in the authority's wire format
pub fn snapshot_json(total: u64, blocks: &[(u64, u64, Option<u64>)]) -> String {
    let blocks: Vec<serde_json::Value> = blocks
        .iter()
        .map(|&(base, size, pid)| serde_json::json!({ "base": base, "size": size, "pid": pid }))
        .collect();
    serde_json::json!({ "totalMemory": total, "blocks": blocks }).to_string()
}

/// Snapshot body that also names the active placement scheme
pub fn snapshot_with_scheme(total: u64, blocks: &[(u64, u64, Option<u64>)], scheme: &str) -> String {
    let mut value: serde_json::Value = match serde_json::from_str(&snapshot_json(total, blocks)) {
        Ok(value) => value,
        Err(e) => panic!("bad snapshot fixture: {}", e),
    };
    value["scheme"] = serde_json::Value::String(scheme.to_string());
    value.to_string()
}
