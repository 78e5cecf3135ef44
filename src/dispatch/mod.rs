//! Submits create/delete/convert operations to the authority
//!
//! Only one operation of any kind may be outstanding. A submission made
//! while another is pending fails with [`DispatchError::Busy`] instead of
//! being queued. Preconditions are checked against the current snapshot
//! before anything is sent; the authority stays the final arbiter.
//!
//! Every outcome is reported exactly once through the [`MessageChannel`].
//! A successful operation is followed by [`SyncController::resync`], whose
//! own failures are reported by the controller.

use crate::authority::{Authority, OperationKind, OperationRequest, OperationResponse};
use crate::errors::{ApplicationError, DispatchError, TransportError};
use crate::message::{MessageChannel, Severity};
use crate::model::{MemoryMap, ProcessId, Scheme};
use crate::sync::SyncController;
use rustc_hash::FxHashMap;
use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

/// Result of an operation the authority accepted
#[derive(Debug, Clone)]
pub struct Completion {
    pub kind: OperationKind,
    pub message: String,
    pub pid: Option<ProcessId>,
    pub base: Option<u64>,
    pub limit: Option<u64>,
    /// The map applied by the follow-up refresh, if that refresh succeeded
    pub snapshot: Option<Rc<MemoryMap>>,
}

/// Clears the pending slot when the operation settles
struct PendingGuard {
    slot: Rc<Cell<Option<OperationKind>>>,
}

impl Drop for PendingGuard {
    fn drop(&mut self) {
        self.slot.set(None);
    }
}

pub struct Dispatcher<A> {
    sync: SyncController<A>,
    channel: MessageChannel,
    pending: Rc<Cell<Option<OperationKind>>>,
    timeout: Duration,
}

impl<A> Clone for Dispatcher<A> {
    fn clone(&self) -> Self {
        Dispatcher {
            sync: self.sync.clone(),
            channel: self.channel.clone(),
            pending: Rc::clone(&self.pending),
            timeout: self.timeout,
        }
    }
}

impl<A: Authority + 'static> Dispatcher<A> {
    pub fn new(sync: SyncController<A>) -> Self {
        let channel = sync.channel().clone();
        let timeout = sync.timeout();
        Dispatcher {
            sync,
            channel,
            pending: Rc::new(Cell::new(None)),
            timeout,
        }
    }

    /// The operation currently awaiting the authority, if any
    pub fn pending(&self) -> Option<OperationKind> {
        self.pending.get()
    }

    pub async fn create(
        &self,
        pid: ProcessId,
        size: u64,
        strategy: Option<Scheme>,
    ) -> Result<Completion, DispatchError> {
        self.submit(OperationRequest::Create {
            pid,
            size,
            strategy,
        })
        .await
    }

    pub async fn delete(&self, pid: ProcessId) -> Result<Completion, DispatchError> {
        self.submit(OperationRequest::Delete { pid }).await
    }

    pub async fn convert(&self, scheme: Scheme) -> Result<Completion, DispatchError> {
        self.submit(OperationRequest::Convert { scheme }).await
    }

    async fn submit(&self, request: OperationRequest) -> Result<Completion, DispatchError> {
        let result = self.execute(request).await;
        match &result {
            Ok(completion) => {
                log::debug!("{} completed", completion.kind.name());
            }
            Err(e) => self.channel.report(e.to_string(), Severity::Error),
        }
        result
    }

    async fn execute(&self, request: OperationRequest) -> Result<Completion, DispatchError> {
        let kind = request.kind();
        let _guard = self.begin(kind)?;

        let before = self.sync.snapshot();
        check_preconditions(&before, &request)?;

        log::info!("submitting {:?}", request);
        let response = match tokio::time::timeout(self.timeout, self.sync.authority().submit(&request))
            .await
        {
            Ok(response) => response?,
            Err(_) => return Err(TransportError::Timeout(self.timeout).into()),
        };

        let OperationResponse {
            success,
            message,
            pid,
            base,
            limit,
        } = response;
        if !success {
            let message = if message.is_empty() {
                format!("{} rejected by authority", kind.name())
            } else {
                message
            };
            return Err(ApplicationError::Rejected(message).into());
        }

        let message = if message.is_empty() {
            format!("{} succeeded", kind.name())
        } else {
            message
        };
        self.channel.report(message.clone(), Severity::Info);

        let snapshot = self.sync.resync().await.ok();
        if kind == OperationKind::Convert {
            if let Some(after) = &snapshot {
                if allocations(&before) != allocations(after) {
                    log::warn!("convert changed the set of allocations");
                }
            }
        }

        Ok(Completion {
            kind,
            message,
            pid,
            base,
            limit,
            snapshot,
        })
    }

    fn begin(&self, kind: OperationKind) -> Result<PendingGuard, DispatchError> {
        if let Some(pending) = self.pending.get() {
            log::debug!("{} rejected while {} is pending", kind.name(), pending.name());
            return Err(DispatchError::Busy {
                pending: pending.name(),
            });
        }
        self.pending.set(Some(kind));
        Ok(PendingGuard {
            slot: Rc::clone(&self.pending),
        })
    }
}

/// Client-side checks made before a request is sent
pub fn check_preconditions(
    map: &MemoryMap,
    request: &OperationRequest,
) -> Result<(), ApplicationError> {
    match request {
        OperationRequest::Create {
            pid,
            size,
            strategy,
        } => {
            if *size == 0 {
                return Err(ApplicationError::ZeroSize);
            }
            if map.contains(*pid) {
                return Err(ApplicationError::DuplicateProcess(*pid));
            }
            if let Some(scheme) = strategy {
                if !scheme.is_recognized() {
                    return Err(ApplicationError::UnrecognizedScheme(scheme.clone()));
                }
            }
        }
        OperationRequest::Delete { pid } => {
            if !map.contains(*pid) {
                return Err(ApplicationError::UnknownProcess(*pid));
            }
        }
        OperationRequest::Convert { scheme } => {
            if !scheme.is_recognized() {
                return Err(ApplicationError::UnrecognizedScheme(scheme.clone()));
            }
        }
    }
    Ok(())
}

fn allocations(map: &MemoryMap) -> FxHashMap<ProcessId, u64> {
    map.blocks()
        .iter()
        .filter_map(|b| b.occupant.map(|pid| (pid, b.size)))
        .collect()
}
