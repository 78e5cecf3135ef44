//! Error types for every layer of the client
//!
//! The four user-facing failure classes are:
//!
//! - [`ValidationError`]: a snapshot failed structural or invariant checks.
//!   The fetch is dropped and the previous map stays in place.
//! - [`TransportError`]: the network call failed or timed out. Nothing
//!   changes; the operator may retry.
//! - [`ApplicationError`]: the operation was refused, either by a local
//!   precondition or by the authority itself.
//! - [`DispatchError::Busy`]: another operation is still pending.
//!
//! Component seams combine them into [`SyncError`] and [`DispatchError`].

use crate::model::{ProcessId, Scheme};
use std::time::Duration;
use thiserror::Error;

/// A single broken invariant found in a snapshot
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvariantViolation {
    #[error("first block starts at {base}, not 0")]
    DoesNotStartAtZero { base: u64 },

    #[error("gap before block {index}: expected base {expected}, found {found}")]
    Gap { index: usize, expected: u64, found: u64 },

    #[error("block {index} overlaps its predecessor: expected base {expected}, found {found}")]
    Overlap { index: usize, expected: u64, found: u64 },

    #[error("blocks end at {end} but total memory is {total}")]
    CoverageMismatch { end: u64, total: u64 },

    #[error("block {index} extends past the address space")]
    AddressOverflow { index: usize },

    #[error("process {0} occupies more than one block")]
    DuplicateOccupant(ProcessId),

    #[error("block {index} and the block after it are both free")]
    AdjacentFree { index: usize },
}

impl InvariantViolation {
    /// Whether parsing may fix this violation instead of rejecting the snapshot
    pub fn is_repairable(&self) -> bool {
        matches!(self, InvariantViolation::AdjacentFree { .. })
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("malformed snapshot: {0}")]
    Malformed(String),

    #[error("block {index} at base {base} has zero size")]
    ZeroSizedBlock { index: usize, base: u64 },

    #[error("snapshot violates memory map invariants: {}", join_violations(.0))]
    Invariants(Vec<InvariantViolation>),
}

fn join_violations(violations: &[InvariantViolation]) -> String {
    violations
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("request timed out after {} ms", .0.as_millis())]
    Timeout(Duration),

    #[error("authority returned HTTP {status}")]
    Status { status: u16 },

    #[error("network error: {0}")]
    Network(String),

    #[error("undecodable response: {0}")]
    Decode(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApplicationError {
    #[error("allocation size must be greater than zero")]
    ZeroSize,

    #[error("process {0} already holds a block")]
    DuplicateProcess(ProcessId),

    #[error("process {0} not found")]
    UnknownProcess(ProcessId),

    #[error("unrecognized scheme '{0}' (expected one of: {})", Scheme::recognized_labels())]
    UnrecognizedScheme(Scheme),

    #[error("{0}")]
    Rejected(String),
}

impl ApplicationError {
    /// True when the request never left the client
    pub fn is_local(&self) -> bool {
        !matches!(self, ApplicationError::Rejected(_))
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SyncError {
    #[error("refresh failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("refresh failed: {0}")]
    Transport(#[from] TransportError),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    #[error("busy: {pending} still pending")]
    Busy { pending: &'static str },

    #[error("{0}")]
    Transport(#[from] TransportError),

    #[error("{0}")]
    Application(#[from] ApplicationError),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TranslationError {
    #[error("process {0} not found")]
    UnknownProcess(ProcessId),

    #[error("address {address} is outside process {pid} (size {size})")]
    OutOfRange {
        pid: ProcessId,
        address: u64,
        size: u64,
    },
}
