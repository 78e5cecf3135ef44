//! Client-side model of the remote memory map
//!
//! A [`MemoryMap`] is a partition of a fixed-size address space into
//! contiguous [`Block`]s, each either free or owned by one process. Maps are
//! only ever produced by [`parse`], so every value a caller can hold has
//! passed the invariant checks:
//!
//! 1. blocks are contiguous and non-overlapping,
//! 2. they cover `0..total_memory` exactly (when there are any),
//! 3. no process owns more than one block,
//! 4. no two neighbouring blocks are both free.
//!
//! Violations of 1-3 reject the payload. Neighbouring free blocks (4) are
//! merged during parsing instead.
//!
//! Blocks carry no identity between snapshots: a block that survives an
//! unrelated operation is an equal value, nothing more.

pub mod scheme;

use crate::errors::{InvariantViolation, TranslationError, ValidationError};
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use std::fmt;

pub use scheme::Scheme;

/// Opaque identifier of a process owning a block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProcessId(pub u64);

impl fmt::Display for ProcessId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A contiguous extent of the address space
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Block {
    pub base: u64,
    pub size: u64,
    pub occupant: Option<ProcessId>,
}

impl Block {
    pub fn free(base: u64, size: u64) -> Self {
        Block {
            base,
            size,
            occupant: None,
        }
    }

    pub fn allocated(base: u64, size: u64, pid: ProcessId) -> Self {
        Block {
            base,
            size,
            occupant: Some(pid),
        }
    }

    pub fn is_free(&self) -> bool {
        self.occupant.is_none()
    }

    /// One past the last address covered by this block
    pub fn end(&self) -> u64 {
        self.base + self.size
    }

    /// Last address covered by this block
    pub fn limit(&self) -> u64 {
        self.end().saturating_sub(1)
    }
}

/// Block entry exactly as the authority sends it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawBlock {
    pub base: u64,
    pub size: u64,
    #[serde(default)]
    pub pid: Option<ProcessId>,
}

/// Snapshot body of `GET /memory_blocks`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSnapshot {
    pub total_memory: u64,
    #[serde(default)]
    pub blocks: Vec<RawBlock>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheme: Option<String>,
}

/// Validated memory map
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MemoryMap {
    total_memory: u64,
    blocks: Vec<Block>,
    scheme: Option<Scheme>,
}

impl MemoryMap {
    /// The map shown before the first successful fetch
    pub fn empty() -> Self {
        MemoryMap::default()
    }

    pub fn total_memory(&self) -> u64 {
        self.total_memory
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// Placement scheme the authority reported with this snapshot, if any
    pub fn scheme(&self) -> Option<&Scheme> {
        self.scheme.as_ref()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn find(&self, pid: ProcessId) -> Option<&Block> {
        self.blocks.iter().find(|b| b.occupant == Some(pid))
    }

    pub fn contains(&self, pid: ProcessId) -> bool {
        self.find(pid).is_some()
    }

    pub fn used(&self) -> u64 {
        self.blocks
            .iter()
            .filter(|b| !b.is_free())
            .map(|b| b.size)
            .sum()
    }

    pub fn free(&self) -> u64 {
        self.total_memory.saturating_sub(self.used())
    }

    pub fn largest_free(&self) -> Option<&Block> {
        self.blocks
            .iter()
            .filter(|b| b.is_free())
            .max_by_key(|b| b.size)
    }

    pub fn process_count(&self) -> usize {
        self.blocks.iter().filter(|b| !b.is_free()).count()
    }

    /// Translate an address relative to a process's block into an absolute one
    pub fn translate(&self, pid: ProcessId, virtual_address: u64) -> Result<u64, TranslationError> {
        let block = self
            .find(pid)
            .ok_or(TranslationError::UnknownProcess(pid))?;
        if virtual_address >= block.size {
            return Err(TranslationError::OutOfRange {
                pid,
                address: virtual_address,
                size: block.size,
            });
        }
        Ok(block.base + virtual_address)
    }
}

/// Decode a snapshot body and parse it
pub fn parse_json(body: &str) -> Result<MemoryMap, ValidationError> {
    let raw: RawSnapshot =
        serde_json::from_str(body).map_err(|e| ValidationError::Malformed(e.to_string()))?;
    parse(raw)
}

/// Build a [`MemoryMap`] from an authority snapshot
///
/// Zero-sized blocks and any violation of invariants 1-3 reject the whole
/// payload. Adjacent free blocks are merged.
pub fn parse(raw: RawSnapshot) -> Result<MemoryMap, ValidationError> {
    if let Some(index) = raw.blocks.iter().position(|b| b.size == 0) {
        return Err(ValidationError::ZeroSizedBlock {
            index,
            base: raw.blocks[index].base,
        });
    }

    let mut map = MemoryMap {
        total_memory: raw.total_memory,
        blocks: raw
            .blocks
            .into_iter()
            .map(|b| Block {
                base: b.base,
                size: b.size,
                occupant: b.pid,
            })
            .collect(),
        scheme: raw.scheme.map(|s| Scheme::from_label(&s)),
    };

    if let Err(violations) = validate(&map) {
        let fatal: Vec<InvariantViolation> = violations
            .into_iter()
            .filter(|v| !v.is_repairable())
            .collect();
        if !fatal.is_empty() {
            return Err(ValidationError::Invariants(fatal));
        }
    }

    coalesce_free(&mut map.blocks);
    Ok(map)
}

/// Check every invariant and collect all violations
pub fn validate(map: &MemoryMap) -> Result<(), Vec<InvariantViolation>> {
    let mut violations = Vec::new();
    let blocks = &map.blocks;

    if let Some(first) = blocks.first() {
        if first.base != 0 {
            violations.push(InvariantViolation::DoesNotStartAtZero { base: first.base });
        }
    }

    for (index, pair) in blocks.windows(2).enumerate() {
        let (prev, next) = (&pair[0], &pair[1]);
        match checked_end(prev) {
            Some(end) if end == next.base => {}
            Some(end) if end > next.base => violations.push(InvariantViolation::Overlap {
                index: index + 1,
                expected: end,
                found: next.base,
            }),
            Some(end) => violations.push(InvariantViolation::Gap {
                index: index + 1,
                expected: end,
                found: next.base,
            }),
            None => violations.push(InvariantViolation::AddressOverflow { index }),
        }
        if prev.is_free() && next.is_free() {
            violations.push(InvariantViolation::AdjacentFree { index });
        }
    }

    match blocks.last() {
        None if map.total_memory > 0 => violations.push(InvariantViolation::CoverageMismatch {
            end: 0,
            total: map.total_memory,
        }),
        None => {}
        Some(last) => match checked_end(last) {
            Some(end) if end == map.total_memory => {}
            Some(end) => violations.push(InvariantViolation::CoverageMismatch {
                end,
                total: map.total_memory,
            }),
            None => violations.push(InvariantViolation::AddressOverflow {
                index: blocks.len() - 1,
            }),
        },
    }

    let mut seen = FxHashSet::default();
    for block in blocks {
        if let Some(pid) = block.occupant {
            if !seen.insert(pid) {
                violations.push(InvariantViolation::DuplicateOccupant(pid));
            }
        }
    }

    if violations.is_empty() {
        Ok(())
    } else {
        Err(violations)
    }
}

fn checked_end(block: &Block) -> Option<u64> {
    block.base.checked_add(block.size)
}

/// Merge runs of neighbouring free blocks in place
fn coalesce_free(blocks: &mut Vec<Block>) {
    let mut merged: Vec<Block> = Vec::with_capacity(blocks.len());
    for block in blocks.drain(..) {
        match merged.last_mut() {
            Some(last) if last.is_free() && block.is_free() => last.size += block.size,
            _ => merged.push(block),
        }
    }
    *blocks = merged;
}
