//! # Introduction
//!
//! memtty mirrors the memory map of a remote allocation simulator in the
//! terminal and lets the operator create, delete and convert allocations.
//! The simulator (the *authority*) owns the real allocator; memtty keeps a
//! validated local copy, renders it, and serializes the operator's requests.
//!
//! ## Data flow
//!
//! ```text
//! Dispatcher → Authority → SyncController → MemoryMap → render → TUI
//!                                  ↘ MessageChannel ↙
//! ```
//!
//! 1. [`model`]: the [`model::MemoryMap`] and its invariant checks.
//! 2. [`render`]: pure projection of a map into a
//!    [`render::VisualizationFrame`].
//! 3. [`sync`]: fetches snapshots with at most one request in flight and
//!    applies them in order.
//! 4. [`dispatch`]: validates and submits operations, one at a time.
//! 5. [`message`]: the single channel for operator-visible outcomes.
//! 6. [`authority`]: the remote contract and its HTTP implementation.
//! 7. [`ui`]: ratatui-based TUI; not part of the stable library API.

pub mod authority;
pub mod config;
pub mod dispatch;
pub mod errors;
pub mod message;
pub mod model;
pub mod render;
pub mod sync;
pub mod ui;
