//! Terminal user interface built on [ratatui](https://github.com/ratatui-org/ratatui).
//!
//! The UI is organized into four layers:
//!
//! - **[`app`]**: application state, event loop, pane focus, command input mode
//! - **[`command`]**: parser for the operator command line
//! - **[`panes`]**: stateless render functions for each visible pane (bar, blocks,
//!   usage, messages, status bar)
//! - **[`theme`]**: centralized color palette used by all panes
//!
//! The entry point for consumers is [`App`]: construct it with a
//! [`SyncController`] and await [`App::run`] inside a `LocalSet`.
//!
//! [`SyncController`]: crate::sync::SyncController
//! [`App::run`]: app::App::run

pub mod app;
pub mod command;
pub mod panes;
pub mod theme;

pub use app::App;
