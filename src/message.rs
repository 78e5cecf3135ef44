//! The single reporting surface for operator-visible outcomes
//!
//! Sync failures, operation results and command errors all go through
//! [`MessageChannel::report`]. The UI reads the channel back to draw the
//! status bar and message log, so every outcome reaches the operator the
//! same way.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;

pub const DEFAULT_HISTORY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Error => write!(f, "error"),
        }
    }
}

/// A reported outcome
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Monotonic sequence number, starting at 1
    pub id: u64,
    pub text: String,
    pub severity: Severity,
}

#[derive(Debug)]
struct MessageLog {
    entries: VecDeque<Message>,
    capacity: usize,
    next_id: u64,
}

/// Cloneable handle to a shared message log
#[derive(Debug, Clone)]
pub struct MessageChannel {
    log: Rc<RefCell<MessageLog>>,
}

impl MessageChannel {
    pub fn new(capacity: usize) -> Self {
        MessageChannel {
            log: Rc::new(RefCell::new(MessageLog {
                entries: VecDeque::with_capacity(capacity.max(1)),
                capacity: capacity.max(1),
                next_id: 1,
            })),
        }
    }

    /// Record an outcome for the operator
    pub fn report(&self, text: impl Into<String>, severity: Severity) {
        let text = text.into();
        match severity {
            Severity::Info => log::info!("{}", text),
            Severity::Error => log::error!("{}", text),
        }

        let mut log = self.log.borrow_mut();
        let id = log.next_id;
        log.next_id += 1;
        if log.entries.len() == log.capacity {
            log.entries.pop_front();
        }
        log.entries.push_back(Message { id, text, severity });
    }

    pub fn latest(&self) -> Option<Message> {
        self.log.borrow().entries.back().cloned()
    }

    /// Retained messages, oldest first
    pub fn history(&self) -> Vec<Message> {
        self.log.borrow().entries.iter().cloned().collect()
    }

    /// Total number of reports ever made, including evicted ones
    pub fn reported(&self) -> u64 {
        self.log.borrow().next_id - 1
    }

    pub fn errors(&self) -> usize {
        self.log
            .borrow()
            .entries
            .iter()
            .filter(|m| m.severity == Severity::Error)
            .count()
    }
}

impl Default for MessageChannel {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY)
    }
}
