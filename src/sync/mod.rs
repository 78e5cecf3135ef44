//! Keeps the local [`MemoryMap`] in step with the authority
//!
//! The [`SyncController`] is the only owner of the current map and its
//! rendered frame. Everyone else gets `Rc` snapshots that cannot be mutated.
//!
//! # Refresh discipline
//!
//! - At most one snapshot request is in flight. A [`SyncController::refresh`]
//!   issued while one is outstanding awaits the same request instead of
//!   starting another.
//! - Every request gets a sequence number. A response is applied only if it
//!   is newer than the applied one and has not been superseded, so results
//!   land in issuance order.
//! - [`SyncController::resync`] supersedes the in-flight request (it may
//!   predate a mutation), waits for it to settle and then refreshes again.
//! - A failed or timed-out fetch leaves the map and frame untouched and is
//!   reported once to the [`MessageChannel`], unless it was superseded.

use crate::authority::Authority;
use crate::errors::{SyncError, TransportError};
use crate::message::{MessageChannel, Severity};
use crate::model::{self, MemoryMap};
use crate::render::{render, RenderOptions, VisualizationFrame};
use futures::future::{FutureExt, LocalBoxFuture, Shared};
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

type PendingRefresh = Shared<LocalBoxFuture<'static, Result<Rc<MemoryMap>, SyncError>>>;

struct InFlight {
    seq: u64,
    future: PendingRefresh,
}

struct SyncState {
    map: Rc<MemoryMap>,
    frame: Rc<VisualizationFrame>,
    next_seq: u64,
    applied_seq: u64,
    // Responses to requests numbered below this are discarded
    superseded_below: u64,
    in_flight: Option<InFlight>,
}

pub struct SyncController<A> {
    authority: Rc<A>,
    state: Rc<RefCell<SyncState>>,
    channel: MessageChannel,
    options: Rc<RenderOptions>,
    timeout: Duration,
}

impl<A> Clone for SyncController<A> {
    fn clone(&self) -> Self {
        SyncController {
            authority: Rc::clone(&self.authority),
            state: Rc::clone(&self.state),
            channel: self.channel.clone(),
            options: Rc::clone(&self.options),
            timeout: self.timeout,
        }
    }
}

impl<A: Authority + 'static> SyncController<A> {
    pub fn new(
        authority: Rc<A>,
        channel: MessageChannel,
        options: RenderOptions,
        timeout: Duration,
    ) -> Self {
        let map = MemoryMap::empty();
        let frame = render(&map, &options);
        SyncController {
            authority,
            state: Rc::new(RefCell::new(SyncState {
                map: Rc::new(map),
                frame: Rc::new(frame),
                next_seq: 1,
                applied_seq: 0,
                superseded_below: 0,
                in_flight: None,
            })),
            channel,
            options: Rc::new(options),
            timeout,
        }
    }

    /// The currently applied map
    pub fn snapshot(&self) -> Rc<MemoryMap> {
        Rc::clone(&self.state.borrow().map)
    }

    /// The frame rendered from [`Self::snapshot`]
    pub fn frame(&self) -> Rc<VisualizationFrame> {
        Rc::clone(&self.state.borrow().frame)
    }

    /// Sequence number of the applied snapshot, 0 before the first one
    pub fn generation(&self) -> u64 {
        self.state.borrow().applied_seq
    }

    /// Number of snapshot requests issued so far
    pub fn requests_issued(&self) -> u64 {
        self.state.borrow().next_seq - 1
    }

    pub fn is_refreshing(&self) -> bool {
        self.state.borrow().in_flight.is_some()
    }

    pub fn authority(&self) -> &Rc<A> {
        &self.authority
    }

    pub fn channel(&self) -> &MessageChannel {
        &self.channel
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Fetch and apply the authoritative map, joining any request in flight
    pub async fn refresh(&self) -> Result<Rc<MemoryMap>, SyncError> {
        let pending = self.join_or_issue();
        pending.await
    }

    /// Refresh with a request issued after this call
    ///
    /// Used after a mutation: an outstanding request may have been answered
    /// before the mutation took effect, so its response is discarded.
    pub async fn resync(&self) -> Result<Rc<MemoryMap>, SyncError> {
        let stale = {
            let mut state = self.state.borrow_mut();
            let stale = state
                .in_flight
                .as_ref()
                .map(|f| (f.seq, f.future.clone()));
            if let Some((seq, _)) = &stale {
                state.superseded_below = seq + 1;
            }
            stale
        };

        if let Some((seq, future)) = stale {
            log::debug!("refresh #{} superseded, waiting for it to settle", seq);
            // Superseded: its outcome is never applied or reported
            let _ = future.await;
        }

        self.refresh().await
    }

    fn join_or_issue(&self) -> PendingRefresh {
        let mut state = self.state.borrow_mut();
        if let Some(in_flight) = &state.in_flight {
            log::debug!("joining refresh #{}", in_flight.seq);
            return in_flight.future.clone();
        }

        let seq = state.next_seq;
        state.next_seq += 1;
        let future = self.clone().run(seq).boxed_local().shared();
        state.in_flight = Some(InFlight {
            seq,
            future: future.clone(),
        });
        future
    }

    async fn run(self, seq: u64) -> Result<Rc<MemoryMap>, SyncError> {
        log::debug!("refresh #{} issued", seq);
        let outcome = match tokio::time::timeout(self.timeout, self.authority.fetch_snapshot()).await
        {
            Ok(Ok(body)) => model::parse_json(&body).map_err(SyncError::from),
            Ok(Err(e)) => Err(SyncError::from(e)),
            Err(_) => Err(SyncError::from(TransportError::Timeout(self.timeout))),
        };
        self.settle(seq, outcome)
    }

    fn settle(
        &self,
        seq: u64,
        outcome: Result<MemoryMap, SyncError>,
    ) -> Result<Rc<MemoryMap>, SyncError> {
        let mut state = self.state.borrow_mut();
        if state.in_flight.as_ref().is_some_and(|f| f.seq == seq) {
            state.in_flight = None;
        }

        match outcome {
            Ok(map) => {
                if seq < state.superseded_below || seq <= state.applied_seq {
                    log::debug!("discarding response to superseded refresh #{}", seq);
                    return Ok(Rc::clone(&state.map));
                }
                let frame = render(&map, &self.options);
                log::debug!(
                    "applied snapshot #{}: {} blocks, {} used of {}",
                    seq,
                    map.blocks().len(),
                    frame.usage.used,
                    frame.usage.total
                );
                state.map = Rc::new(map);
                state.frame = Rc::new(frame);
                state.applied_seq = seq;
                Ok(Rc::clone(&state.map))
            }
            Err(e) => {
                if seq < state.superseded_below {
                    log::debug!("superseded refresh #{} failed: {}", seq, e);
                    return Err(e);
                }
                drop(state);
                self.channel.report(e.to_string(), Severity::Error);
                Err(e)
            }
        }
    }
}
