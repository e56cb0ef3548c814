//! Connection lifecycle as an explicit state machine
//!
//! ```text
//!            Opened              Dropped
//! Connecting ──────▶ Open ──────────────▶ Closed
//!     ▲  │                                  │
//!     │  └──────────── Dropped ────────────▶│
//!     └─────────────── RetryDue ────────────┘
//!
//! (any) ── Unmount ──▶ Unmounted   (terminal)
//! ```
//!
//! Transitions are pure so the reconnect logic can be exercised without a
//! socket. [`AtomicConnectionState`] publishes the current state to other
//! threads without locking.

use crate::{HyperSocketError, Result};
use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ConnectionState {
    /// Handshake in progress
    Connecting = 0,
    /// Socket open, frames flowing
    Open = 1,
    /// Socket gone, reconnect pending
    Closed = 2,
    /// Owner tore the client down; no further attempts
    Unmounted = 3,
}

/// Events that move the connection between states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Transition {
    /// Handshake completed
    Opened,
    /// Connect failed, or the socket closed or errored
    Dropped,
    /// Reconnect delay elapsed
    RetryDue,
    /// Owner shut the client down
    Unmount,
}

impl ConnectionState {
    /// Compute the state after `transition`
    pub fn next(self, transition: Transition) -> Result<ConnectionState> {
        use ConnectionState::*;
        use Transition::*;

        match (self, transition) {
            (Unmounted, t) => Err(HyperSocketError::InvalidState(format!(
                "{:?} after client was unmounted",
                t
            ))),
            (_, Unmount) => Ok(Unmounted),
            (Connecting, Opened) => Ok(Open),
            (Connecting, Dropped) | (Open, Dropped) => Ok(Closed),
            (Closed, RetryDue) => Ok(Connecting),
            (state, t) => Err(HyperSocketError::InvalidState(format!(
                "{:?} is not valid while {:?}",
                t, state
            ))),
        }
    }

    pub fn is_terminal(self) -> bool {
        self == ConnectionState::Unmounted
    }

    fn from_u8(value: u8) -> Self {
        match value {
            0 => ConnectionState::Connecting,
            1 => ConnectionState::Open,
            2 => ConnectionState::Closed,
            _ => ConnectionState::Unmounted,
        }
    }
}

/// Lock-free holder for the current [`ConnectionState`]
#[derive(Debug)]
pub struct AtomicConnectionState {
    inner: AtomicU8,
}

impl AtomicConnectionState {
    pub fn new(state: ConnectionState) -> Self {
        Self {
            inner: AtomicU8::new(state as u8),
        }
    }

    #[inline]
    pub fn get(&self) -> ConnectionState {
        ConnectionState::from_u8(self.inner.load(Ordering::Acquire))
    }

    #[inline]
    pub fn set(&self, state: ConnectionState) {
        self.inner.store(state as u8, Ordering::Release);
    }

    /// Apply a transition and publish the new state
    ///
    /// Only the connection task calls this, so load + store is not racy.
    pub fn apply(&self, transition: Transition) -> Result<ConnectionState> {
        let next = self.get().next(transition)?;
        self.set(next);
        Ok(next)
    }

    #[inline]
    pub fn is_open(&self) -> bool {
        self.get() == ConnectionState::Open
    }

    #[inline]
    pub fn is_unmounted(&self) -> bool {
        self.get() == ConnectionState::Unmounted
    }
}

/// Counters shared between the connection task and readers
#[derive(Debug, Default)]
pub struct AtomicMetrics {
    messages_sent: AtomicU64,
    messages_received: AtomicU64,
    reconnect_count: AtomicU64,
}

impl AtomicMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn increment_sent(&self) {
        self.messages_sent.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn increment_received(&self) {
        self.messages_received.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn increment_reconnects(&self) {
        self.reconnect_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn messages_sent(&self) -> u64 {
        self.messages_sent.load(Ordering::Relaxed)
    }

    pub fn messages_received(&self) -> u64 {
        self.messages_received.load(Ordering::Relaxed)
    }

    pub fn reconnect_count(&self) -> u64 {
        self.reconnect_count.load(Ordering::Relaxed)
    }
}
