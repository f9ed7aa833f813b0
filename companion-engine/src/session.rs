//! Per-session conversation state and its store.
//!
//! The store owns one `SessionState` per caller-supplied session id, created
//! on first touch. `acquire` hands back an owned mutex guard, so two
//! concurrent turns on the same session serialize instead of racing on a
//! read-modify-write. Expiry is an injected policy: construct with a TTL and
//! call `sweep` from a periodic task.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::booking::BookingDraft;
use crate::collaborators::ServiceSummary;
use crate::error::Result;
use crate::expense::ExpenseCandidate;

/// Mutable dialogue state for one session.
///
/// Invariants: `awaiting_date_confirmation` implies `pending_expense` is set;
/// an active `booking_draft` always carries a valid step.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionState {
    pub pending_expense: Option<ExpenseCandidate>,
    pub awaiting_date_confirmation: bool,
    pub last_recommended: Option<Vec<ServiceSummary>>,
    pub awaiting_detail_follow_up: bool,
    pub booking_draft: Option<BookingDraft>,
}

impl SessionState {
    /// Park an expense candidate while the date confirmation round trip runs.
    pub fn hold_expense_for_date(&mut self, candidate: ExpenseCandidate) {
        self.pending_expense = Some(candidate);
        self.awaiting_date_confirmation = true;
    }

    /// Take the parked candidate and clear both confirmation fields together,
    /// keeping the invariant intact.
    pub fn take_pending_expense(&mut self) -> Option<ExpenseCandidate> {
        self.awaiting_date_confirmation = false;
        self.pending_expense.take()
    }

    /// Remember a recommendation list for a possible detail follow-up.
    pub fn remember_recommendation(&mut self, services: Vec<ServiceSummary>) {
        self.last_recommended = Some(services);
        self.awaiting_detail_follow_up = true;
    }

    /// Take the remembered list and clear the follow-up flag.
    pub fn take_recommendation(&mut self) -> Option<Vec<ServiceSummary>> {
        self.awaiting_detail_follow_up = false;
        self.last_recommended.take()
    }
}

/// Trait for storing and retrieving per-session state
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Get (creating on first touch) and lock the state for one turn.
    async fn acquire(&self, session_id: &str) -> Result<OwnedMutexGuard<SessionState>>;

    /// Drop the stored state entirely, abandoning any in-progress dialogue.
    async fn reset(&self, session_id: &str) -> Result<()>;
}

struct SessionEntry {
    state: Arc<Mutex<SessionState>>,
    touched_at: Instant,
}

impl SessionEntry {
    fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(SessionState::default())),
            touched_at: Instant::now(),
        }
    }
}

/// In-memory implementation of [`SessionStore`] backed by a `DashMap`.
pub struct InMemorySessionStore {
    entries: DashMap<String, SessionEntry>,
    ttl: Option<Duration>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
            ttl: None,
        }
    }

    /// Store whose entries expire after `ttl` of inactivity once `sweep` runs.
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl: Some(ttl),
        }
    }

    /// Remove entries idle longer than the configured TTL. Returns how many
    /// were dropped. No-op for stores built without a TTL.
    pub fn sweep(&self) -> usize {
        let Some(ttl) = self.ttl else {
            return 0;
        };
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.touched_at.elapsed() < ttl);
        before - self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for InMemorySessionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn acquire(&self, session_id: &str) -> Result<OwnedMutexGuard<SessionState>> {
        let state = {
            let mut entry = self
                .entries
                .entry(session_id.to_string())
                .or_insert_with(SessionEntry::new);
            entry.touched_at = Instant::now();
            entry.state.clone()
        };
        Ok(state.lock_owned().await)
    }

    async fn reset(&self, session_id: &str) -> Result<()> {
        self.entries.remove(session_id);
        Ok(())
    }
}
