//! Two-party session relay
//!
//! A session has exactly two participant slots. Each slot owns a FIFO
//! delivery queue; interpreted utterances from one participant are appended
//! to the other participant's queue and drained by polling.
//!
//! ```text
//!   submit(mode=A) ──► enqueue(B) ──► [ B queue ] ──► poll(B)
//!   submit(mode=B) ──► enqueue(A) ──► [ A queue ] ──► poll(A)
//! ```
//!
//! Queue operations never await, so each enqueue or dequeue is a single
//! critical section relative to every other request.

mod slot;
mod utterance;

use std::collections::VecDeque;
use std::num::NonZeroUsize;
use std::sync::{Mutex, PoisonError};

use serde::{Deserialize, Serialize};

pub use slot::ParticipantSlot;
pub use utterance::Utterance;

/// Relay queue configuration
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct RelayConfig {
    /// Per-slot queue capacity; `None` keeps queues unbounded
    pub max_pending: Option<NonZeroUsize>,
}

/// Queue depth per slot
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PendingCounts {
    #[serde(rename = "A")]
    pub a: usize,
    #[serde(rename = "B")]
    pub b: usize,
}

#[derive(Debug, Default)]
struct Queues {
    a: VecDeque<Utterance>,
    b: VecDeque<Utterance>,
}

impl Queues {
    const fn slot_mut(&mut self, slot: ParticipantSlot) -> &mut VecDeque<Utterance> {
        match slot {
            ParticipantSlot::A => &mut self.a,
            ParticipantSlot::B => &mut self.b,
        }
    }

    const fn slot(&self, slot: ParticipantSlot) -> &VecDeque<Utterance> {
        match slot {
            ParticipantSlot::A => &self.a,
            ParticipantSlot::B => &self.b,
        }
    }
}

/// The single two-party session and its delivery queues
///
/// Constructed explicitly and shared by reference with the ingestion and
/// delivery handlers; nothing else mutates the queues.
#[derive(Debug, Default)]
pub struct SessionRelay {
    queues: Mutex<Queues>,
    config: RelayConfig,
}

impl SessionRelay {
    /// Create a relay with unbounded queues
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a relay with the given queue configuration
    #[must_use]
    pub fn with_config(config: RelayConfig) -> Self {
        Self {
            queues: Mutex::default(),
            config,
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Queues> {
        // Critical sections never panic mid-update, so a poisoned lock still
        // holds consistent queues
        self.queues.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append an utterance to the recipient's queue
    ///
    /// Never fails. When the queue is bounded and full, the oldest pending
    /// utterance is dropped to make room.
    pub fn enqueue(&self, recipient: ParticipantSlot, item: Utterance) {
        let mut queues = self.lock();
        let queue = queues.slot_mut(recipient);

        if let Some(cap) = self.config.max_pending {
            while queue.len() >= cap.get() {
                if let Some(dropped) = queue.pop_front() {
                    tracing::warn!(
                        slot = %recipient,
                        created_at = %dropped.created_at(),
                        capacity = cap.get(),
                        "delivery queue full, dropping oldest utterance"
                    );
                }
            }
        }

        queue.push_back(item);
        tracing::debug!(slot = %recipient, pending = queue.len(), "utterance enqueued");
    }

    /// Route an utterance from `sender` to the other participant
    ///
    /// Returns the slot it was delivered to.
    pub fn deliver(&self, sender: ParticipantSlot, item: Utterance) -> ParticipantSlot {
        let recipient = sender.opposite();
        self.enqueue(recipient, item);
        recipient
    }

    /// Remove and return the oldest utterance pending for `slot`
    ///
    /// `None` means nothing is waiting; it is not an error.
    pub fn dequeue(&self, slot: ParticipantSlot) -> Option<Utterance> {
        let item = self.lock().slot_mut(slot).pop_front();
        if item.is_some() {
            tracing::debug!(slot = %slot, "utterance dequeued");
        }
        item
    }

    /// Number of utterances waiting for `slot`
    #[must_use]
    pub fn pending(&self, slot: ParticipantSlot) -> usize {
        self.lock().slot(slot).len()
    }

    /// Queue depth for both slots, read under one lock
    #[must_use]
    pub fn pending_counts(&self) -> PendingCounts {
        let queues = self.lock();
        PendingCounts {
            a: queues.a.len(),
            b: queues.b.len(),
        }
    }
}
