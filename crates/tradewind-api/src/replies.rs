//! The reply table: outstanding requests keyed by reply id.
//!
//! Senders register a slot and wait on it; the dispatch loop resolves
//! slots as replies arrive. Replies are matched by id only, so arrival
//! order does not matter.
//!
//! # Slot lifetime
//!
//! A slot leaves the table in exactly one of three ways: it is resolved,
//! its [`PendingReply`] is dropped (the waiter timed out or gave up), or
//! the whole table is cleared at teardown. Nothing else removes slots,
//! and nothing can leave one behind.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::oneshot;
use tradewind_protocol::{Message, ReplyId};
use tracing::{debug, warn};

use crate::ApiError;

struct Slot {
    /// Distinguishes reuses of the same reply id.
    generation: u64,
    sender: oneshot::Sender<Option<Message>>,
}

#[derive(Default)]
struct Inner {
    pending: HashMap<ReplyId, Slot>,
    next_id: u32,
    next_generation: u64,
}

impl Inner {
    /// Next id not currently pending. Ids wrap around.
    fn allocate(&mut self) -> ReplyId {
        loop {
            self.next_id = self.next_id.wrapping_add(1);
            let id = ReplyId::new(self.next_id);
            if !self.pending.contains_key(&id) {
                return id;
            }
        }
    }
}

/// Shared table of pending replies.
#[derive(Clone, Default)]
pub struct ReplyTable {
    inner: Arc<Mutex<Inner>>,
}

impl ReplyTable {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Allocates a fresh id and a slot to wait on.
    pub fn register(&self) -> PendingReply {
        let (sender, receiver) = oneshot::channel();
        let mut inner = self.lock();
        let id = inner.allocate();
        let generation = inner.next_generation;
        inner.next_generation += 1;
        inner.pending.insert(id, Slot { generation, sender });
        PendingReply {
            id,
            generation,
            receiver,
            table: self.clone(),
        }
    }

    /// Delivers `message` to the request waiting on `id`.
    ///
    /// Returns `false`, after logging, if no request is waiting: the id
    /// was never issued, was already resolved, or its waiter is gone.
    pub fn resolve(&self, id: ReplyId, message: Option<Message>) -> bool {
        let slot = self.lock().pending.remove(&id);
        let Some(slot) = slot else {
            warn!(reply_id = %id, "reply for unknown or already resolved request");
            return false;
        };
        if slot.sender.send(message).is_err() {
            debug!(reply_id = %id, "reply arrived after its waiter gave up");
            return false;
        }
        true
    }

    /// Discards every pending slot. Their waiters see
    /// [`ApiError::Abandoned`]. Returns how many were discarded.
    pub fn clear(&self) -> usize {
        let drained: Vec<_> = self.lock().pending.drain().collect();
        drained.len()
    }

    /// Number of requests still waiting.
    pub fn len(&self) -> usize {
        self.lock().pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn release(&self, id: ReplyId, generation: u64) {
        let mut inner = self.lock();
        if inner
            .pending
            .get(&id)
            .is_some_and(|slot| slot.generation == generation)
        {
            inner.pending.remove(&id);
            debug!(reply_id = %id, "released unanswered reply slot");
        }
    }
}

/// One registered slot. Dropping it releases the slot if it is still
/// pending.
pub struct PendingReply {
    id: ReplyId,
    generation: u64,
    receiver: oneshot::Receiver<Option<Message>>,
    table: ReplyTable,
}

impl PendingReply {
    pub fn id(&self) -> ReplyId {
        self.id
    }

    /// Waits for the reply.
    ///
    /// # Errors
    /// [`ApiError::Abandoned`] if the slot was discarded first.
    pub async fn recv(&mut self) -> Result<Option<Message>, ApiError> {
        (&mut self.receiver)
            .await
            .map_err(|_| ApiError::Abandoned(self.id))
    }
}

impl Drop for PendingReply {
    fn drop(&mut self) {
        self.table.release(self.id, self.generation);
    }
}
