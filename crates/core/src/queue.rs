// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bounded event queues for pull-based delivery
//!
//! Publishers never wait on a queue: a full queue rejects the event
//! immediately. Consumers wait in `dequeue` until an event arrives, the queue
//! closes, or their timeout elapses.

use crate::error::{DequeueError, EnqueueError, QueueCapacityError};
use crate::event::Event;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;

/// Buffer between the bus and a queued subscription's consumer
#[async_trait]
pub trait EventQueue: Send + Sync {
    /// Non-blocking push
    fn enqueue(&self, event: Arc<Event>) -> Result<(), EnqueueError>;

    /// Wait up to `timeout` for the next event
    async fn dequeue(&self, timeout: Duration) -> Result<Arc<Event>, DequeueError>;

    /// Non-blocking pop
    fn try_dequeue(&self) -> Option<Arc<Event>>;

    fn size(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// Reject further enqueues and wake waiting consumers.
    ///
    /// Buffered events can still be drained.
    fn close(&self);

    fn is_closed(&self) -> bool;
}

#[derive(Default)]
struct QueueState {
    items: VecDeque<Arc<Event>>,
    closed: bool,
}

/// FIFO queue held in memory with a fixed capacity
pub struct InMemoryEventQueue {
    capacity: usize,
    state: Mutex<QueueState>,
    available: Notify,
}

impl InMemoryEventQueue {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            state: Mutex::new(QueueState::default()),
            available: Notify::new(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, QueueState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl EventQueue for InMemoryEventQueue {
    fn enqueue(&self, event: Arc<Event>) -> Result<(), EnqueueError> {
        {
            let mut state = self.lock();
            if state.closed {
                return Err(EnqueueError::Closed);
            }
            if state.items.len() >= self.capacity {
                return Err(QueueCapacityError {
                    capacity: self.capacity,
                }
                .into());
            }
            state.items.push_back(event);
        }
        self.available.notify_one();
        Ok(())
    }

    async fn dequeue(&self, timeout: Duration) -> Result<Arc<Event>, DequeueError> {
        let deadline = tokio::time::Instant::now() + timeout;

        loop {
            // Register interest before checking state so a concurrent
            // enqueue or close cannot slip between the check and the wait.
            let notified = self.available.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            {
                let mut state = self.lock();
                if let Some(event) = state.items.pop_front() {
                    return Ok(event);
                }
                if state.closed {
                    return Err(DequeueError::Closed);
                }
            }

            if tokio::time::timeout_at(deadline, notified).await.is_err() {
                return Err(DequeueError::Timeout);
            }
        }
    }

    fn try_dequeue(&self) -> Option<Arc<Event>> {
        self.lock().items.pop_front()
    }

    fn size(&self) -> usize {
        self.lock().items.len()
    }

    fn close(&self) {
        self.lock().closed = true;
        self.available.notify_waiters();
    }

    fn is_closed(&self) -> bool {
        self.lock().closed
    }
}

#[cfg(test)]
#[path = "queue_tests.rs"]
mod tests;
