// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The Message Queue contract (C3), with an at-least-once, in-memory
//! reference broker that tracks visibility timeouts and delivery counts
//! and moves exhausted messages to a paired dead-letter queue (C8's input).
//!
//! Grounded on the teacher's `storage/src/state/queues.rs` idempotent
//! `QueuePushed`/`Taken`/`ItemRetry`/`ItemDead` transitions, and on
//! `worker.py`'s dead-letter threshold handling.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use jobctl_core::{Clock, DeadLetterDetails, Message};
use parking_lot::Mutex;

use crate::error::{Error, Result};

/// Opaque handle identifying an in-flight delivery, used to `complete`,
/// `abandon`, or `dead_letter` it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LockToken(u64);

/// A message handed to a consumer, with enough metadata to decide how to
/// process it and how to settle it afterward.
#[derive(Debug, Clone)]
pub struct Delivery {
    pub message: Message,
    pub lock_token: LockToken,
    pub delivery_count: u32,
    pub enqueued_at_epoch_ms: u64,
}

/// Contract for the at-least-once broker the daemon consumes from.
#[async_trait]
pub trait MessageQueue: Send + Sync {
    async fn send(&self, message: Message) -> Result<()>;

    /// Pop the next ready message, if any, locking it for
    /// `visibility_timeout` before it becomes eligible for redelivery.
    async fn receive(&self) -> Result<Option<Delivery>>;

    /// Acknowledge successful processing; removes the message for good.
    async fn complete(&self, token: LockToken) -> Result<()>;

    /// Release the lock early without acknowledging, so the message
    /// becomes immediately eligible for redelivery (or dead-lettering, if
    /// this was its last allowed attempt).
    async fn abandon(&self, token: LockToken) -> Result<()>;

    /// Move a message straight to the dead-letter queue with a reason,
    /// bypassing further redelivery attempts.
    async fn dead_letter(&self, token: LockToken, details: DeadLetterDetails) -> Result<()>;

    /// Cheap best-effort reachability probe, mirroring
    /// `jobs.py::test_service_bus_connection`.
    async fn health_check(&self) -> Result<()> {
        Ok(())
    }
}

struct InFlight {
    message: Message,
    delivery_count: u32,
    enqueued_at_epoch_ms: u64,
    visible_again_at: u64,
}

struct ReadyMessage {
    message: Message,
    delivery_count: u32,
    enqueued_at_epoch_ms: u64,
}

struct State {
    ready: VecDeque<ReadyMessage>,
    in_flight: HashMap<u64, InFlight>,
}

/// In-memory at-least-once broker. `dead_letter_queue()` exposes the paired
/// DLQ sub-queue a message lands in once `max_delivery_count` deliveries
/// have been exhausted.
pub struct InMemoryQueue<C: Clock> {
    clock: C,
    visibility_timeout: Duration,
    max_delivery_count: u32,
    state: Mutex<State>,
    next_token: AtomicU64,
    dlq: Arc<DlqQueue>,
}

/// The dead-letter sub-queue: a plain FIFO of exhausted messages plus the
/// reason they were dead-lettered, with no redelivery semantics of its own.
pub struct DlqQueue {
    entries: Mutex<VecDeque<(Message, DeadLetterDetails)>>,
}

impl DlqQueue {
    fn new() -> Arc<Self> {
        Arc::new(Self { entries: Mutex::new(VecDeque::new()) })
    }

    pub fn push(&self, message: Message, details: DeadLetterDetails) {
        self.entries.lock().push_back((message, details));
    }

    pub fn pop(&self) -> Option<(Message, DeadLetterDetails)> {
        self.entries.lock().pop_front()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<C: Clock> InMemoryQueue<C> {
    pub fn new(clock: C, visibility_timeout: Duration, max_delivery_count: u32) -> Arc<Self> {
        Arc::new(Self {
            clock,
            visibility_timeout,
            max_delivery_count,
            state: Mutex::new(State { ready: VecDeque::new(), in_flight: HashMap::new() }),
            next_token: AtomicU64::new(1),
            dlq: DlqQueue::new(),
        })
    }

    pub fn dead_letter_queue(&self) -> Arc<DlqQueue> {
        Arc::clone(&self.dlq)
    }

    /// Requeue any in-flight messages whose visibility timeout has lapsed
    /// without being completed or abandoned.
    fn reap_expired(&self, state: &mut State) {
        let now = self.clock.epoch_ms();
        let expired: Vec<u64> = state
            .in_flight
            .iter()
            .filter(|(_, f)| f.visible_again_at <= now)
            .map(|(token, _)| *token)
            .collect();
        for token in expired {
            if let Some(flight) = state.in_flight.remove(&token) {
                state.ready.push_back(ReadyMessage {
                    message: flight.message,
                    delivery_count: flight.delivery_count,
                    enqueued_at_epoch_ms: flight.enqueued_at_epoch_ms,
                });
            }
        }
    }
}

#[async_trait]
impl<C: Clock + 'static> MessageQueue for InMemoryQueue<C> {
    async fn send(&self, message: Message) -> Result<()> {
        let mut state = self.state.lock();
        state.ready.push_back(ReadyMessage {
            message,
            delivery_count: 0,
            enqueued_at_epoch_ms: self.clock.epoch_ms(),
        });
        Ok(())
    }

    async fn receive(&self) -> Result<Option<Delivery>> {
        let mut state = self.state.lock();
        self.reap_expired(&mut state);

        let Some(mut ready) = state.ready.pop_front() else {
            return Ok(None);
        };
        ready.delivery_count += 1;

        let token = self.next_token.fetch_add(1, Ordering::Relaxed);
        let delivery = Delivery {
            message: ready.message.clone(),
            lock_token: LockToken(token),
            delivery_count: ready.delivery_count,
            enqueued_at_epoch_ms: ready.enqueued_at_epoch_ms,
        };

        state.in_flight.insert(
            token,
            InFlight {
                message: ready.message,
                delivery_count: ready.delivery_count,
                enqueued_at_epoch_ms: ready.enqueued_at_epoch_ms,
                visible_again_at: self.clock.epoch_ms() + self.visibility_timeout.as_millis() as u64,
            },
        );

        Ok(Some(delivery))
    }

    async fn complete(&self, token: LockToken) -> Result<()> {
        let mut state = self.state.lock();
        state
            .in_flight
            .remove(&token.0)
            .map(|_| ())
            .ok_or(Error::UnknownLockToken(token.0))
    }

    async fn abandon(&self, token: LockToken) -> Result<()> {
        let mut state = self.state.lock();
        let flight = state.in_flight.remove(&token.0).ok_or(Error::UnknownLockToken(token.0))?;

        if flight.delivery_count >= self.max_delivery_count {
            tracing::warn!(
                delivery_count = flight.delivery_count,
                max = self.max_delivery_count,
                "max delivery count exceeded, dead-lettering"
            );
            self.dlq.push(
                flight.message,
                DeadLetterDetails {
                    reason: Some("MaxDeliveryCountExceeded".to_string()),
                    error_description: Some(format!(
                        "exceeded {} delivery attempts",
                        self.max_delivery_count
                    )),
                },
            );
            return Ok(());
        }

        state.ready.push_back(ReadyMessage {
            message: flight.message,
            delivery_count: flight.delivery_count,
            enqueued_at_epoch_ms: flight.enqueued_at_epoch_ms,
        });
        Ok(())
    }

    async fn dead_letter(&self, token: LockToken, details: DeadLetterDetails) -> Result<()> {
        let mut state = self.state.lock();
        let flight = state.in_flight.remove(&token.0).ok_or(Error::UnknownLockToken(token.0))?;
        self.dlq.push(flight.message, details);
        Ok(())
    }
}

#[cfg(test)]
#[path = "queue_tests.rs"]
mod tests;
