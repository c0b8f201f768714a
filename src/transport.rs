//! # Queue Transport Contract
//!
//! Abstraction over the underlying at-least-once queue service. The dispatch
//! layer only needs four primitives: send, batch send, receive, and delete.
//! Any ordered-at-least-once queue service qualifies; delivery guarantees,
//! visibility timeouts, and redelivery policy all belong to the transport.
//!
//! Batch entries are keyed by a caller-supplied id, which the transport is
//! required to echo back in its success/failure response so outcomes can be
//! correlated without re-parsing message bodies.

use std::collections::HashMap;
use std::collections::VecDeque;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::errors::Result;

/// Maximum delivery delay a transport is expected to accept, in seconds.
///
/// Matches the SQS `DelaySeconds` ceiling; submissions beyond this fail
/// validation before any transport call.
pub const MAX_DELAY_SECONDS: u32 = 900;

/// Receipt for a single sent message
#[derive(Debug, Clone)]
pub struct SendReceipt {
    /// Transport-assigned message id, when retrievable
    pub message_id: Option<String>,
}

/// One entry of a batch send, keyed by a caller-supplied correlation id
#[derive(Debug, Clone)]
pub struct BatchEntry {
    /// Correlation id echoed back in the batch outcome (the dispatcher uses the taskId)
    pub id: String,
    /// Serialized message body
    pub body: String,
    /// Optional per-entry delivery delay
    pub delay_seconds: Option<u32>,
}

/// Successful entry of a batch send outcome
#[derive(Debug, Clone)]
pub struct BatchSendSuccess {
    pub id: String,
    pub message_id: Option<String>,
}

/// Failed entry of a batch send outcome
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchSendFailure {
    /// The caller-supplied entry id this failure refers to
    pub id: String,
    /// Whether the failure was caused by the sender (bad request) rather than the service
    pub sender_fault: bool,
    /// Transport-specific failure code
    pub code: String,
    /// Human-readable failure detail, when the transport provides one
    pub message: Option<String>,
}

/// Outcome of a batch send.
///
/// Entry order is transport-defined and carries no meaning; callers must
/// correlate by entry id.
#[derive(Debug, Clone, Default)]
pub struct BatchSendOutcome {
    pub successful: Vec<BatchSendSuccess>,
    pub failed: Vec<BatchSendFailure>,
}

/// A message delivered by the transport
#[derive(Debug, Clone)]
pub struct QueueMessage {
    /// Transport-assigned message id
    pub message_id: String,
    /// Raw message body; absent bodies fail consumption before any routing
    pub body: Option<String>,
    /// Handle used to delete the message after successful handling
    pub receipt_handle: String,
}

/// Send/receive/delete primitives of the underlying queue service
#[async_trait]
pub trait QueueTransport: Send + Sync {
    /// Send a single message body to the queue at `queue_url`
    async fn send(
        &self,
        queue_url: &str,
        body: &str,
        delay_seconds: Option<u32>,
    ) -> Result<SendReceipt>;

    /// Send a batch of entries to the queue at `queue_url`.
    ///
    /// Per-entry failures (e.g. quota exceeded) are reported in the outcome,
    /// not as an error; an `Err` means the batch call itself failed.
    async fn send_batch(&self, queue_url: &str, entries: &[BatchEntry])
        -> Result<BatchSendOutcome>;

    /// Receive up to `max_messages`, waiting up to `wait_seconds` for messages
    /// to become available
    async fn receive(
        &self,
        queue_url: &str,
        max_messages: u32,
        wait_seconds: u32,
    ) -> Result<Vec<QueueMessage>>;

    /// Delete a delivered message so it is not redelivered
    async fn delete(&self, queue_url: &str, receipt_handle: &str) -> Result<()>;
}

#[derive(Debug, Default)]
struct InMemoryState {
    /// Pending messages per queue url
    queues: HashMap<String, VecDeque<StoredMessage>>,
    /// Messages handed out to a receiver and awaiting deletion, keyed by
    /// receipt handle and tagged with their source queue
    in_flight: HashMap<String, (String, StoredMessage)>,
    sequence: u64,
}

impl InMemoryState {
    fn next_message(&mut self, body: &str) -> StoredMessage {
        self.sequence += 1;
        StoredMessage {
            message_id: format!("mem-{}", self.sequence),
            body: body.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
struct StoredMessage {
    message_id: String,
    body: String,
}

/// Mutex-guarded in-process transport stand-in.
///
/// Used by tests and local development where no real queue service is
/// reachable. Messages move to an in-flight table on receive and are gone once
/// deleted; there is no visibility timeout, so an undeleted message is only
/// redelivered by an explicit [`requeue_in_flight`](Self::requeue_in_flight).
#[derive(Debug, Default)]
pub struct InMemoryTransport {
    state: Mutex<InMemoryState>,
}

impl InMemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of messages waiting on the given queue
    pub fn pending_count(&self, queue_url: &str) -> usize {
        self.state
            .lock()
            .queues
            .get(queue_url)
            .map_or(0, VecDeque::len)
    }

    /// Push every undeleted in-flight message back onto its source queue
    pub fn requeue_in_flight(&self) {
        let mut state = self.state.lock();
        let messages: Vec<(String, StoredMessage)> =
            state.in_flight.drain().map(|(_, entry)| entry).collect();
        for (queue_url, message) in messages {
            state.queues.entry(queue_url).or_default().push_back(message);
        }
    }

}

#[async_trait]
impl QueueTransport for InMemoryTransport {
    async fn send(
        &self,
        queue_url: &str,
        body: &str,
        _delay_seconds: Option<u32>,
    ) -> Result<SendReceipt> {
        let mut state = self.state.lock();
        let message = state.next_message(body);
        let message_id = message.message_id.clone();
        state
            .queues
            .entry(queue_url.to_string())
            .or_default()
            .push_back(message);

        Ok(SendReceipt {
            message_id: Some(message_id),
        })
    }

    async fn send_batch(
        &self,
        queue_url: &str,
        entries: &[BatchEntry],
    ) -> Result<BatchSendOutcome> {
        let mut state = self.state.lock();
        let mut outcome = BatchSendOutcome::default();

        for entry in entries {
            let message = state.next_message(&entry.body);
            outcome.successful.push(BatchSendSuccess {
                id: entry.id.clone(),
                message_id: Some(message.message_id.clone()),
            });
            state
                .queues
                .entry(queue_url.to_string())
                .or_default()
                .push_back(message);
        }

        Ok(outcome)
    }

    async fn receive(
        &self,
        queue_url: &str,
        max_messages: u32,
        _wait_seconds: u32,
    ) -> Result<Vec<QueueMessage>> {
        let mut state = self.state.lock();
        let mut delivered = Vec::new();

        for _ in 0..max_messages {
            let Some(message) = state
                .queues
                .get_mut(queue_url)
                .and_then(VecDeque::pop_front)
            else {
                break;
            };

            // Receipt handle doubles as the in-flight key
            let receipt_handle = format!("receipt-{}", message.message_id);
            delivered.push(QueueMessage {
                message_id: message.message_id.clone(),
                body: Some(message.body.clone()),
                receipt_handle: receipt_handle.clone(),
            });
            state
                .in_flight
                .insert(receipt_handle, (queue_url.to_string(), message));
        }

        Ok(delivered)
    }

    async fn delete(&self, _queue_url: &str, receipt_handle: &str) -> Result<()> {
        self.state.lock().in_flight.remove(receipt_handle);
        Ok(())
    }
}
