//! Shared test support: a scriptable transport that records every call and
//! can be told to fail in the ways a real queue service fails.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;

use async_tasks::errors::{Result, TaskError};
use async_tasks::registry::FnOperation;
use async_tasks::transport::{
    BatchEntry, BatchSendFailure, BatchSendOutcome, BatchSendSuccess, QueueMessage,
    QueueTransport, SendReceipt,
};
use async_tasks::DefaultTaskContext;

/// Transport double that records calls and fails on command.
///
/// Batch entries whose body contains [`MockTransport::fail_bodies_containing`]
/// markers come back as failed outcome entries; `reverse_batch_outcome` returns
/// outcome entries in reverse submission order to exercise correlation by id.
#[derive(Default)]
pub struct MockTransport {
    pub sends: Mutex<Vec<RecordedSend>>,
    pub batches: Mutex<Vec<RecordedBatch>>,
    pub deletes: Mutex<Vec<RecordedDelete>>,
    scripted_messages: Mutex<VecDeque<QueueMessage>>,
    fail_markers: Mutex<Vec<String>>,
    reverse_batch_outcome: AtomicBool,
    fail_send: AtomicBool,
    fail_batch_call: AtomicBool,
    fail_receive: AtomicBool,
    fail_delete: AtomicBool,
    sequence: AtomicUsize,
}

#[derive(Debug, Clone)]
pub struct RecordedSend {
    pub queue_url: String,
    pub body: String,
    pub delay_seconds: Option<u32>,
}

#[derive(Debug, Clone)]
pub struct RecordedBatch {
    pub queue_url: String,
    pub entries: Vec<BatchEntry>,
}

#[derive(Debug, Clone)]
pub struct RecordedDelete {
    pub queue_url: String,
    pub receipt_handle: String,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Batch entries whose body contains `marker` fail with a throttling code
    pub fn fail_bodies_containing(&self, marker: impl Into<String>) {
        self.fail_markers.lock().push(marker.into());
    }

    /// Return batch outcome entries in reverse submission order
    pub fn reverse_batch_outcome(&self) {
        self.reverse_batch_outcome.store(true, Ordering::SeqCst);
    }

    pub fn fail_next_send(&self) {
        self.fail_send.store(true, Ordering::SeqCst);
    }

    pub fn fail_batch_calls(&self) {
        self.fail_batch_call.store(true, Ordering::SeqCst);
    }

    pub fn fail_receives(&self) {
        self.fail_receive.store(true, Ordering::SeqCst);
    }

    pub fn fail_deletes(&self) {
        self.fail_delete.store(true, Ordering::SeqCst);
    }

    /// Queue a message for the next `receive` call
    pub fn push_message(&self, body: Option<&str>) {
        let seq = self.sequence.fetch_add(1, Ordering::SeqCst);
        self.scripted_messages.lock().push_back(QueueMessage {
            message_id: format!("mock-msg-{seq}"),
            body: body.map(str::to_string),
            receipt_handle: format!("mock-receipt-{seq}"),
        });
    }

    pub fn send_count(&self) -> usize {
        self.sends.lock().len()
    }

    pub fn batch_count(&self) -> usize {
        self.batches.lock().len()
    }

    pub fn delete_count(&self) -> usize {
        self.deletes.lock().len()
    }

    fn marked_failed(&self, body: &str) -> bool {
        self.fail_markers
            .lock()
            .iter()
            .any(|marker| body.contains(marker.as_str()))
    }
}

#[async_trait]
impl QueueTransport for MockTransport {
    async fn send(
        &self,
        queue_url: &str,
        body: &str,
        delay_seconds: Option<u32>,
    ) -> Result<SendReceipt> {
        if self.fail_send.swap(false, Ordering::SeqCst) {
            return Err(TaskError::transport(queue_url, "send", "connection reset"));
        }
        let seq = self.sequence.fetch_add(1, Ordering::SeqCst);
        self.sends.lock().push(RecordedSend {
            queue_url: queue_url.to_string(),
            body: body.to_string(),
            delay_seconds,
        });
        Ok(SendReceipt {
            message_id: Some(format!("mock-msg-{seq}")),
        })
    }

    async fn send_batch(&self, queue_url: &str, entries: &[BatchEntry]) -> Result<BatchSendOutcome> {
        if self.fail_batch_call.load(Ordering::SeqCst) {
            return Err(TaskError::transport(
                queue_url,
                "send_batch",
                "service unavailable",
            ));
        }
        self.batches.lock().push(RecordedBatch {
            queue_url: queue_url.to_string(),
            entries: entries.to_vec(),
        });

        let mut outcome = BatchSendOutcome::default();
        for entry in entries {
            if self.marked_failed(&entry.body) {
                outcome.failed.push(BatchSendFailure {
                    id: entry.id.clone(),
                    sender_fault: false,
                    code: "ThrottlingException".to_string(),
                    message: Some("rate exceeded".to_string()),
                });
            } else {
                let seq = self.sequence.fetch_add(1, Ordering::SeqCst);
                outcome.successful.push(BatchSendSuccess {
                    id: entry.id.clone(),
                    message_id: Some(format!("mock-msg-{seq}")),
                });
            }
        }
        if self.reverse_batch_outcome.load(Ordering::SeqCst) {
            outcome.successful.reverse();
            outcome.failed.reverse();
        }
        Ok(outcome)
    }

    async fn receive(
        &self,
        queue_url: &str,
        max_messages: u32,
        _wait_seconds: u32,
    ) -> Result<Vec<QueueMessage>> {
        if self.fail_receive.load(Ordering::SeqCst) {
            return Err(TaskError::transport(
                queue_url,
                "receive",
                "connection reset",
            ));
        }
        let mut scripted = self.scripted_messages.lock();
        let count = scripted.len().min(max_messages as usize);
        Ok(scripted.drain(..count).collect())
    }

    async fn delete(&self, queue_url: &str, receipt_handle: &str) -> Result<()> {
        if self.fail_delete.load(Ordering::SeqCst) {
            return Err(TaskError::transport(queue_url, "delete", "receipt expired"));
        }
        self.deletes.lock().push(RecordedDelete {
            queue_url: queue_url.to_string(),
            receipt_handle: receipt_handle.to_string(),
        });
        Ok(())
    }
}

/// Operation that accepts any payload and does nothing
pub fn accepting_operation(name: &str) -> FnOperation<DefaultTaskContext> {
    FnOperation::new(name, |_payload| async { Ok(()) }, |_task, _context| async {
        Ok(())
    })
}

/// Operation bound to a named queue
pub fn queued_operation(name: &str, queue: &str) -> FnOperation<DefaultTaskContext> {
    accepting_operation(name).with_queue(queue)
}

/// Operation whose validator rejects payloads missing a `"to"` field
pub fn strict_operation(name: &str) -> FnOperation<DefaultTaskContext> {
    FnOperation::new(
        name,
        |payload: serde_json::Value| async move {
            if payload.get("to").is_none() {
                return Err(TaskError::validation("payload requires a `to` field"));
            }
            Ok(())
        },
        |_task, _context| async { Ok(()) },
    )
}
