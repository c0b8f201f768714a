//! # Task Envelope and Submission Types
//!
//! Defines the wire format for tasks and the request/response types exchanged
//! with a [`TaskClient`](crate::client::TaskClient).
//!
//! The wire format is a flat JSON object with the keys `taskId`, `operationName`,
//! and `payload`. Nothing else is required for correctness; consumers must reject
//! any message body that does not carry all three.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::errors::Result;
use crate::transport::BatchSendFailure;

/// Name of the queue every client configures implicitly
pub const DEFAULT_QUEUE_NAME: &str = "default";

/// Addressing information for a single configured queue
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueConfiguration {
    /// Opaque transport address for the queue (e.g. an SQS queue URL)
    pub queue_url: String,
}

impl QueueConfiguration {
    pub fn new(queue_url: impl Into<String>) -> Self {
        Self {
            queue_url: queue_url.into(),
        }
    }
}

/// The durable unit of work serialized onto the transport.
///
/// A task is immutable after creation: the structure built at submission time is
/// exactly what travels through the queue and reaches the handler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Opaque unique identifier generated fresh at submission time.
    ///
    /// This is the durable correlation key for the task; the transport's message
    /// id is advisory and not guaranteed retrievable in all failure modes.
    pub task_id: String,
    /// Name of the registered operation that will handle this task
    pub operation_name: String,
    /// Arbitrary JSON-serializable payload
    pub payload: Value,
}

impl Task {
    /// Build a task with a freshly generated id
    pub fn new(operation_name: impl Into<String>, payload: Value) -> Self {
        Self {
            task_id: Uuid::new_v4().to_string(),
            operation_name: operation_name.into(),
            payload,
        }
    }

    /// Serialize the envelope to its wire representation
    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Reconstruct a task from a parsed message body.
    ///
    /// Returns `None` when the body does not match the envelope shape: `taskId`
    /// and `operationName` must be non-empty strings and `payload` must be
    /// present and non-null.
    pub fn from_json_value(value: &Value) -> Option<Self> {
        let task_id = value.get("taskId")?.as_str().filter(|s| !s.is_empty())?;
        let operation_name = value
            .get("operationName")?
            .as_str()
            .filter(|s| !s.is_empty())?;
        let payload = value.get("payload").filter(|p| !p.is_null())?;

        Some(Self {
            task_id: task_id.to_string(),
            operation_name: operation_name.to_string(),
            payload: payload.clone(),
        })
    }
}

/// A single task submission request
#[derive(Debug, Clone)]
pub struct SubmitTaskInput {
    /// Name of a registered operation
    pub operation_name: String,
    /// Payload handed to the operation's validator and, later, its handler
    pub payload: Value,
    /// Optional delivery delay, bounded by the transport maximum
    pub delay_seconds: Option<u32>,
}

impl SubmitTaskInput {
    pub fn new(operation_name: impl Into<String>, payload: Value) -> Self {
        Self {
            operation_name: operation_name.into(),
            payload,
            delay_seconds: None,
        }
    }

    pub fn with_delay_seconds(mut self, delay_seconds: u32) -> Self {
        self.delay_seconds = Some(delay_seconds);
        self
    }
}

/// Response for a single task submission
#[derive(Debug, Clone)]
pub struct SubmitTaskResponse {
    /// The generated task identifier; treat this as the durable correlation key
    pub task_id: String,
    /// Transport-assigned message id, when the transport reported one
    pub message_id: Option<String>,
}

/// Per-item outcome classification for a batch submission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BatchSubmitStatus {
    Successful,
    Failed,
}

/// One entry of a batch submission result, in the order the inputs were given
#[derive(Debug, Clone)]
pub struct BatchSubmitEntry {
    pub task_id: String,
    pub status: BatchSubmitStatus,
    /// Transport failure detail, present only for `Failed` entries
    pub error: Option<BatchSendFailure>,
}

/// Result of a batch submission.
///
/// `results` is ordered to match the submitted inputs, regardless of the order
/// in which the transport reported successes and failures.
#[derive(Debug, Clone)]
pub struct SubmitAllTasksResponse {
    pub results: Vec<BatchSubmitEntry>,
}
