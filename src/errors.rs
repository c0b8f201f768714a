//! # Error Types
//!
//! Structured error handling for registration, dispatch, and message consumption
//! using thiserror instead of `Box<dyn Error>` patterns.
//!
//! The taxonomy mirrors the failure surfaces of the dispatch protocol:
//!
//! - Registration-time programming errors (`Validation`, `QueueNotRegistered`)
//! - Submission-time routing errors (`OperationNotRegistered`, `InvalidPayload`)
//! - Consumer-side envelope errors (`MissingMessageBody`, `MalformedRequest`)
//! - Transport and codec failures (`Transport`, `Serialization`, `Deserialization`)

use thiserror::Error;

/// Error type covering registration, submission, and consumption failures
#[derive(Error, Debug)]
pub enum TaskError {
    /// Bad registration input or an out-of-range submission parameter
    #[error("Validation error: {message}")]
    Validation { message: String },

    /// A registration or route references a queue that is not configured
    #[error("No queue configured for queue name: {queue_name}")]
    QueueNotRegistered { queue_name: String },

    /// A submission or inbound message names an operation that was never registered
    #[error("Async operation is not registered: {operation_name}")]
    OperationNotRegistered { operation_name: String },

    /// The payload failed the operation's validator; enqueue was never attempted
    #[error("Payload validation failed for operation: {operation_name}")]
    InvalidPayload {
        operation_name: String,
        #[source]
        source: Box<TaskError>,
    },

    /// An inbound message body does not match the task envelope shape.
    ///
    /// Carries the offending parsed structure for diagnostics. Redelivery will
    /// not help here: the shape of the message is not going to change.
    #[error("Malformed task envelope: {body}")]
    MalformedRequest { body: serde_json::Value },

    /// A delivered message arrived without a body
    #[error("expected message to have a body")]
    MissingMessageBody,

    /// Message serialization error
    #[error("Message serialization error: {message}")]
    Serialization { message: String },

    /// Message deserialization error
    #[error("Message deserialization error: {message}")]
    Deserialization { message: String },

    /// A queue transport call failed
    #[error("Transport operation failed: {queue_url}: {operation}: {message}")]
    Transport {
        queue_url: String,
        operation: String,
        message: String,
    },

    /// A task handler reported a failure; the consumer loop treats this as a
    /// signal to leave the message for redelivery
    #[error("Handler failed for operation: {operation_name}: {message}")]
    Handler {
        operation_name: String,
        message: String,
    },
}

impl TaskError {
    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a queue-not-registered error
    pub fn queue_not_registered(queue_name: impl Into<String>) -> Self {
        Self::QueueNotRegistered {
            queue_name: queue_name.into(),
        }
    }

    /// Create an operation-not-registered error
    pub fn operation_not_registered(operation_name: impl Into<String>) -> Self {
        Self::OperationNotRegistered {
            operation_name: operation_name.into(),
        }
    }

    /// Wrap a validator failure, preserving the underlying cause
    pub fn invalid_payload(operation_name: impl Into<String>, source: TaskError) -> Self {
        Self::InvalidPayload {
            operation_name: operation_name.into(),
            source: Box::new(source),
        }
    }

    /// Create a serialization error
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }

    /// Create a deserialization error
    pub fn deserialization(message: impl Into<String>) -> Self {
        Self::Deserialization {
            message: message.into(),
        }
    }

    /// Create a transport error
    pub fn transport(
        queue_url: impl Into<String>,
        operation: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Transport {
            queue_url: queue_url.into(),
            operation: operation.into(),
            message: message.into(),
        }
    }

    /// Create a handler error
    pub fn handler(operation_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Handler {
            operation_name: operation_name.into(),
            message: message.into(),
        }
    }
}

/// Conversion from serde_json::Error to TaskError
impl From<serde_json::Error> for TaskError {
    fn from(err: serde_json::Error) -> Self {
        if err.is_syntax() || err.is_data() || err.is_eof() {
            TaskError::deserialization(err.to_string())
        } else {
            TaskError::serialization(err.to_string())
        }
    }
}

/// Result type alias for task dispatch operations
pub type Result<T> = std::result::Result<T, TaskError>;
