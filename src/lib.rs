#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Async Tasks
//!
//! Typed task dispatch over an at-least-once message queue.
//!
//! ## Overview
//!
//! This crate layers a task abstraction on top of any queue transport with
//! at-least-once delivery semantics. Producers register named operations,
//! submit payloads, and get back durable task identifiers; consumers poll
//! queues, deserialize task envelopes, and route them to the registered
//! handler with a per-message context.
//!
//! ## Architecture
//!
//! The producer and consumer sides share a single [`registry::OperationRegistry`]:
//! registration binds an operation name to a payload validator, a handler, and
//! a destination queue. [`client::AsyncTaskClient`] routes submissions through
//! the registry onto a [`transport::QueueTransport`], while
//! [`consumer::TaskConsumer`] drives the reverse path from received messages
//! back into handlers.
//!
//! ## Module Organization
//!
//! - [`client`] - Task submission client and the `TaskClient` trait
//! - [`config`] - Client and consumer configuration
//! - [`consumer`] - Message polling and handler dispatch
//! - [`context`] - Per-message context derivation
//! - [`errors`] - Structured error handling
//! - [`noop`] - Transport-free client for tests and dry runs
//! - [`registry`] - Operation registration and lookup
//! - [`transport`] - Queue transport trait and in-memory implementation
//! - [`types`] - Task envelope and submission types
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use async_tasks::client::{AsyncTaskClient, TaskClient};
//! use async_tasks::config::ClientConfiguration;
//! use async_tasks::registry::FnOperation;
//! use async_tasks::transport::InMemoryTransport;
//! use async_tasks::types::{QueueConfiguration, SubmitTaskInput};
//!
//! # async fn example() -> async_tasks::errors::Result<()> {
//! let transport = Arc::new(InMemoryTransport::new());
//! let client = AsyncTaskClient::new(
//!     ClientConfiguration::new(QueueConfiguration::new("queue://default")),
//!     transport,
//! );
//!
//! client.register_operation(Arc::new(FnOperation::new(
//!     "send-email",
//!     |_payload| async { Ok(()) },
//!     |task, _context| async move {
//!         println!("handling task {}", task.task_id);
//!         Ok(())
//!     },
//! )))?;
//!
//! let response = client
//!     .submit_task(SubmitTaskInput::new(
//!         "send-email",
//!         serde_json::json!({"to": "user@example.com"}),
//!     ))
//!     .await?;
//! println!("submitted task {}", response.task_id);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod consumer;
pub mod context;
pub mod errors;
pub mod logging;
pub mod noop;
pub mod registry;
pub mod transport;
pub mod types;

pub use client::{AsyncTaskClient, TaskClient};
pub use config::{ClientConfiguration, ConsumerConfig};
pub use consumer::{MessageHandler, TaskConsumer};
pub use context::{ContextProvider, DefaultContextProvider, DefaultTaskContext};
pub use errors::{Result, TaskError};
pub use noop::NoopClient;
pub use registry::{FnOperation, Operation, OperationRegistry};
pub use transport::{InMemoryTransport, QueueTransport};
pub use types::{
    QueueConfiguration, SubmitAllTasksResponse, SubmitTaskInput, SubmitTaskResponse, Task,
    DEFAULT_QUEUE_NAME,
};
