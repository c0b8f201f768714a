//! # Message Consumer Adapter
//!
//! The consumer side of the dispatch protocol: deserialize a delivered
//! message, validate the envelope shape, look up the route, derive a
//! per-message context, and invoke the handler.
//!
//! Message handling is a short state machine:
//!
//! ```text
//! Received -> Parsed -> Routed -> Handled
//! ```
//!
//! A failure at any transition is terminal for this delivery and propagates to
//! the poll loop, which decides on redelivery. The adapter performs no retries
//! and never deletes messages itself; deletion after a clean return is the
//! poll loop's concern.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use serde_json::Value;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::config::ConsumerConfig;
use crate::context::ContextProvider;
use crate::errors::{Result, TaskError};
use crate::registry::OperationRegistry;
use crate::transport::{QueueMessage, QueueTransport};
use crate::types::Task;

/// Pause after a failed receive before polling again
const POLL_ERROR_BACKOFF: Duration = Duration::from_secs(1);

/// Deserialize a delivered message, route it, and invoke the matching handler.
///
/// Fails with `MissingMessageBody` when the message has no body, with
/// `MalformedRequest` when the body is not a task envelope, and with
/// `OperationNotRegistered` when the envelope names an unknown operation; in
/// all three cases no handler is invoked. A handler failure propagates
/// unchanged.
pub async fn handle_message<C: Send + Sync>(
    message: &QueueMessage,
    registry: &RwLock<OperationRegistry<C>>,
    context_provider: &dyn ContextProvider<C>,
) -> Result<()> {
    let body = message.body.as_deref().ok_or(TaskError::MissingMessageBody)?;
    let value: Value = serde_json::from_str(body)?;

    let Some(task) = Task::from_json_value(&value) else {
        return Err(TaskError::MalformedRequest { body: value });
    };

    let operation = {
        let registry = registry.read();
        registry
            .resolve(&task.operation_name)
            .map(|entry| Arc::clone(&entry.operation))
    }
    .ok_or_else(|| TaskError::operation_not_registered(&task.operation_name))?;

    let context = context_provider.context_for(message).await?;

    debug!(
        operation_name = %task.operation_name,
        task_id = %task.task_id,
        message_id = %message.message_id,
        "Dispatching task to handler"
    );

    operation.handle(&task, &context).await
}

/// The `handle_message` callback bound to a registry and context provider,
/// in the shape an external poll engine expects
pub struct MessageHandler<C> {
    registry: Arc<RwLock<OperationRegistry<C>>>,
    context_provider: Arc<dyn ContextProvider<C>>,
}

impl<C> Clone for MessageHandler<C> {
    fn clone(&self) -> Self {
        Self {
            registry: Arc::clone(&self.registry),
            context_provider: Arc::clone(&self.context_provider),
        }
    }
}

impl<C: Send + Sync> MessageHandler<C> {
    pub fn new(
        registry: Arc<RwLock<OperationRegistry<C>>>,
        context_provider: Arc<dyn ContextProvider<C>>,
    ) -> Self {
        Self {
            registry,
            context_provider,
        }
    }

    /// Process one delivered message; an error means "do not delete, allow
    /// redelivery"
    pub async fn call(&self, message: &QueueMessage) -> Result<()> {
        handle_message(message, &self.registry, self.context_provider.as_ref()).await
    }
}

/// Poll loop for one queue: receive, dispatch, delete on clean return.
///
/// Messages whose handling fails are left undeleted so the transport redelivers
/// them after its visibility timeout.
pub struct TaskConsumer<C> {
    queue_name: String,
    queue_url: String,
    transport: Arc<dyn QueueTransport>,
    handler: MessageHandler<C>,
    config: ConsumerConfig,
}

impl<C: Send + Sync> TaskConsumer<C> {
    pub fn new(
        queue_name: impl Into<String>,
        queue_url: impl Into<String>,
        transport: Arc<dyn QueueTransport>,
        handler: MessageHandler<C>,
        config: ConsumerConfig,
    ) -> Self {
        Self {
            queue_name: queue_name.into(),
            queue_url: queue_url.into(),
            transport,
            handler,
            config,
        }
    }

    pub fn queue_name(&self) -> &str {
        &self.queue_name
    }

    /// Run a single poll cycle; returns the number of messages received
    pub async fn poll_once(&self) -> Result<usize> {
        let messages = self
            .transport
            .receive(
                &self.queue_url,
                self.config.max_messages,
                self.config.wait_seconds,
            )
            .await?;
        let received = messages.len();

        for message in messages {
            match self.handler.call(&message).await {
                Ok(()) => {
                    if let Err(error) = self
                        .transport
                        .delete(&self.queue_url, &message.receipt_handle)
                        .await
                    {
                        warn!(
                            queue_name = %self.queue_name,
                            message_id = %message.message_id,
                            error = %error,
                            "Failed to delete handled message; it will be redelivered"
                        );
                    }
                }
                Err(error) => {
                    warn!(
                        queue_name = %self.queue_name,
                        message_id = %message.message_id,
                        error = %error,
                        "Task handling failed; leaving message for redelivery"
                    );
                }
            }
        }

        Ok(received)
    }

    /// Poll until the shutdown signal flips to `true` or its sender is dropped
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        info!(queue_name = %self.queue_name, "Task consumer started");

        loop {
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
                polled = self.poll_once() => {
                    if let Err(error) = polled {
                        warn!(
                            queue_name = %self.queue_name,
                            error = %error,
                            "Poll cycle failed"
                        );
                        tokio::time::sleep(POLL_ERROR_BACKOFF).await;
                    }
                }
            }
        }

        info!(queue_name = %self.queue_name, "Task consumer stopped");
    }
}
