//! # Operation Registry
//!
//! Maps operation names to their validate/handle pair and target queue. The
//! registry is a plain value owned by the client instance, not an ambient
//! global routing table, and it is mutated only through [`OperationRegistry::register`].
//!
//! Registration order is observable: `registered_operations` returns names in
//! the order they were first registered, with re-registration replacing the
//! stored operation but keeping its original position.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use serde_json::Value;
use tracing::debug;

use crate::context::DefaultTaskContext;
use crate::errors::{Result, TaskError};
use crate::types::{Task, DEFAULT_QUEUE_NAME};

/// A named pair of validate/handle functions bound to a target queue.
///
/// `validate` is invoked at submission time and must reject payloads the
/// handler cannot process; `handle` is invoked on the consumer side with the
/// deserialized task and a per-message context. A handler error propagates
/// unchanged to the poll loop, which treats it as a redelivery signal.
#[async_trait]
pub trait Operation<C = DefaultTaskContext>: Send + Sync {
    /// Unique name under which this operation is registered
    fn operation_name(&self) -> &str;

    /// Name of the queue tasks for this operation are submitted to
    fn queue_name(&self) -> &str {
        DEFAULT_QUEUE_NAME
    }

    /// Check the payload for correctness before it is enqueued
    async fn validate(&self, payload: &Value) -> Result<()>;

    /// Process a delivered task
    async fn handle(&self, task: &Task, context: &C) -> Result<()>;
}

type ValidateFn = dyn Fn(Value) -> BoxFuture<'static, Result<()>> + Send + Sync;
type HandleFn<C> = dyn Fn(Task, C) -> BoxFuture<'static, Result<()>> + Send + Sync;

/// Closure-backed [`Operation`] for callers that do not want a bespoke type.
///
/// The closures receive their arguments by value, so the context type must be
/// `Clone` (the default context is).
///
/// ```
/// use async_tasks::context::DefaultTaskContext;
/// use async_tasks::registry::FnOperation;
/// use async_tasks::TaskError;
///
/// let operation = FnOperation::<DefaultTaskContext>::new(
///     "SendPushNotification",
///     |payload| async move {
///         payload
///             .get("deviceToken")
///             .map(|_| ())
///             .ok_or_else(|| TaskError::validation("deviceToken required"))
///     },
///     |task, _context| async move {
///         println!("handling {}", task.task_id);
///         Ok(())
///     },
/// )
/// .with_queue("notifications");
/// ```
pub struct FnOperation<C = DefaultTaskContext> {
    operation_name: String,
    queue_name: String,
    validate: Box<ValidateFn>,
    handle: Box<HandleFn<C>>,
}

impl<C> FnOperation<C> {
    pub fn new<V, FV, H, FH>(operation_name: impl Into<String>, validate: V, handle: H) -> Self
    where
        V: Fn(Value) -> FV + Send + Sync + 'static,
        FV: std::future::Future<Output = Result<()>> + Send + 'static,
        H: Fn(Task, C) -> FH + Send + Sync + 'static,
        FH: std::future::Future<Output = Result<()>> + Send + 'static,
    {
        Self {
            operation_name: operation_name.into(),
            queue_name: DEFAULT_QUEUE_NAME.to_string(),
            validate: Box::new(move |payload| Box::pin(validate(payload))),
            handle: Box::new(move |task, context| Box::pin(handle(task, context))),
        }
    }

    /// Bind the operation to a queue other than the default
    pub fn with_queue(mut self, queue_name: impl Into<String>) -> Self {
        self.queue_name = queue_name.into();
        self
    }
}

#[async_trait]
impl<C: Clone + Send + Sync> Operation<C> for FnOperation<C> {
    fn operation_name(&self) -> &str {
        &self.operation_name
    }

    fn queue_name(&self) -> &str {
        &self.queue_name
    }

    async fn validate(&self, payload: &Value) -> Result<()> {
        (self.validate)(payload.clone()).await
    }

    async fn handle(&self, task: &Task, context: &C) -> Result<()> {
        (self.handle)(task.clone(), context.clone()).await
    }
}

/// A stored registration: the operation plus its resolved routing metadata
pub struct RegisteredOperation<C = DefaultTaskContext> {
    pub operation: Arc<dyn Operation<C>>,
    /// Queue name resolved once at registration time
    pub queue_name: String,
    pub registered_at: DateTime<Utc>,
}

impl<C> Clone for RegisteredOperation<C> {
    fn clone(&self) -> Self {
        Self {
            operation: Arc::clone(&self.operation),
            queue_name: self.queue_name.clone(),
            registered_at: self.registered_at,
        }
    }
}

/// Name-keyed table of registered operations with stable registration order
pub struct OperationRegistry<C = DefaultTaskContext> {
    routes: HashMap<String, RegisteredOperation<C>>,
    order: Vec<String>,
}

impl<C> OperationRegistry<C> {
    pub fn new() -> Self {
        Self {
            routes: HashMap::new(),
            order: Vec::new(),
        }
    }

    /// Store an operation, replacing any prior registration under the same name.
    ///
    /// Fails with a validation error when the operation or queue name is empty.
    /// Queue existence is the owning client's concern: it checks its queue table
    /// before delegating here.
    pub fn register(&mut self, operation: Arc<dyn Operation<C>>) -> Result<()> {
        let operation_name = operation.operation_name().to_string();
        if operation_name.trim().is_empty() {
            return Err(TaskError::validation("No operationName provided"));
        }

        let queue_name = operation.queue_name().to_string();
        if queue_name.trim().is_empty() {
            return Err(TaskError::validation("No queue name provided"));
        }

        if !self.routes.contains_key(&operation_name) {
            self.order.push(operation_name.clone());
        }

        debug!(
            operation_name = %operation_name,
            queue_name = %queue_name,
            "Operation registered"
        );

        self.routes.insert(
            operation_name,
            RegisteredOperation {
                operation,
                queue_name,
                registered_at: Utc::now(),
            },
        );

        Ok(())
    }

    /// Look up the registration for an operation name
    pub fn resolve(&self, operation_name: &str) -> Option<&RegisteredOperation<C>> {
        self.routes.get(operation_name)
    }

    /// Operation names in registration order
    pub fn registered_operations(&self) -> Vec<String> {
        self.order.clone()
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

impl<C> Default for OperationRegistry<C> {
    fn default() -> Self {
        Self::new()
    }
}
