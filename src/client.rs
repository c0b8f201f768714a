//! # Task Client: Dispatch and Batch Reconciliation
//!
//! The submission path of the dispatch protocol. A client owns the queue table
//! and the operation registry, routes each submission through its operation's
//! validator, stamps a fresh task id, and hands the serialized envelope to the
//! queue transport.
//!
//! ## Batch semantics
//!
//! `submit_all_tasks` runs an all-or-nothing pre-flight: every input is looked
//! up and validated, concurrently, before any transport call. A single
//! pre-flight failure aborts the whole batch. Surviving tasks are grouped by
//! destination queue, one batch-send is issued per queue (all concurrently),
//! and the transport's unordered, id-correlated response is reconciled back
//! into one result entry per input, in input order. Per-item transport
//! failures are reported as `Failed` entries, never as a propagated error.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future;
use parking_lot::RwLock;
use tracing::debug;

use crate::config::{ClientConfiguration, ConsumerConfig};
use crate::consumer::{MessageHandler, TaskConsumer};
use crate::context::{ContextProvider, DefaultContextProvider, DefaultTaskContext};
use crate::errors::{Result, TaskError};
use crate::registry::{Operation, OperationRegistry};
use crate::transport::{BatchEntry, BatchSendFailure, QueueTransport, MAX_DELAY_SECONDS};
use crate::types::{
    BatchSubmitEntry, BatchSubmitStatus, QueueConfiguration, SubmitAllTasksResponse,
    SubmitTaskInput, SubmitTaskResponse, Task, DEFAULT_QUEUE_NAME,
};

/// Submission interface shared by the transport-backed client and the no-op
/// stand-in
#[async_trait]
pub trait TaskClient<C = DefaultTaskContext>: Send + Sync {
    /// Operation names in registration order
    fn registered_operations(&self) -> Vec<String>;

    /// Register an operation; must complete before submissions are accepted
    fn register_operation(&self, operation: Arc<dyn Operation<C>>) -> Result<()>;

    /// Validate, serialize, and enqueue a single task
    async fn submit_task(&self, input: SubmitTaskInput) -> Result<SubmitTaskResponse>;

    /// Validate and enqueue a batch of tasks with per-item outcome
    /// classification, results in input order
    async fn submit_all_tasks(&self, inputs: Vec<SubmitTaskInput>) -> Result<SubmitAllTasksResponse>;
}

/// A pre-flighted submission: the routed task plus its resolved destination
struct RoutedTask {
    task: Task,
    queue_name: String,
    delay_seconds: Option<u32>,
}

/// Transport-backed task client.
///
/// Handles configuring queues, registering operations, and enqueueing and
/// dequeueing tasks for processing.
pub struct AsyncTaskClient<C = DefaultTaskContext> {
    transport: Arc<dyn QueueTransport>,
    /// Read-only after construction
    queues: HashMap<String, QueueConfiguration>,
    registry: Arc<RwLock<OperationRegistry<C>>>,
    context_provider: Arc<dyn ContextProvider<C>>,
    consumer_config: ConsumerConfig,
}

impl AsyncTaskClient<DefaultTaskContext> {
    /// Build a client with the default per-message context
    pub fn new(config: ClientConfiguration, transport: Arc<dyn QueueTransport>) -> Self {
        Self::with_context_provider(config, transport, Arc::new(DefaultContextProvider))
    }
}

impl<C: Send + Sync + 'static> AsyncTaskClient<C> {
    /// Build a client with a custom per-message context provider
    pub fn with_context_provider(
        config: ClientConfiguration,
        transport: Arc<dyn QueueTransport>,
        context_provider: Arc<dyn ContextProvider<C>>,
    ) -> Self {
        let mut queues = config.queues;
        queues.insert(DEFAULT_QUEUE_NAME.to_string(), config.default_queue);

        Self {
            transport,
            queues,
            registry: Arc::new(RwLock::new(OperationRegistry::new())),
            context_provider,
            consumer_config: ConsumerConfig::default(),
        }
    }

    /// Override the polling parameters used by [`task_consumers`](Self::task_consumers)
    pub fn with_consumer_config(mut self, consumer_config: ConsumerConfig) -> Self {
        self.consumer_config = consumer_config;
        self
    }

    /// Names of all configured queues, including `default`
    pub fn queue_names(&self) -> Vec<String> {
        self.queues.keys().cloned().collect()
    }

    /// The message-handling callback for an external poll engine
    pub fn message_handler(&self) -> MessageHandler<C> {
        MessageHandler::new(
            Arc::clone(&self.registry),
            Arc::clone(&self.context_provider),
        )
    }

    /// Build a consumer for one configured queue
    pub fn consumer_for(&self, queue_name: &str) -> Result<TaskConsumer<C>> {
        let queue = self
            .queues
            .get(queue_name)
            .ok_or_else(|| TaskError::queue_not_registered(queue_name))?;
        self.consumer_config.validate()?;

        Ok(TaskConsumer::new(
            queue_name,
            &queue.queue_url,
            Arc::clone(&self.transport),
            self.message_handler(),
            self.consumer_config,
        ))
    }

    /// Build one consumer per configured queue
    pub fn task_consumers(&self) -> Result<Vec<TaskConsumer<C>>> {
        self.queues
            .keys()
            .map(|queue_name| self.consumer_for(queue_name))
            .collect()
    }

    /// Steps 1-3 of the submission path: look up the operation, validate the
    /// payload, and resolve the destination queue. No transport call is made
    /// and no task id is issued until all three succeed.
    async fn route_to_task(&self, input: &SubmitTaskInput) -> Result<RoutedTask> {
        let (operation, queue_name) = {
            let registry = self.registry.read();
            let entry = registry
                .resolve(&input.operation_name)
                .ok_or_else(|| TaskError::operation_not_registered(&input.operation_name))?;
            (Arc::clone(&entry.operation), entry.queue_name.clone())
        };

        operation
            .validate(&input.payload)
            .await
            .map_err(|err| TaskError::invalid_payload(&input.operation_name, err))?;

        if let Some(delay) = input.delay_seconds {
            if delay > MAX_DELAY_SECONDS {
                return Err(TaskError::validation(format!(
                    "delay_seconds {delay} exceeds the transport maximum of {MAX_DELAY_SECONDS}"
                )));
            }
        }

        // Queues were checked at registration time; re-check in case the
        // operation was registered against a different client's queue table
        if !self.queues.contains_key(&queue_name) {
            return Err(TaskError::queue_not_registered(queue_name));
        }

        Ok(RoutedTask {
            task: Task::new(&input.operation_name, input.payload.clone()),
            queue_name,
            delay_seconds: input.delay_seconds,
        })
    }
}

#[async_trait]
impl<C: Send + Sync + 'static> TaskClient<C> for AsyncTaskClient<C> {
    fn registered_operations(&self) -> Vec<String> {
        self.registry.read().registered_operations()
    }

    /// Register an operation with the client.
    ///
    /// Operations must have a name, a validation function, and a handler
    /// function, and may bind to a named queue (defaulting to `default`).
    /// Fails when the resolved queue is not configured on this client.
    fn register_operation(&self, operation: Arc<dyn Operation<C>>) -> Result<()> {
        if operation.operation_name().trim().is_empty() {
            return Err(TaskError::validation("No operationName provided"));
        }

        let queue_name = operation.queue_name();
        if !self.queues.contains_key(queue_name) {
            return Err(TaskError::queue_not_registered(queue_name));
        }

        self.registry.write().register(operation)
    }

    async fn submit_task(&self, input: SubmitTaskInput) -> Result<SubmitTaskResponse> {
        let routed = self.route_to_task(&input).await?;
        let queue = self
            .queues
            .get(&routed.queue_name)
            .ok_or_else(|| TaskError::queue_not_registered(&routed.queue_name))?;

        let body = routed.task.to_json_string()?;
        let receipt = self
            .transport
            .send(&queue.queue_url, &body, routed.delay_seconds)
            .await?;

        debug!(
            operation_name = %routed.task.operation_name,
            task_id = %routed.task.task_id,
            queue_name = %routed.queue_name,
            message_id = receipt.message_id.as_deref().unwrap_or(""),
            "Task submitted"
        );

        Ok(SubmitTaskResponse {
            task_id: routed.task.task_id,
            message_id: receipt.message_id,
        })
    }

    async fn submit_all_tasks(
        &self,
        inputs: Vec<SubmitTaskInput>,
    ) -> Result<SubmitAllTasksResponse> {
        // All-or-nothing pre-flight, fanned out concurrently: no transport
        // call happens if any input fails lookup or validation
        let routed =
            future::try_join_all(inputs.iter().map(|input| self.route_to_task(input))).await?;

        // Group entries by destination queue, preserving relative input order
        let mut entries_by_queue: HashMap<String, Vec<BatchEntry>> = HashMap::new();
        for item in &routed {
            entries_by_queue
                .entry(item.queue_name.clone())
                .or_default()
                .push(BatchEntry {
                    id: item.task.task_id.clone(),
                    body: item.task.to_json_string()?,
                    delay_seconds: item.delay_seconds,
                });
        }

        // Exactly one batch call per distinct destination queue, all in flight
        // at once
        let mut sends = Vec::with_capacity(entries_by_queue.len());
        for (queue_name, entries) in entries_by_queue {
            let queue = self
                .queues
                .get(&queue_name)
                .ok_or_else(|| TaskError::queue_not_registered(&queue_name))?;
            let queue_url = queue.queue_url.clone();
            let transport = Arc::clone(&self.transport);

            sends.push(async move {
                debug!(
                    queue_name = %queue_name,
                    entry_count = entries.len(),
                    "Submitting task batch"
                );
                transport.send_batch(&queue_url, &entries).await
            });
        }
        let outcomes = future::try_join_all(sends).await?;

        // Correlate by task id; the transport's response order carries no meaning
        let mut failed_by_task_id: HashMap<String, BatchSendFailure> = HashMap::new();
        for outcome in outcomes {
            for failure in outcome.failed {
                failed_by_task_id.insert(failure.id.clone(), failure);
            }
        }

        let results = routed
            .into_iter()
            .map(|item| {
                let task_id = item.task.task_id;
                match failed_by_task_id.remove(&task_id) {
                    Some(error) => BatchSubmitEntry {
                        task_id,
                        status: BatchSubmitStatus::Failed,
                        error: Some(error),
                    },
                    None => BatchSubmitEntry {
                        task_id,
                        status: BatchSubmitStatus::Successful,
                        error: None,
                    },
                }
            })
            .collect();

        Ok(SubmitAllTasksResponse { results })
    }
}
