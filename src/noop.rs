//! # No-op Task Client
//!
//! A [`TaskClient`] stand-in that never touches a transport. Registration skips
//! queue checks (there is no queue table) and submissions run the full
//! pre-flight (lookup, payload validation, delay bound) and then succeed with
//! placeholder identifiers. Useful in development and in tests that only care
//! about the submission contract.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::client::TaskClient;
use crate::context::DefaultTaskContext;
use crate::errors::{Result, TaskError};
use crate::registry::{Operation, OperationRegistry};
use crate::transport::MAX_DELAY_SECONDS;
use crate::types::{
    BatchSubmitEntry, BatchSubmitStatus, SubmitAllTasksResponse, SubmitTaskInput,
    SubmitTaskResponse,
};

/// Placeholder task id returned by every no-op submission
pub const NOOP_TASK_ID: &str = "not-a-valid-task-id";

/// Placeholder message id returned by every no-op submission
pub const NOOP_MESSAGE_ID: &str = "not-a-real-message-id";

pub struct NoopClient<C = DefaultTaskContext> {
    registry: RwLock<OperationRegistry<C>>,
}

impl<C> Default for NoopClient<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> NoopClient<C> {
    pub fn new() -> Self {
        Self {
            registry: RwLock::new(OperationRegistry::new()),
        }
    }

    /// Lookup, validation, and delay bound, everything short of a transport call
    async fn route(&self, input: &SubmitTaskInput) -> Result<()> {
        let operation = {
            let registry = self.registry.read();
            registry
                .resolve(&input.operation_name)
                .map(|entry| Arc::clone(&entry.operation))
        }
        .ok_or_else(|| TaskError::operation_not_registered(&input.operation_name))?;

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

        Ok(())
    }
}

#[async_trait]
impl<C: Send + Sync + 'static> TaskClient<C> for NoopClient<C> {
    fn registered_operations(&self) -> Vec<String> {
        self.registry.read().registered_operations()
    }

    fn register_operation(&self, operation: Arc<dyn Operation<C>>) -> Result<()> {
        self.registry.write().register(operation)
    }

    async fn submit_task(&self, input: SubmitTaskInput) -> Result<SubmitTaskResponse> {
        self.route(&input).await?;

        Ok(SubmitTaskResponse {
            task_id: NOOP_TASK_ID.to_string(),
            message_id: Some(NOOP_MESSAGE_ID.to_string()),
        })
    }

    async fn submit_all_tasks(
        &self,
        inputs: Vec<SubmitTaskInput>,
    ) -> Result<SubmitAllTasksResponse> {
        for input in &inputs {
            self.route(input).await?;
        }

        let results = inputs
            .iter()
            .map(|_| BatchSubmitEntry {
                task_id: NOOP_TASK_ID.to_string(),
                status: BatchSubmitStatus::Successful,
                error: None,
            })
            .collect();

        Ok(SubmitAllTasksResponse { results })
    }
}
