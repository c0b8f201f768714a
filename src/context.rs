//! # Per-Message Context Injection
//!
//! Handlers receive a context value derived from the raw delivered message,
//! giving them access to delivery metadata (message id, receipt handle) without
//! coupling them to the transport. The context shape is pluggable: a client is
//! generic over its context type and derives one instance per message through a
//! [`ContextProvider`].

use async_trait::async_trait;

use crate::errors::Result;
use crate::transport::QueueMessage;

/// Derives a per-message context from the raw delivered message
#[async_trait]
pub trait ContextProvider<C>: Send + Sync {
    async fn context_for(&self, message: &QueueMessage) -> Result<C>;
}

/// Context used when no custom provider is configured: the raw message, unchanged
#[derive(Debug, Clone)]
pub struct DefaultTaskContext {
    pub message: QueueMessage,
}

/// Provider backing [`DefaultTaskContext`]
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultContextProvider;

#[async_trait]
impl ContextProvider<DefaultTaskContext> for DefaultContextProvider {
    async fn context_for(&self, message: &QueueMessage) -> Result<DefaultTaskContext> {
        Ok(DefaultTaskContext {
            message: message.clone(),
        })
    }
}
