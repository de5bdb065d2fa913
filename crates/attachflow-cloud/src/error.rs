//! Attachment lifecycle error types

use crate::operation::Operation;
use crate::state::AttachmentState;
use std::time::Duration;
use thiserror::Error;

/// Error reported by a remote attachment client, before any lifecycle context is attached
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// The remote service does not know the attachment
    #[error("resource not found")]
    NotFound,

    /// The service answered but the payload had no usable attachment
    #[error("empty result")]
    EmptyResult,

    #[error("{0}")]
    Transport(String),
}

/// Attachment lifecycle errors
#[derive(Error, Debug)]
pub enum CloudError {
    #[error("{operation} attachment {id}: not found")]
    NotFound { operation: Operation, id: String },

    #[error("{operation} attachment {id}: service returned an empty result")]
    EmptyResult { operation: Operation, id: String },

    #[error("{operation} attachment {id}: unexpected state '{state}' (expected one of: {expected})")]
    UnexpectedState {
        operation: Operation,
        id: String,
        state: String,
        expected: String,
    },

    #[error("{operation} attachment {id}: timed out after {timeout:?} (last state: {last_state})")]
    Timeout {
        operation: Operation,
        id: String,
        timeout: Duration,
        last_state: String,
    },

    #[error("{operation} attachment {id}: API error: {message}")]
    ApiError {
        operation: Operation,
        id: String,
        message: String,
    },

    #[error("delete attachment {id}: cannot delete in {state} state, accept the attachment first")]
    PendingAcceptance { id: String, state: AttachmentState },

    #[error("{operation} attachment {id}: cancelled")]
    Cancelled { operation: Operation, id: String },

    #[error("Invalid ARN '{arn}': {reason}")]
    InvalidArn { arn: String, reason: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl CloudError {
    /// Attach lifecycle context to a client error
    pub fn from_client(operation: Operation, id: impl Into<String>, err: ClientError) -> Self {
        let id = id.into();
        match err {
            ClientError::NotFound => CloudError::NotFound { operation, id },
            ClientError::EmptyResult => CloudError::EmptyResult { operation, id },
            ClientError::Transport(message) => CloudError::ApiError {
                operation,
                id,
                message,
            },
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, CloudError::NotFound { .. })
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, CloudError::Timeout { .. })
    }

    /// Only a timeout may be retried, with a fresh deadline
    pub fn is_retryable(&self) -> bool {
        self.is_timeout()
    }

    /// Operation the error belongs to, if any
    pub fn operation(&self) -> Option<Operation> {
        match self {
            CloudError::NotFound { operation, .. }
            | CloudError::EmptyResult { operation, .. }
            | CloudError::UnexpectedState { operation, .. }
            | CloudError::Timeout { operation, .. }
            | CloudError::ApiError { operation, .. }
            | CloudError::Cancelled { operation, .. } => Some(*operation),
            CloudError::PendingAcceptance { .. } => Some(Operation::Delete),
            CloudError::InvalidArn { .. } | CloudError::InvalidConfig(_) => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, CloudError>;
