//! Lifecycle operation names

use serde::{Deserialize, Serialize};

/// Lifecycle operation an error or log line belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    /// Create an attachment and wait for it to settle
    Create,
    /// Read the current attachment record
    Read,
    /// Apply tag changes
    Update,
    /// Delete an attachment and wait for it to disappear
    Delete,
    /// Wait for an existing attachment to become available
    AwaitAvailable,
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Operation::Create => write!(f, "create"),
            Operation::Read => write!(f, "read"),
            Operation::Update => write!(f, "update"),
            Operation::Delete => write!(f, "delete"),
            Operation::AwaitAvailable => write!(f, "await-available"),
        }
    }
}

/// Wait timeouts for the operations that wait. Tag updates never wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub create: std::time::Duration,
    pub delete: std::time::Duration,
}

impl Timeouts {
    pub const DEFAULT: std::time::Duration = std::time::Duration::from_secs(10 * 60);
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            create: Self::DEFAULT,
            delete: Self::DEFAULT,
        }
    }
}
