//! Remote attachment client trait definition

use crate::error::ClientError;
use crate::state::AttachmentRecord;
use crate::tags::Tags;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Remote service that owns attachments
///
/// Implementations issue one remote call per method and report absence as
/// [`ClientError::NotFound`]. They do not retry or wait; settling is the job of
/// [`crate::lifecycle::AttachmentLifecycle`].
#[async_trait]
pub trait AttachmentClient: Send + Sync {
    /// Partition used when building attachment ARNs (e.g., "aws", "aws-cn")
    fn partition(&self) -> &str {
        "aws"
    }

    /// Request a new attachment and return its id
    async fn create(&self, request: &CreateAttachmentRequest) -> Result<String, ClientError>;

    /// Read the current attachment record
    async fn get(&self, id: &str) -> Result<AttachmentRecord, ClientError>;

    /// Request deletion of an attachment
    async fn delete(&self, id: &str) -> Result<(), ClientError>;

    /// Add or overwrite tags on the resource identified by `arn`
    async fn tag_resource(&self, arn: &str, tags: &Tags) -> Result<(), ClientError>;

    /// Remove tag keys from the resource identified by `arn`
    async fn untag_resource(&self, arn: &str, keys: &[String]) -> Result<(), ClientError>;
}

/// Parameters for creating a site-to-site VPN attachment
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateAttachmentRequest {
    /// Core network the attachment joins
    pub core_network_id: String,

    /// ARN of the VPN connection being attached
    pub vpn_connection_arn: String,

    #[serde(default)]
    pub tags: Tags,
}

impl CreateAttachmentRequest {
    pub fn new(core_network_id: impl Into<String>, vpn_connection_arn: impl Into<String>) -> Self {
        Self {
            core_network_id: core_network_id.into(),
            vpn_connection_arn: vpn_connection_arn.into(),
            tags: Tags::new(),
        }
    }

    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    /// Identifies the request in errors raised before the service assigns an id
    pub fn describe(&self) -> String {
        format!("{} -> {}", self.vpn_connection_arn, self.core_network_id)
    }
}

/// Polling cadence for state waits
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PollConfig {
    /// Delay after the first probe
    pub initial_delay: Duration,

    /// Maximum delay between probes
    pub max_delay: Duration,

    /// Backoff multiplier
    pub multiplier: f64,
}

impl PollConfig {
    /// Fixed cadence
    pub fn fixed(delay: Duration) -> Self {
        Self {
            initial_delay: delay,
            max_delay: delay,
            multiplier: 1.0,
        }
    }

    /// Delay to sleep after the given (zero-based) probe attempt
    ///
    /// Never exceeds `max_delay`, whatever the multiplier.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let factor = self.multiplier.max(1.0).powi(attempt.min(32) as i32);
        let secs = self.initial_delay.as_secs_f64() * factor;
        if !secs.is_finite() || secs >= self.max_delay.as_secs_f64() {
            return self.max_delay;
        }
        Duration::try_from_secs_f64(secs)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(5),
            multiplier: 2.0,
        }
    }
}
