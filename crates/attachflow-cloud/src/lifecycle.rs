//! Attachment lifecycle: mutate, then wait for the remote side to settle
//!
//! The caller must not run overlapping create/delete calls against the same attachment
//! id. Nothing here guards against it.

use crate::arn::Arn;
use crate::error::{ClientError, CloudError, Result};
use crate::operation::{Operation, Timeouts};
use crate::probe::AttachmentProbe;
use crate::provider::{AttachmentClient, CreateAttachmentRequest, PollConfig};
use crate::state::{AttachmentRecord, AttachmentState};
use crate::tags::{TagChanges, Tags, ignore_reserved, merge_default_tags};
use crate::waiter::{WaitSpec, wait_for_state};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

/// States a fresh attachment passes through, and where creation may stop
pub fn create_wait_spec(timeout: Duration) -> WaitSpec<AttachmentState> {
    WaitSpec::new(
        [AttachmentState::Creating, AttachmentState::PendingNetworkUpdate],
        [
            AttachmentState::Available,
            AttachmentState::PendingAttachmentAcceptance,
        ],
        timeout,
    )
}

/// Deletion completes once the attachment is gone
pub fn delete_wait_spec(timeout: Duration) -> WaitSpec<AttachmentState> {
    WaitSpec::deletion([AttachmentState::Deleting], timeout)
}

/// Availability wait; unlike creation, pending acceptance is not good enough
pub fn available_wait_spec(timeout: Duration) -> WaitSpec<AttachmentState> {
    WaitSpec::new(
        [
            AttachmentState::Creating,
            AttachmentState::PendingAttachmentAcceptance,
            AttachmentState::PendingNetworkUpdate,
        ],
        [AttachmentState::Available],
        timeout,
    )
}

/// Create, delete, wait for and retag attachments through one client
pub struct AttachmentLifecycle<'a, C: AttachmentClient + ?Sized> {
    client: &'a C,
    timeouts: Timeouts,
    poll: PollConfig,
    delete_not_found_checks: u32,
    default_tags: Tags,
    cancel: CancellationToken,
}

impl<'a, C: AttachmentClient + ?Sized> AttachmentLifecycle<'a, C> {
    pub fn new(client: &'a C) -> Self {
        Self {
            client,
            timeouts: Timeouts::default(),
            poll: PollConfig::default(),
            delete_not_found_checks: 1,
            default_tags: Tags::new(),
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_timeouts(mut self, timeouts: Timeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    pub fn with_poll_config(mut self, poll: PollConfig) -> Self {
        self.poll = poll;
        self
    }

    /// Consecutive absent observations required before a delete counts as complete
    pub fn with_delete_not_found_checks(mut self, checks: u32) -> Self {
        self.delete_not_found_checks = checks.max(1);
        self
    }

    pub fn with_default_tags(mut self, tags: Tags) -> Self {
        self.default_tags = tags;
        self
    }

    /// Token that aborts any wait in progress
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn default_tags(&self) -> &Tags {
        &self.default_tags
    }

    pub fn partition(&self) -> &str {
        self.client.partition()
    }

    /// Create an attachment and wait until it is available or awaiting acceptance
    ///
    /// An attachment that times out while creating is left in place.
    pub async fn create_and_wait(
        &self,
        request: &CreateAttachmentRequest,
    ) -> Result<AttachmentRecord> {
        request.vpn_connection_arn.parse::<Arn>()?;
        if request.core_network_id.trim().is_empty() {
            return Err(CloudError::InvalidConfig(
                "core network id must not be empty".to_string(),
            ));
        }

        let request = CreateAttachmentRequest {
            tags: merge_default_tags(&self.default_tags, &request.tags),
            ..request.clone()
        };

        tracing::debug!("Creating VPN attachment: {}", request.describe());
        let id = self
            .client
            .create(&request)
            .await
            .map_err(|e| CloudError::from_client(Operation::Create, request.describe(), e))?;
        tracing::info!("Created VPN attachment {}, waiting for it to settle", id);

        let spec = create_wait_spec(self.timeouts.create).with_poll(self.poll);
        let record = self.wait(Operation::Create, &id, &spec).await?;

        record.ok_or(CloudError::NotFound {
            operation: Operation::Create,
            id,
        })
    }

    /// Delete an attachment and wait until it is gone
    ///
    /// Deleting an attachment that no longer exists succeeds. Attachments waiting for
    /// acceptance are refused without issuing a delete.
    pub async fn delete_and_wait(&self, id: &str) -> Result<()> {
        let current = match self.client.get(id).await {
            Ok(record) => record,
            Err(ClientError::NotFound) => {
                tracing::info!("VPN attachment {} already deleted", id);
                return Ok(());
            }
            Err(err) => return Err(CloudError::from_client(Operation::Delete, id, err)),
        };

        if current.state.is_pending_acceptance() {
            return Err(CloudError::PendingAcceptance {
                id: id.to_string(),
                state: current.state,
            });
        }

        tracing::debug!("Deleting VPN attachment {} ({})", id, current.state);
        match self.client.delete(id).await {
            Ok(()) => {}
            Err(ClientError::NotFound) => {
                tracing::info!("VPN attachment {} disappeared before delete", id);
                return Ok(());
            }
            Err(err) => return Err(CloudError::from_client(Operation::Delete, id, err)),
        }

        let spec = delete_wait_spec(self.timeouts.delete)
            .with_not_found_tolerance(self.delete_not_found_checks)
            .with_poll(self.poll);
        self.wait(Operation::Delete, id, &spec).await?;

        tracing::info!("Deleted VPN attachment {}", id);
        Ok(())
    }

    /// Wait for an existing attachment to become available
    pub async fn await_available(&self, id: &str, timeout: Duration) -> Result<AttachmentRecord> {
        let spec = available_wait_spec(timeout).with_poll(self.poll);
        let record = self.wait(Operation::AwaitAvailable, id, &spec).await?;

        record.ok_or(CloudError::NotFound {
            operation: Operation::AwaitAvailable,
            id: id.to_string(),
        })
    }

    /// Current record, or `None` when the attachment no longer exists
    pub async fn read(&self, id: &str) -> Result<Option<AttachmentRecord>> {
        match self.client.get(id).await {
            Ok(record) => Ok(Some(record)),
            Err(ClientError::NotFound) => {
                tracing::warn!("VPN attachment {} not found", id);
                Ok(None)
            }
            Err(err) => Err(CloudError::from_client(Operation::Read, id, err)),
        }
    }

    /// Apply tag changes and return the re-read record. Does not wait for any state.
    pub async fn update_tags(&self, id: &str, changes: &TagChanges) -> Result<AttachmentRecord> {
        let current = self
            .client
            .get(id)
            .await
            .map_err(|e| CloudError::from_client(Operation::Update, id, e))?;

        if changes.is_empty() {
            return Ok(current);
        }

        let arn = current
            .arn(self.client.partition())
            .ok_or(CloudError::EmptyResult {
                operation: Operation::Update,
                id: id.to_string(),
            })?
            .to_string();

        let remove: Vec<String> = changes
            .remove
            .iter()
            .filter(|k| !changes.set.contains_key(*k))
            .cloned()
            .collect();
        if !remove.is_empty() {
            tracing::debug!("Removing tags {:?} from {}", remove, arn);
            self.client
                .untag_resource(&arn, &remove)
                .await
                .map_err(|e| CloudError::from_client(Operation::Update, id, e))?;
        }

        let set = ignore_reserved(&changes.set);
        if !set.is_empty() {
            tracing::debug!("Setting {} tag(s) on {}", set.len(), arn);
            self.client
                .tag_resource(&arn, &set)
                .await
                .map_err(|e| CloudError::from_client(Operation::Update, id, e))?;
        }

        self.client
            .get(id)
            .await
            .map_err(|e| CloudError::from_client(Operation::Update, id, e))
    }

    async fn wait(
        &self,
        operation: Operation,
        id: &str,
        spec: &WaitSpec<AttachmentState>,
    ) -> Result<Option<AttachmentRecord>> {
        let probe = AttachmentProbe::new(self.client, id).for_operation(operation);
        let span = tracing::info_span!("wait", %operation, attachment = %id);

        wait_for_state(&probe, spec, &self.cancel)
            .instrument(span)
            .await
            .into_result(operation, id, spec)
    }
}
