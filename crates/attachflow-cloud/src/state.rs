//! Attachment state taxonomy and resource record
//!
//! [`AttachmentState`] is the vocabulary the remote service reports. Absence is not part of
//! it: a probe that finds nothing yields [`crate::probe::Observation::Absent`].

use crate::arn::Arn;
use crate::tags::{Tags, ignore_reserved, remove_default_tags};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// State reported by the remote service for an attachment
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum AttachmentState {
    Creating,
    PendingNetworkUpdate,
    PendingAttachmentAcceptance,
    PendingTagAcceptance,
    Available,
    Updating,
    Deleting,
    Rejected,
    Failed,
    /// A label outside the known vocabulary, kept verbatim
    Other(String),
}

impl AttachmentState {
    /// Whether an external accept step has to happen before the attachment can change
    pub fn is_pending_acceptance(&self) -> bool {
        matches!(
            self,
            AttachmentState::PendingAttachmentAcceptance | AttachmentState::PendingTagAcceptance
        )
    }

    pub fn as_str(&self) -> &str {
        match self {
            AttachmentState::Creating => "creating",
            AttachmentState::PendingNetworkUpdate => "pending-network-update",
            AttachmentState::PendingAttachmentAcceptance => "pending-attachment-acceptance",
            AttachmentState::PendingTagAcceptance => "pending-tag-acceptance",
            AttachmentState::Available => "available",
            AttachmentState::Updating => "updating",
            AttachmentState::Deleting => "deleting",
            AttachmentState::Rejected => "rejected",
            AttachmentState::Failed => "failed",
            AttachmentState::Other(label) => label,
        }
    }

    /// Parse either the wire spelling (`PENDING_NETWORK_UPDATE`) or the kebab spelling
    pub fn from_label(label: &str) -> Self {
        let normalized = label.trim().to_ascii_lowercase().replace('_', "-");
        match normalized.as_str() {
            "creating" => AttachmentState::Creating,
            "pending-network-update" => AttachmentState::PendingNetworkUpdate,
            "pending-attachment-acceptance" => AttachmentState::PendingAttachmentAcceptance,
            "pending-tag-acceptance" => AttachmentState::PendingTagAcceptance,
            "available" => AttachmentState::Available,
            "updating" => AttachmentState::Updating,
            "deleting" => AttachmentState::Deleting,
            "rejected" => AttachmentState::Rejected,
            "failed" => AttachmentState::Failed,
            _ => AttachmentState::Other(label.to_string()),
        }
    }
}

impl std::fmt::Display for AttachmentState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for AttachmentState {
    fn from(label: String) -> Self {
        AttachmentState::from_label(&label)
    }
}

impl From<&str> for AttachmentState {
    fn from(label: &str) -> Self {
        AttachmentState::from_label(label)
    }
}

impl From<AttachmentState> for String {
    fn from(state: AttachmentState) -> Self {
        state.as_str().to_string()
    }
}

/// Snapshot of an attachment as returned by a single read
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttachmentRecord {
    pub attachment_id: String,

    pub state: AttachmentState,

    pub core_network_id: Option<String>,

    pub core_network_arn: Option<String>,

    /// e.g. "SITE_TO_SITE_VPN"
    pub attachment_type: Option<String>,

    pub attachment_policy_rule_number: Option<i32>,

    pub owner_account_id: Option<String>,

    pub edge_location: Option<String>,

    /// ARN of the backing resource (the VPN connection)
    pub resource_arn: Option<String>,

    pub segment_name: Option<String>,

    #[serde(default)]
    pub tags: Tags,

    pub created_at: Option<DateTime<Utc>>,

    pub updated_at: Option<DateTime<Utc>>,
}

impl AttachmentRecord {
    pub fn new(attachment_id: impl Into<String>, state: AttachmentState) -> Self {
        Self {
            attachment_id: attachment_id.into(),
            state,
            core_network_id: None,
            core_network_arn: None,
            attachment_type: None,
            attachment_policy_rule_number: None,
            owner_account_id: None,
            edge_location: None,
            resource_arn: None,
            segment_name: None,
            tags: Tags::new(),
            created_at: None,
            updated_at: None,
        }
    }

    pub fn with_core_network(mut self, id: impl Into<String>) -> Self {
        self.core_network_id = Some(id.into());
        self
    }

    pub fn with_resource_arn(mut self, arn: impl Into<String>) -> Self {
        self.resource_arn = Some(arn.into());
        self
    }

    pub fn with_owner(mut self, account_id: impl Into<String>) -> Self {
        self.owner_account_id = Some(account_id.into());
        self
    }

    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    /// Attachment ARN, available once the owning account is known
    pub fn arn(&self, partition: &str) -> Option<Arn> {
        self.owner_account_id
            .as_deref()
            .map(|account| Arn::attachment(partition, account, &self.attachment_id))
    }

    /// Flatten the record into a named attribute set
    pub fn attributes(
        &self,
        partition: &str,
        default_tags: &Tags,
    ) -> BTreeMap<String, serde_json::Value> {
        use serde_json::json;

        let tags_all = ignore_reserved(&self.tags);
        let tags = remove_default_tags(&tags_all, default_tags);

        let mut attrs = BTreeMap::new();
        attrs.insert("id".to_string(), json!(self.attachment_id));
        attrs.insert(
            "arn".to_string(),
            json!(self.arn(partition).map(|a| a.to_string())),
        );
        attrs.insert(
            "attachment_policy_rule_number".to_string(),
            json!(self.attachment_policy_rule_number),
        );
        attrs.insert("attachment_type".to_string(), json!(self.attachment_type));
        attrs.insert("core_network_arn".to_string(), json!(self.core_network_arn));
        attrs.insert("core_network_id".to_string(), json!(self.core_network_id));
        attrs.insert("edge_location".to_string(), json!(self.edge_location));
        attrs.insert("owner_account_id".to_string(), json!(self.owner_account_id));
        attrs.insert("resource_arn".to_string(), json!(self.resource_arn));
        attrs.insert("segment_name".to_string(), json!(self.segment_name));
        attrs.insert("state".to_string(), json!(self.state.as_str()));
        attrs.insert("vpn_arn".to_string(), json!(self.resource_arn));
        attrs.insert("tags".to_string(), json!(tags));
        attrs.insert("tags_all".to_string(), json!(tags_all));
        attrs
    }
}
