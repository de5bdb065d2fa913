//! Network Manager API client
//!
//! One SDK call per trait method. `ResourceNotFoundException` becomes
//! [`ClientError::NotFound`]; a response without the attachment envelope becomes
//! [`ClientError::EmptyResult`].

use async_trait::async_trait;
use attachflow_cloud::{
    AttachmentClient, AttachmentRecord, AttachmentState, ClientError, CreateAttachmentRequest,
    Tags, partition_for_region,
};
use aws_sdk_networkmanager::Client;
use aws_sdk_networkmanager::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_networkmanager::types::{Attachment, Tag};

/// Network Manager is a global service homed in us-west-2
pub const DEFAULT_REGION: &str = "us-west-2";

const NOT_FOUND_CODE: &str = "ResourceNotFoundException";

/// [`AttachmentClient`] for site-to-site VPN attachments on an AWS Cloud WAN core network
pub struct NetworkManagerClient {
    client: Client,
    partition: String,
}

impl NetworkManagerClient {
    /// Build a client from the standard AWS credential and config chain
    pub async fn from_env(region: Option<&str>) -> Self {
        let region = region.unwrap_or(DEFAULT_REGION).to_string();
        let config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_config::Region::new(region.clone()))
            .load()
            .await;

        tracing::debug!("Loaded AWS config for region {}", region);
        Self::new(Client::new(&config), &region)
    }

    pub fn new(client: Client, region: &str) -> Self {
        Self {
            client,
            partition: partition_for_region(region).to_string(),
        }
    }
}

#[async_trait]
impl AttachmentClient for NetworkManagerClient {
    fn partition(&self) -> &str {
        &self.partition
    }

    async fn create(&self, request: &CreateAttachmentRequest) -> Result<String, ClientError> {
        tracing::debug!(
            "CreateSiteToSiteVpnAttachment core_network_id={} vpn_connection_arn={}",
            request.core_network_id,
            request.vpn_connection_arn
        );

        let output = self
            .client
            .create_site_to_site_vpn_attachment()
            .core_network_id(&request.core_network_id)
            .vpn_connection_arn(&request.vpn_connection_arn)
            .set_tags(to_sdk_tags(&request.tags))
            .send()
            .await
            .map_err(classify)?;

        output
            .site_to_site_vpn_attachment()
            .and_then(|a| a.attachment())
            .and_then(|a| a.attachment_id())
            .map(str::to_string)
            .ok_or(ClientError::EmptyResult)
    }

    async fn get(&self, id: &str) -> Result<AttachmentRecord, ClientError> {
        let output = self
            .client
            .get_site_to_site_vpn_attachment()
            .attachment_id(id)
            .send()
            .await
            .map_err(classify)?;

        let attachment = output
            .site_to_site_vpn_attachment()
            .and_then(|a| a.attachment())
            .ok_or(ClientError::EmptyResult)?;

        record_from_attachment(attachment)
    }

    async fn delete(&self, id: &str) -> Result<(), ClientError> {
        tracing::debug!("DeleteAttachment {}", id);

        self.client
            .delete_attachment()
            .attachment_id(id)
            .send()
            .await
            .map_err(classify)?;
        Ok(())
    }

    async fn tag_resource(&self, arn: &str, tags: &Tags) -> Result<(), ClientError> {
        self.client
            .tag_resource()
            .resource_arn(arn)
            .set_tags(to_sdk_tags(tags))
            .send()
            .await
            .map_err(classify)?;
        Ok(())
    }

    async fn untag_resource(&self, arn: &str, keys: &[String]) -> Result<(), ClientError> {
        self.client
            .untag_resource()
            .resource_arn(arn)
            .set_tag_keys(Some(keys.to_vec()))
            .send()
            .await
            .map_err(classify)?;
        Ok(())
    }
}

fn classify<E>(err: SdkError<E>) -> ClientError
where
    E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
{
    if err.code() == Some(NOT_FOUND_CODE) {
        return ClientError::NotFound;
    }
    ClientError::Transport(DisplayErrorContext(&err).to_string())
}

fn to_sdk_tags(tags: &Tags) -> Option<Vec<Tag>> {
    if tags.is_empty() {
        return None;
    }
    Some(
        tags.iter()
            .map(|(k, v)| Tag::builder().key(k).value(v).build())
            .collect(),
    )
}

fn to_chrono(dt: &aws_sdk_networkmanager::primitives::DateTime) -> Option<chrono::DateTime<chrono::Utc>> {
    chrono::DateTime::from_timestamp(dt.secs(), dt.subsec_nanos())
}

/// Convert the wire attachment into a record. Missing id or state is an empty result.
pub fn record_from_attachment(attachment: &Attachment) -> Result<AttachmentRecord, ClientError> {
    let id = attachment.attachment_id().ok_or(ClientError::EmptyResult)?;
    let state = attachment
        .state()
        .map(|s| AttachmentState::from_label(s.as_str()))
        .ok_or(ClientError::EmptyResult)?;

    let mut record = AttachmentRecord::new(id, state);
    record.core_network_id = attachment.core_network_id().map(str::to_string);
    record.core_network_arn = attachment.core_network_arn().map(str::to_string);
    record.attachment_type = attachment.attachment_type().map(|t| t.as_str().to_string());
    record.attachment_policy_rule_number = attachment.attachment_policy_rule_number();
    record.owner_account_id = attachment.owner_account_id().map(str::to_string);
    record.edge_location = attachment.edge_location().map(str::to_string);
    record.resource_arn = attachment.resource_arn().map(str::to_string);
    record.segment_name = attachment.segment_name().map(str::to_string);
    record.tags = attachment
        .tags()
        .iter()
        .filter_map(|t| Some((t.key()?.to_string(), t.value().unwrap_or_default().to_string())))
        .collect();
    record.created_at = attachment.created_at().and_then(to_chrono);
    record.updated_at = attachment.updated_at().and_then(to_chrono);

    Ok(record)
}
