//! AWS Network Manager client for AttachFlow
//!
//! Implements [`attachflow_cloud::AttachmentClient`] for site-to-site VPN attachments on
//! an AWS Cloud WAN core network.
//!
//! # Requirements
//!
//! - Credentials from the standard AWS chain (environment, profile, SSO, IMDS)
//! - `networkmanager:*Attachment*` and `networkmanager:TagResource`/`UntagResource`
//!
//! # Example
//!
//! ```ignore
//! use attachflow_cloud::{AttachmentLifecycle, CreateAttachmentRequest};
//! use attachflow_cloud_aws::NetworkManagerClient;
//!
//! let client = NetworkManagerClient::from_env(None).await;
//! let lifecycle = AttachmentLifecycle::new(&client);
//!
//! let request = CreateAttachmentRequest::new(
//!     "core-network-0123456789abcdef0",
//!     "arn:aws:ec2:us-west-2:123456789012:vpn-connection/vpn-0abc",
//! );
//! let record = lifecycle.create_and_wait(&request).await?;
//! ```

pub mod client;

pub use client::{DEFAULT_REGION, NetworkManagerClient, record_from_attachment};
