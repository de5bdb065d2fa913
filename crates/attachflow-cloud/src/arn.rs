//! Amazon Resource Name parsing and construction

use crate::error::{CloudError, Result};
use std::str::FromStr;

/// A parsed `arn:partition:service:region:account:resource` string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Arn {
    pub partition: String,
    pub service: String,
    pub region: String,
    pub account_id: String,
    pub resource: String,
}

impl Arn {
    /// ARN of a Network Manager attachment. Network Manager is a global service, so the
    /// region section stays empty.
    pub fn attachment(partition: &str, account_id: &str, attachment_id: &str) -> Self {
        Self {
            partition: partition.to_string(),
            service: "networkmanager".to_string(),
            region: String::new(),
            account_id: account_id.to_string(),
            resource: format!("attachment/{}", attachment_id),
        }
    }
}

impl FromStr for Arn {
    type Err = CloudError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = |reason: &str| CloudError::InvalidArn {
            arn: s.to_string(),
            reason: reason.to_string(),
        };

        let rest = s
            .strip_prefix("arn:")
            .ok_or_else(|| invalid("missing 'arn:' prefix"))?;

        // The resource section may itself contain ':'
        let parts: Vec<&str> = rest.splitn(5, ':').collect();
        if parts.len() != 5 {
            return Err(invalid("expected 6 sections"));
        }

        let arn = Arn {
            partition: parts[0].to_string(),
            service: parts[1].to_string(),
            region: parts[2].to_string(),
            account_id: parts[3].to_string(),
            resource: parts[4].to_string(),
        };

        if arn.partition.is_empty() {
            return Err(invalid("empty partition"));
        }
        if arn.service.is_empty() {
            return Err(invalid("empty service"));
        }
        if arn.resource.is_empty() {
            return Err(invalid("empty resource"));
        }

        Ok(arn)
    }
}

impl std::fmt::Display for Arn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "arn:{}:{}:{}:{}:{}",
            self.partition, self.service, self.region, self.account_id, self.resource
        )
    }
}

/// Partition a region belongs to
pub fn partition_for_region(region: &str) -> &'static str {
    if region.starts_with("cn-") {
        "aws-cn"
    } else if region.starts_with("us-gov-") {
        "aws-us-gov"
    } else {
        "aws"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_vpn_connection_arn() {
        let arn: Arn = "arn:aws:ec2:us-west-2:123456789012:vpn-connection/vpn-0abc"
            .parse()
            .unwrap();
        assert_eq!(arn.service, "ec2");
        assert_eq!(arn.region, "us-west-2");
        assert_eq!(arn.account_id, "123456789012");
        assert_eq!(arn.resource, "vpn-connection/vpn-0abc");
    }

    #[test]
    fn test_resource_with_colons() {
        let arn: Arn = "arn:aws:logs:us-east-1:123456789012:log-group:my-group:*"
            .parse()
            .unwrap();
        assert_eq!(arn.resource, "log-group:my-group:*");
    }

    #[test]
    fn test_invalid_arns() {
        for bad in [
            "vpn-0abc",
            "arn:aws:ec2:us-west-2",
            "arn::ec2:us-west-2:123:vpn-connection/x",
            "arn:aws:ec2:us-west-2:123:",
        ] {
            let err = bad.parse::<Arn>().unwrap_err();
            assert!(matches!(err, CloudError::InvalidArn { .. }), "{}", bad);
        }
    }

    #[test]
    fn test_attachment_arn() {
        let arn = Arn::attachment("aws", "123456789012", "attachment-0123");
        assert_eq!(
            arn.to_string(),
            "arn:aws:networkmanager::123456789012:attachment/attachment-0123"
        );
    }

    #[test]
    fn test_partition_for_region() {
        assert_eq!(partition_for_region("us-west-2"), "aws");
        assert_eq!(partition_for_region("cn-north-1"), "aws-cn");
        assert_eq!(partition_for_region("us-gov-west-1"), "aws-us-gov");
    }
}
