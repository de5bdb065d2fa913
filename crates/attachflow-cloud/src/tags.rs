//! Tag helpers
//!
//! Tags are plain `key -> value` maps. Merging and filtering happen here; computing which
//! keys changed is left to the caller, who hands over a [`TagChanges`].

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub type Tags = BTreeMap<String, String>;

const RESERVED_PREFIX: &str = "aws:";

/// Merge provider-wide default tags with resource tags. Resource values win.
pub fn merge_default_tags(defaults: &Tags, resource: &Tags) -> Tags {
    let mut merged = ignore_reserved(defaults);
    merged.extend(ignore_reserved(resource));
    merged
}

/// Drop keys in the reserved `aws:` namespace
pub fn ignore_reserved(tags: &Tags) -> Tags {
    tags.iter()
        .filter(|(k, _)| !k.starts_with(RESERVED_PREFIX))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}

/// Resource tags with entries identical to a default tag removed
pub fn remove_default_tags(tags: &Tags, defaults: &Tags) -> Tags {
    tags.iter()
        .filter(|(k, v)| defaults.get(*k) != Some(*v))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}

/// Tag changes to apply to an attachment
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagChanges {
    /// Tags to add or overwrite
    pub set: Tags,
    /// Keys to remove
    pub remove: Vec<String>,
}

impl TagChanges {
    pub fn is_empty(&self) -> bool {
        self.set.is_empty() && self.remove.is_empty()
    }
}

/// Parse a `key=value` pair
pub fn parse_tag(s: &str) -> Option<(String, String)> {
    let (key, value) = s.split_once('=')?;
    let key = key.trim();
    if key.is_empty() {
        return None;
    }
    Some((key.to_string(), value.trim().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(pairs: &[(&str, &str)]) -> Tags {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_resource_tags_win() {
        let defaults = tags(&[("env", "prod"), ("team", "net")]);
        let resource = tags(&[("env", "stg"), ("Name", "edge-vpn")]);

        let merged = merge_default_tags(&defaults, &resource);
        assert_eq!(merged, tags(&[("Name", "edge-vpn"), ("env", "stg"), ("team", "net")]));
    }

    #[test]
    fn test_reserved_keys_dropped() {
        let merged = merge_default_tags(
            &tags(&[("aws:cloudformation:stack-name", "x")]),
            &tags(&[("aws:created-by", "y"), ("owner", "ops")]),
        );
        assert_eq!(merged, tags(&[("owner", "ops")]));
    }

    #[test]
    fn test_remove_default_tags_keeps_overrides() {
        let defaults = tags(&[("env", "prod"), ("team", "net")]);
        let all = tags(&[("env", "stg"), ("team", "net"), ("Name", "a")]);
        assert_eq!(
            remove_default_tags(&all, &defaults),
            tags(&[("Name", "a"), ("env", "stg")])
        );
    }

    #[test]
    fn test_parse_tag() {
        assert_eq!(parse_tag("env=prod"), Some(("env".into(), "prod".into())));
        assert_eq!(parse_tag("empty="), Some(("empty".into(), String::new())));
        assert_eq!(parse_tag("=value"), None);
        assert_eq!(parse_tag("novalue"), None);
    }
}
