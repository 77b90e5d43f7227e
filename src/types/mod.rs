// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Typed open-cluster-management resources read from and applied to the hub.

pub mod addon;
pub mod condition;
pub mod managed_cluster;
pub mod managed_service_account;
pub mod manifest_work;

pub use addon::ManagedClusterAddOn;
pub use condition::Condition;
pub use managed_cluster::ManagedCluster;
pub use managed_service_account::ManagedServiceAccount;
pub use manifest_work::ManifestWork;

use crate::error::{HublinkError, Result};

/// Validate a name that is used as a namespace or object name on the hub (RFC 1123 label)
pub fn validate_dns_label(kind: &'static str, value: &str) -> Result<()> {
    let invalid = |reason: &str| HublinkError::InvalidObject {
        kind,
        reason: format!("'{}' {}", value, reason),
    };

    if value.is_empty() {
        return Err(invalid("must not be empty"));
    }
    if value.len() > 63 {
        return Err(invalid("must be at most 63 characters"));
    }
    if !value
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    {
        return Err(invalid(
            "must consist of lowercase alphanumeric characters or '-'",
        ));
    }
    if value.starts_with('-') || value.ends_with('-') {
        return Err(invalid("must start and end with an alphanumeric character"));
    }
    Ok(())
}

/// Validate a ClusterRole reference. Role names are path segments and may contain ':'.
pub fn validate_role_name(value: &str) -> Result<()> {
    let kind = "ClusterRole name";
    if value.trim().is_empty() {
        return Err(HublinkError::InvalidObject {
            kind,
            reason: "must not be empty".to_string(),
        });
    }
    if value == "." || value == ".." || value.contains('/') || value.contains('%') {
        return Err(HublinkError::InvalidObject {
            kind,
            reason: format!("'{}' is not a valid path segment name", value),
        });
    }
    Ok(())
}
