// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use crate::constants::conditions::APPLIED;
use crate::types::condition::{find_condition, Condition};
use kube::CustomResource;
use serde::{Deserialize, Serialize};

/// Manifests the hub distributes to a spoke, with per-manifest status reported back
#[derive(CustomResource, Serialize, Deserialize, Clone, Debug, Default, schemars::JsonSchema)]
#[kube(group = "work.open-cluster-management.io", version = "v1", kind = "ManifestWork")]
#[kube(namespaced)]
#[kube(status = "ManifestWorkStatus")]
#[serde(rename_all = "camelCase")]
pub struct ManifestWorkSpec {
    pub workload: Workload,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Workload {
    #[serde(default)]
    pub manifests: Vec<serde_json::Value>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ManifestWorkStatus {
    #[serde(default)]
    pub conditions: Vec<Condition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_status: Option<ManifestResourceStatus>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ManifestResourceStatus {
    #[serde(default)]
    pub manifests: Vec<ManifestCondition>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ManifestCondition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_meta: Option<ManifestResourceMeta>,
    #[serde(default)]
    pub conditions: Vec<Condition>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ManifestResourceMeta {
    #[serde(default)]
    pub ordinal: i32,
    #[serde(default)]
    pub kind: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

impl ManifestWork {
    /// First "Applied" condition found in the per-manifest status, in manifest order
    pub fn applied_condition(&self) -> Option<&Condition> {
        self.status
            .as_ref()
            .and_then(|s| s.resource_status.as_ref())
            .into_iter()
            .flat_map(|rs| rs.manifests.iter())
            .find_map(|m| find_condition(&m.conditions, APPLIED))
    }
}
