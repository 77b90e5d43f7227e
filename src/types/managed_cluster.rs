// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use crate::constants::conditions::STATUS_FALSE;
use crate::types::condition::{find_condition, Condition};
use kube::CustomResource;
use serde::{Deserialize, Serialize};

#[derive(CustomResource, Serialize, Deserialize, Clone, Debug, Default, schemars::JsonSchema)]
#[kube(
    group = "cluster.open-cluster-management.io",
    version = "v1",
    kind = "ManagedCluster"
)]
#[kube(status = "ManagedClusterStatus")]
#[serde(rename_all = "camelCase")]
pub struct ManagedClusterSpec {
    #[serde(default)]
    pub hub_accepts_client: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub managed_cluster_client_configs: Vec<ClientConfig>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClientConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ca_bundle: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ManagedClusterStatus {
    #[serde(default)]
    pub conditions: Vec<Condition>,
}

impl ManagedCluster {
    /// API server URL of the spoke, taken from the first client config that has one
    pub fn api_server_url(&self) -> Option<&str> {
        self.spec
            .managed_cluster_client_configs
            .iter()
            .filter_map(|c| c.url.as_deref())
            .find(|url| !url.is_empty())
    }

    /// Status of the given condition type, "False" when it is not reported
    pub fn condition_status(&self, condition_type: &str) -> &str {
        self.status
            .as_ref()
            .and_then(|s| find_condition(&s.conditions, condition_type))
            .map(|c| c.status.as_str())
            .unwrap_or(STATUS_FALSE)
    }
}
