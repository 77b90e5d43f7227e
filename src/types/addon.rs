// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use crate::types::condition::Condition;
use kube::CustomResource;
use serde::{Deserialize, Serialize};

#[derive(CustomResource, Serialize, Deserialize, Clone, Debug, Default, schemars::JsonSchema)]
#[kube(
    group = "addon.open-cluster-management.io",
    version = "v1alpha1",
    kind = "ManagedClusterAddOn"
)]
#[kube(namespaced)]
#[kube(status = "ManagedClusterAddOnStatus")]
#[serde(rename_all = "camelCase")]
pub struct ManagedClusterAddOnSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub install_namespace: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ManagedClusterAddOnStatus {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(default)]
    pub conditions: Vec<Condition>,
}

impl ManagedClusterAddOn {
    /// Namespace the addon agent runs in on the spoke, as reported by the addon status
    pub fn agent_namespace(&self) -> Option<&str> {
        self.status
            .as_ref()
            .and_then(|s| s.namespace.as_deref())
            .filter(|ns| !ns.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_agent_namespace_from_status() {
        let addon: ManagedClusterAddOn = serde_json::from_value(serde_json::json!({
            "apiVersion": "addon.open-cluster-management.io/v1alpha1",
            "kind": "ManagedClusterAddOn",
            "metadata": { "name": "managed-serviceaccount", "namespace": "cluster1" },
            "spec": {},
            "status": { "namespace": "custom-addon-ns" }
        }))
        .unwrap();

        assert_eq!(addon.agent_namespace(), Some("custom-addon-ns"));
    }

    #[test]
    fn test_agent_namespace_empty_is_none() {
        let addon: ManagedClusterAddOn = serde_json::from_value(serde_json::json!({
            "apiVersion": "addon.open-cluster-management.io/v1alpha1",
            "kind": "ManagedClusterAddOn",
            "metadata": { "name": "managed-serviceaccount", "namespace": "cluster1" },
            "spec": {},
            "status": { "namespace": "" }
        }))
        .unwrap();

        assert_eq!(addon.agent_namespace(), None);
    }
}
