// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Role binding publisher: distributes a ClusterRoleBinding for the identity through a ManifestWork.

use crate::bootstrap::{server_side_apply, Acknowledgement};
use crate::constants::MANAGED_SERVICEACCOUNT_ADDON;
use crate::error::{HublinkError, Result};
use crate::types::manifest_work::{ManifestWorkSpec, Workload};
use crate::types::{validate_dns_label, validate_role_name, ManagedClusterAddOn, ManifestWork};
use k8s_openapi::api::rbac::v1::{ClusterRoleBinding, RoleRef, Subject};
use kube::{api::ObjectMeta, Api, Client};
use tracing::{debug, info, instrument, warn};

const RBAC_API_GROUP: &str = "rbac.authorization.k8s.io";

/// Validated ManifestWork carrying the ClusterRoleBinding for one (cluster, identity) pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleBindingWork {
    cluster: String,
    identity: String,
    role: String,
    subject_namespace: String,
}

impl RoleBindingWork {
    pub fn new(cluster: &str, identity: &str, role: &str, subject_namespace: &str) -> Result<Self> {
        validate_dns_label("cluster name", cluster)?;
        validate_dns_label("identity name", identity)?;
        validate_role_name(role)?;
        validate_dns_label("subject namespace", subject_namespace)?;
        Ok(Self {
            cluster: cluster.to_string(),
            identity: identity.to_string(),
            role: role.to_string(),
            subject_namespace: subject_namespace.to_string(),
        })
    }

    pub fn cluster(&self) -> &str {
        &self.cluster
    }

    /// The work shares the identity name, so repeated attempts for a cluster update one object
    pub fn name(&self) -> &str {
        &self.identity
    }

    pub fn role(&self) -> &str {
        &self.role
    }

    pub fn binding_name(&self) -> String {
        format!("{}-clusterrolebinding", self.identity)
    }

    pub fn cluster_role_binding(&self) -> ClusterRoleBinding {
        ClusterRoleBinding {
            metadata: ObjectMeta {
                name: Some(self.binding_name()),
                ..Default::default()
            },
            role_ref: RoleRef {
                api_group: RBAC_API_GROUP.to_string(),
                kind: "ClusterRole".to_string(),
                name: self.role.clone(),
            },
            subjects: Some(vec![Subject {
                kind: "ServiceAccount".to_string(),
                name: self.identity.clone(),
                namespace: Some(self.subject_namespace.clone()),
                ..Default::default()
            }]),
        }
    }

    pub fn to_resource(&self) -> Result<ManifestWork> {
        let manifest =
            serde_json::to_value(self.cluster_role_binding()).map_err(|e| HublinkError::InvalidObject {
                kind: "ClusterRoleBinding",
                reason: e.to_string(),
            })?;

        let mut work = ManifestWork::new(
            &self.identity,
            ManifestWorkSpec {
                workload: Workload {
                    manifests: vec![manifest],
                },
            },
        );
        work.metadata.namespace = Some(self.cluster.clone());
        Ok(work)
    }
}

/// Apply the ManifestWork that binds the role on the spoke
#[instrument(skip(client, work), fields(cluster = %work.cluster(), role = %work.role()))]
pub async fn publish_binding(
    client: &Client,
    work: &RoleBindingWork,
    field_manager: &str,
) -> Result<Acknowledgement<ManifestWork>> {
    let api: Api<ManifestWork> = Api::namespaced(client.clone(), work.cluster());
    let ack = server_side_apply(&api, work.name(), &work.to_resource()?, field_manager)
        .await
        .map_err(|e| {
            HublinkError::BindingSubmission(format!("{}/{}: {}", work.cluster(), work.name(), e))
        })?;

    match &ack {
        Some(_) => info!(
            "Applied ManifestWork {}/{} binding ClusterRole {}",
            work.cluster(),
            work.name(),
            work.role()
        ),
        None => warn!(
            "Applied ManifestWork {}/{} with empty response",
            work.cluster(),
            work.name()
        ),
    }

    Ok(ack)
}

/// Namespace the managed-serviceaccount addon creates service accounts in on the spoke.
/// Falls back to `fallback` when the addon does not report one.
#[instrument(skip(client))]
pub async fn resolve_subject_namespace(client: &Client, cluster: &str, fallback: &str) -> String {
    let api: Api<ManagedClusterAddOn> = Api::namespaced(client.clone(), cluster);

    match api.get_opt(MANAGED_SERVICEACCOUNT_ADDON).await {
        Ok(Some(addon)) => match addon.agent_namespace() {
            Some(namespace) => {
                debug!("Addon {} reports namespace {}", MANAGED_SERVICEACCOUNT_ADDON, namespace);
                namespace.to_string()
            }
            None => {
                warn!(
                    "Addon {}/{} reports no namespace, using {}",
                    cluster, MANAGED_SERVICEACCOUNT_ADDON, fallback
                );
                fallback.to_string()
            }
        },
        Ok(None) => {
            warn!(
                "Addon {}/{} not found, using {}",
                cluster, MANAGED_SERVICEACCOUNT_ADDON, fallback
            );
            fallback.to_string()
        }
        Err(e) => {
            warn!(
                "Failed to read addon {}/{}: {}, using {}",
                cluster, MANAGED_SERVICEACCOUNT_ADDON, e, fallback
            );
            fallback.to_string()
        }
    }
}
