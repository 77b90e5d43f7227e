// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Identity requestor: applies the ManagedServiceAccount that makes the addon mint a token for us.

use crate::bootstrap::{server_side_apply, Acknowledgement};
use crate::error::{HublinkError, Result};
use crate::types::managed_service_account::{ManagedServiceAccountSpec, Rotation};
use crate::types::{validate_dns_label, ManagedServiceAccount};
use kube::{Api, Client};
use tracing::{info, instrument, warn};

/// Validated request for a rotating identity in a cluster namespace on the hub
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityRequest {
    cluster: String,
    name: String,
    rotation: Rotation,
}

impl IdentityRequest {
    pub fn new(cluster: &str, name: &str) -> Result<Self> {
        validate_dns_label("cluster name", cluster)?;
        validate_dns_label("identity name", name)?;
        Ok(Self {
            cluster: cluster.to_string(),
            name: name.to_string(),
            rotation: Rotation::default(),
        })
    }

    pub fn cluster(&self) -> &str {
        &self.cluster
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn to_resource(&self) -> ManagedServiceAccount {
        let mut msa = ManagedServiceAccount::new(
            &self.name,
            ManagedServiceAccountSpec {
                rotation: self.rotation.clone(),
            },
        );
        msa.metadata.namespace = Some(self.cluster.clone());
        msa
    }
}

/// Apply the ManagedServiceAccount. Re-applying for the same cluster only merges.
#[instrument(skip(client, request), fields(cluster = %request.cluster(), identity = %request.name()))]
pub async fn request_identity(
    client: &Client,
    request: &IdentityRequest,
    field_manager: &str,
) -> Result<Acknowledgement<ManagedServiceAccount>> {
    let api: Api<ManagedServiceAccount> = Api::namespaced(client.clone(), request.cluster());

    let ack = server_side_apply(&api, request.name(), &request.to_resource(), field_manager)
        .await
        .map_err(|e| {
            HublinkError::IdentitySubmission(format!(
                "{}/{}: {}",
                request.cluster(),
                request.name(),
                e
            ))
        })?;

    match &ack {
        Some(_) => info!(
            "Applied ManagedServiceAccount {}/{}",
            request.cluster(),
            request.name()
        ),
        None => warn!(
            "Applied ManagedServiceAccount {}/{} with empty response",
            request.cluster(),
            request.name()
        ),
    }

    Ok(ack)
}
