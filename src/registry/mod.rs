// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Managed cluster registry: lists the spokes known to the hub and snapshots their API endpoints.

pub mod table;

use crate::error::{HublinkError, Result};
use crate::types::ManagedCluster;
use chrono::{DateTime, Utc};
use kube::{api::ListParams, Api, Client, ResourceExt};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use url::Url;

/// Message reported when the hub has no managed clusters
pub const NO_CLUSTERS_MESSAGE: &str = "No managed clusters available on the current cluster";

/// Read-only view of a ManagedCluster at the time of the registry query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterRecord {
    pub name: String,
    /// API server URL, only set when the hub reports a valid http(s) URL
    pub endpoint: Option<String>,
    pub hub_accepted: bool,
    /// Status of the ManagedClusterJoined condition
    pub joined: String,
    /// Status of the ManagedClusterConditionAvailable condition
    pub available: String,
    pub created: Option<DateTime<Utc>>,
}

impl ClusterRecord {
    pub fn from_managed_cluster(cluster: &ManagedCluster) -> Self {
        use crate::constants::conditions::{AVAILABLE, JOINED};

        let name = cluster.name_any();
        let endpoint = cluster
            .api_server_url()
            .and_then(|url| match validate_endpoint(url) {
                Ok(()) => Some(url.to_string()),
                Err(reason) => {
                    warn!(cluster = %name, url, "Ignoring API server URL: {}", reason);
                    None
                }
            });

        ClusterRecord {
            endpoint,
            hub_accepted: cluster.spec.hub_accepts_client,
            joined: cluster.condition_status(JOINED).to_string(),
            available: cluster.condition_status(AVAILABLE).to_string(),
            created: cluster.metadata.creation_timestamp.as_ref().map(|t| t.0),
            name,
        }
    }

    /// Age in whole days, if the creation time is known
    pub fn age_days(&self, now: DateTime<Utc>) -> Option<i64> {
        self.created
            .map(|created| now.signed_duration_since(created).num_days().max(0))
    }
}

fn validate_endpoint(url: &str) -> std::result::Result<(), String> {
    let parsed = Url::parse(url).map_err(|e| e.to_string())?;
    if !matches!(parsed.scheme(), "https" | "http") {
        return Err(format!("unsupported scheme '{}'", parsed.scheme()));
    }
    if parsed.host_str().map_or(true, str::is_empty) {
        return Err("missing host".to_string());
    }
    Ok(())
}

/// Immutable cluster name to API server URL lookup, cheap to clone and share between attempts
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EndpointMap(Arc<BTreeMap<String, String>>);

impl EndpointMap {
    pub fn get(&self, cluster: &str) -> Option<&str> {
        self.0.get(cluster).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, String)> for EndpointMap {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        EndpointMap(Arc::new(iter.into_iter().collect()))
    }
}

/// Result of one registry query. An empty snapshot means there is nothing to connect to.
#[derive(Debug, Clone, Default)]
pub struct ClusterSnapshot {
    records: Vec<ClusterRecord>,
    endpoints: EndpointMap,
}

impl ClusterSnapshot {
    pub fn new(records: Vec<ClusterRecord>) -> Self {
        let endpoints = records
            .iter()
            .filter_map(|r| r.endpoint.clone().map(|e| (r.name.clone(), e)))
            .collect();
        Self { records, endpoints }
    }

    /// Records in the order the hub returned them
    pub fn records(&self) -> &[ClusterRecord] {
        &self.records
    }

    pub fn endpoints(&self) -> &EndpointMap {
        &self.endpoints
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Human readable listing, or the no-clusters message for an empty registry
    pub fn render(&self, now: DateTime<Utc>) -> String {
        if self.is_empty() {
            NO_CLUSTERS_MESSAGE.to_string()
        } else {
            table::render(&self.records, now)
        }
    }
}

/// List all ManagedClusters on the hub
#[instrument(skip(client))]
pub async fn list_clusters(client: &Client) -> Result<ClusterSnapshot> {
    let clusters: Api<ManagedCluster> = Api::all(client.clone());
    let list = clusters
        .list(&ListParams::default())
        .await
        .map_err(|e| HublinkError::RegistryUnavailable(e.to_string()))?;

    let records: Vec<ClusterRecord> = list
        .items
        .iter()
        .map(ClusterRecord::from_managed_cluster)
        .collect();

    if records.is_empty() {
        warn!("No managed clusters on the hub");
    } else {
        info!("Found {} managed clusters", records.len());
    }

    let snapshot = ClusterSnapshot::new(records);
    debug!(endpoints = snapshot.endpoints().len(), "Cluster endpoint snapshot refreshed");
    Ok(snapshot)
}
