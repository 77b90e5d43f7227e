// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Composes the bootstrap stages into the `list_clusters` and `connect` operations.

use crate::bootstrap::{
    await_convergence, publish_binding, request_identity, resolve_subject_namespace, synthesize,
    IdentityRequest, RoleBindingWork,
};
use crate::config::Config;
use crate::constants::DEFAULT_CLUSTER_ROLE;
use crate::error::{HublinkError, Result};
use crate::registry::{self, NO_CLUSTERS_MESSAGE};
use chrono::Utc;
use futures::stream::{self, StreamExt};
use kube::Client;
use serde::Serialize;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{error, info, instrument};

/// Result of an operation as shown to the caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Outcome {
    pub message: String,
    pub is_error: bool,
}

impl Outcome {
    pub fn success(message: impl Into<String>) -> Self {
        Outcome {
            message: message.into(),
            is_error: false,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Outcome {
            message: message.into(),
            is_error: true,
        }
    }
}

/// Runs connection attempts against the hub.
///
/// Attempts for the same cluster are serialized, attempts for different clusters run independently.
pub struct Connector {
    client: Client,
    config: Config,
    in_flight: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl Connector {
    pub fn new(client: Client, config: Config) -> Self {
        Connector {
            client,
            config,
            in_flight: Mutex::new(HashMap::new()),
        }
    }

    /// Render the managed clusters known to the hub
    pub async fn list_clusters(&self) -> Outcome {
        match registry::list_clusters(&self.client).await {
            Ok(snapshot) if snapshot.is_empty() => Outcome::success(NO_CLUSTERS_MESSAGE),
            Ok(snapshot) => Outcome::success(snapshot.render(Utc::now())),
            Err(e) => {
                error!("Failed to list managed clusters: {}", e);
                Outcome::failure(e.to_string())
            }
        }
    }

    /// Bootstrap credentials for `cluster` and write its kubeconfig.
    ///
    /// Never fails: the first error of any stage is reported in the outcome message.
    pub async fn connect(&self, cluster: &str, role: Option<&str>) -> Outcome {
        let role = role.unwrap_or(DEFAULT_CLUSTER_ROLE);

        match self.try_connect(cluster, role).await {
            Ok(path) => Outcome::success(format!(
                "Successfully connected to cluster {} using ServiceAccount {}, with the {} ClusterRole assigned. KUBECONFIG written to {}",
                cluster,
                self.config.identity_name,
                role,
                path.display()
            )),
            Err(e) => {
                error!(cluster = %cluster, "Connection attempt failed: {}", e);
                Outcome::failure(format!("Failed to generate KUBECONFIG for {}: {}", cluster, e))
            }
        }
    }

    /// Connect every cluster in the registry, returning outcomes in registry order
    pub async fn connect_all(&self, role: Option<&str>) -> Result<Vec<(String, Outcome)>> {
        let snapshot = registry::list_clusters(&self.client).await?;
        let names: Vec<String> = snapshot.records().iter().map(|r| r.name.clone()).collect();

        info!(
            "Connecting {} clusters with concurrency {}",
            names.len(),
            self.config.connect_concurrency
        );

        let mut outcomes: Vec<(usize, String, Outcome)> = stream::iter(names.into_iter().enumerate())
            .map(|(index, name)| async move {
                let outcome = self.connect(&name, role).await;
                (index, name, outcome)
            })
            .buffer_unordered(self.config.connect_concurrency.max(1))
            .collect()
            .await;

        outcomes.sort_by_key(|(index, _, _)| *index);
        Ok(outcomes
            .into_iter()
            .map(|(_, name, outcome)| (name, outcome))
            .collect())
    }

    #[instrument(skip(self), fields(identity = %self.config.identity_name))]
    async fn try_connect(&self, cluster: &str, role: &str) -> Result<PathBuf> {
        let identity = self.config.identity_name.as_str();

        // Reject bad input before anything is submitted
        let request = IdentityRequest::new(cluster, identity)?;
        RoleBindingWork::new(cluster, identity, role, &self.config.addon_namespace)?;

        let lock = self.cluster_lock(cluster);
        let result = {
            let _guard = lock.lock().await;
            self.run_protocol(&request, role).await
        };
        self.release_cluster_lock(cluster, lock);
        result
    }

    async fn run_protocol(&self, request: &IdentityRequest, role: &str) -> Result<PathBuf> {
        let cluster = request.cluster();
        let identity = request.name();
        let fallback_namespace = self.config.addon_namespace.as_str();

        let subject_namespace = async {
            let namespace = if self.config.resolve_addon_namespace {
                resolve_subject_namespace(&self.client, cluster, fallback_namespace).await
            } else {
                fallback_namespace.to_string()
            };
            Ok::<_, HublinkError>(namespace)
        };

        let (_, snapshot, subject_namespace) = tokio::try_join!(
            request_identity(&self.client, request, identity),
            registry::list_clusters(&self.client),
            subject_namespace,
        )?;

        let work = RoleBindingWork::new(cluster, identity, role, &subject_namespace)?;
        let applied = publish_binding(&self.client, &work, identity).await?;
        let applied_generation = applied.and_then(|w| w.metadata.generation);

        let credential = await_convergence(
            &self.client,
            cluster,
            identity,
            applied_generation,
            &self.config.secret_poll,
            &self.config.status_poll,
        )
        .await?;

        let path = synthesize(
            cluster,
            &credential,
            snapshot.endpoints(),
            &self.config.profile_dir,
            identity,
        )?;

        info!("Connected to cluster {} with ClusterRole {}", cluster, role);
        Ok(path)
    }

    fn cluster_lock(&self, cluster: &str) -> Arc<tokio::sync::Mutex<()>> {
        let mut in_flight = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        in_flight.entry(cluster.to_string()).or_default().clone()
    }

    /// Drop the lock entry for `cluster` once no other attempt holds or waits on it
    fn release_cluster_lock(&self, cluster: &str, lock: Arc<tokio::sync::Mutex<()>>) {
        let mut in_flight = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        drop(lock);
        if in_flight
            .get(cluster)
            .is_some_and(|entry| Arc::strong_count(entry) == 1)
        {
            in_flight.remove(cluster);
        }
    }

    #[cfg(test)]
    fn in_flight_clusters(&self) -> usize {
        self.in_flight.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}
