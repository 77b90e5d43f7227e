// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Hub cluster client creation

use crate::config::Config;
use crate::error::{HublinkError, Result};
use kube::{config::KubeConfigOptions, Client, Config as KConfig};
use tracing::{debug, info, instrument};

/// Create a client for the hub cluster.
///
/// Uses the standard kube inference (KUBECONFIG, ~/.kube/config, in-cluster) unless a
/// context override is configured, in which case that context is loaded from the kubeconfig.
#[instrument(skip(config), fields(context = ?config.hub_context))]
pub async fn create_hub_client(config: &Config) -> Result<Client> {
    let client_config = match kubeconfig_options(config) {
        Some(options) => {
            debug!("Loading hub kubeconfig with context override");
            KConfig::from_kubeconfig(&options).await.map_err(|e| {
                HublinkError::KubeconfigError(format!("Failed to load kubeconfig context: {}", e))
            })?
        }
        None => KConfig::infer()
            .await
            .map_err(|e| HublinkError::KubeconfigError(format!("Failed to infer config: {}", e)))?,
    };

    info!("Using hub API server {}", client_config.cluster_url);

    Client::try_from(client_config)
        .map_err(|e| HublinkError::KubeconfigError(format!("Failed to create client: {}", e)))
}

fn kubeconfig_options(config: &Config) -> Option<KubeConfigOptions> {
    config.hub_context.as_ref().map(|context| KubeConfigOptions {
        context: Some(context.clone()),
        ..KubeConfigOptions::default()
    })
}
