// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Convergence poller.
//!
//! Two sub-pollers run side by side: one waits for the addon to mirror the service
//! account token into a hub Secret, the other waits for the ManifestWork to report that
//! the ClusterRoleBinding was applied on the spoke. Both must succeed; whichever fails
//! first decides the reported failure.

use crate::bootstrap::retry::{poll, PollError, RetryPolicy, Step};
use crate::constants::secret_keys;
use crate::error::{ConvergenceFailure, Result};
use crate::types::ManifestWork;
use k8s_openapi::api::core::v1::Secret;
use kube::{Api, Client};
use std::fmt;
use tracing::{debug, info, instrument, warn};

const UNKNOWN_APPLY_ERROR: &str = "Unknown error occurred while applying manifest.";

/// Token material read from the hub. Both fields hold the decoded secret bytes.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    pub namespace: String,
    pub secret_name: String,
    pub ca_data: Vec<u8>,
    pub token: Vec<u8>,
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("namespace", &self.namespace)
            .field("secret_name", &self.secret_name)
            .field("ca_data", &format_args!("{} bytes", self.ca_data.len()))
            .field("token", &"<redacted>")
            .finish()
    }
}

impl Credential {
    /// Extract the CA bundle and token, naming the first missing key on failure
    pub fn from_secret(
        namespace: &str,
        name: &str,
        secret: &Secret,
    ) -> std::result::Result<Self, ConvergenceFailure> {
        let field = |key: &'static str| {
            secret
                .data
                .as_ref()
                .and_then(|d| d.get(key))
                .map(|v| v.0.clone())
                .filter(|v| !v.is_empty())
                .ok_or_else(|| ConvergenceFailure::InvalidSecret {
                    namespace: namespace.to_string(),
                    name: name.to_string(),
                    missing: key,
                })
        };

        Ok(Credential {
            namespace: namespace.to_string(),
            secret_name: name.to_string(),
            ca_data: field(secret_keys::CA_CRT)?,
            token: field(secret_keys::TOKEN)?,
        })
    }
}

/// Wait for the token secret. Not-found is retried within the policy, an incomplete secret is terminal.
#[instrument(skip(client, policy))]
pub async fn poll_secret(
    client: &Client,
    namespace: &str,
    name: &str,
    policy: &RetryPolicy,
) -> Result<Credential> {
    let secrets: Api<Secret> = Api::namespaced(client.clone(), namespace);

    let outcome = poll(policy, "token secret", |attempt| {
        read_secret(&secrets, namespace, name, attempt)
    })
    .await;

    match outcome {
        Ok(credential) => {
            info!("Token secret {}/{} is available", namespace, name);
            Ok(credential)
        }
        Err(PollError::Failed(e)) => Err(e),
        Err(PollError::Exhausted { attempts } | PollError::TimedOut { attempts, .. }) => {
            Err(ConvergenceFailure::SecretNotFound {
                namespace: namespace.to_string(),
                name: name.to_string(),
                attempts,
            }
            .into())
        }
    }
}

/// Wait for the ManifestWork to report an Applied condition for its manifests.
/// Applied=False is terminal and carries the controller's message.
///
/// `applied_generation` is the generation the hub assigned to the work on this attempt's apply.
/// Conditions observed for an older generation are ignored. Without it the generation of the
/// work as read is used.
#[instrument(skip(client, policy))]
pub async fn poll_applied_status(
    client: &Client,
    namespace: &str,
    name: &str,
    applied_generation: Option<i64>,
    policy: &RetryPolicy,
) -> Result<()> {
    let works: Api<ManifestWork> = Api::namespaced(client.clone(), namespace);

    let outcome = poll(policy, "manifestwork status", |attempt| {
        read_applied_status(&works, namespace, name, applied_generation, attempt)
    })
    .await;

    match outcome {
        Ok(()) => {
            info!("ManifestWork {}/{} applied", namespace, name);
            Ok(())
        }
        Err(PollError::Failed(e)) => Err(e),
        Err(PollError::Exhausted { attempts }) => Err(ConvergenceFailure::StatusTimeout {
            namespace: namespace.to_string(),
            name: name.to_string(),
            timeout: policy.delay * attempts,
        }
        .into()),
        Err(PollError::TimedOut { timeout, .. }) => Err(ConvergenceFailure::StatusTimeout {
            namespace: namespace.to_string(),
            name: name.to_string(),
            timeout,
        }
        .into()),
    }
}

async fn read_secret(
    secrets: &Api<Secret>,
    namespace: &str,
    name: &str,
    attempt: u32,
) -> Result<Step<Credential>> {
    match secrets.get_opt(name).await? {
        Some(secret) => Ok(Step::Ready(Credential::from_secret(namespace, name, &secret)?)),
        None => {
            warn!(
                "Attempt {} failed: Secret {}/{} not found",
                attempt, namespace, name
            );
            Ok(Step::Pending)
        }
    }
}

async fn read_applied_status(
    works: &Api<ManifestWork>,
    namespace: &str,
    name: &str,
    applied_generation: Option<i64>,
    attempt: u32,
) -> Result<Step<()>> {
    let Some(work) = works.get_opt(name).await? else {
        debug!(attempt, "ManifestWork {}/{} not visible yet", namespace, name);
        return Ok(Step::Pending);
    };

    let generation = applied_generation.or(work.metadata.generation);
    match work.applied_condition() {
        Some(condition) if !condition.is_current(generation) => {
            debug!(
                attempt,
                observed = ?condition.observed_generation,
                generation = ?generation,
                "Applied condition belongs to an earlier generation"
            );
            Ok(Step::Pending)
        }
        Some(condition) if condition.is_true() => Ok(Step::Ready(())),
        Some(condition) if condition.is_false() => {
            let message = condition
                .message
                .clone()
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| UNKNOWN_APPLY_ERROR.to_string());
            Err(ConvergenceFailure::AppliedFalse { message }.into())
        }
        Some(condition) => {
            debug!(attempt, status = %condition.status, "Applied condition not settled");
            Ok(Step::Pending)
        }
        None => {
            debug!(attempt, "ManifestWork {}/{} has no Applied condition yet", namespace, name);
            Ok(Step::Pending)
        }
    }
}

/// Run both sub-pollers concurrently and return the credential once both succeeded.
/// The first terminal failure from either side is returned unchanged.
#[instrument(skip(client, secret_policy, status_policy))]
pub async fn await_convergence(
    client: &Client,
    cluster: &str,
    identity: &str,
    applied_generation: Option<i64>,
    secret_policy: &RetryPolicy,
    status_policy: &RetryPolicy,
) -> Result<Credential> {
    let (credential, ()) = tokio::try_join!(
        poll_secret(client, cluster, identity, secret_policy),
        poll_applied_status(client, cluster, identity, applied_generation, status_policy),
    )?;

    info!("Identity and role binding converged on cluster {}", cluster);
    Ok(credential)
}
