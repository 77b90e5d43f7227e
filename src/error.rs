// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum HublinkError {
    #[error("Kubernetes API error: {0}")]
    KubeError(#[from] kube::Error),

    #[error("Failed to load hub kubeconfig: {0}")]
    KubeconfigError(String),

    #[error("Failed to list managed clusters: {0}")]
    RegistryUnavailable(String),

    #[error("Failed to apply ManagedServiceAccount: {0}")]
    IdentitySubmission(String),

    #[error("Failed to apply ManifestWork: {0}")]
    BindingSubmission(String),

    #[error("Invalid {kind}: {reason}")]
    InvalidObject { kind: &'static str, reason: String },

    #[error(transparent)]
    Convergence(#[from] ConvergenceFailure),

    #[error(transparent)]
    Synthesis(#[from] SynthesisError),
}

/// Terminal outcomes of the convergence poller other than success.
/// The display strings are what the user sees.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConvergenceFailure {
    #[error("Failed to retrieve Secret {namespace}/{name} after {attempts} attempts.")]
    SecretNotFound {
        namespace: String,
        name: String,
        attempts: u32,
    },

    #[error("Secret {namespace}/{name} does not contain a valid token for kubeconfig: missing '{missing}'")]
    InvalidSecret {
        namespace: String,
        name: String,
        missing: &'static str,
    },

    #[error("{message}")]
    AppliedFalse { message: String },

    #[error("Timed out waiting for ManifestWork {namespace}/{name} to report Applied status after {}s", .timeout.as_secs_f64())]
    StatusTimeout {
        namespace: String,
        name: String,
        timeout: Duration,
    },
}

#[derive(Error, Debug)]
pub enum SynthesisError {
    #[error("No API server endpoint known for cluster {cluster}")]
    NoEndpoint { cluster: String },

    #[error("Invalid token secret payload: {0}")]
    InvalidPayload(String),

    #[error("Failed to serialize kubeconfig: {0}")]
    Serialize(#[from] serde_yaml::Error),

    #[error("Failed to write kubeconfig {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, HublinkError>;

/// True when the API server answered 404 for the requested object
pub fn is_not_found(err: &kube::Error) -> bool {
    matches!(err, kube::Error::Api(resp) if resp.code == 404)
}
