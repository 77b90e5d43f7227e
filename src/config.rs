// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use crate::bootstrap::retry::RetryPolicy;
use crate::constants::{
    secret_poll, status_poll, DEFAULT_ADDON_NAMESPACE, DEFAULT_CONNECT_CONCURRENCY,
    DEFAULT_IDENTITY_NAME,
};
use anyhow::{anyhow, ensure, Result};
use std::env;
use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Runtime configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Name shared by the managed service account, its manifest work and token secret
    pub identity_name: String,
    /// Directory the kubeconfig profiles are written to
    pub profile_dir: PathBuf,
    /// Subject namespace used when the addon does not report one
    pub addon_namespace: String,
    /// Read the subject namespace from the managed-serviceaccount addon status
    pub resolve_addon_namespace: bool,
    pub secret_poll: RetryPolicy,
    pub status_poll: RetryPolicy,
    /// Parallel attempts for connect-all
    pub connect_concurrency: usize,
    /// Hub kubeconfig context override
    pub hub_context: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            identity_name: DEFAULT_IDENTITY_NAME.to_string(),
            profile_dir: env::temp_dir(),
            addon_namespace: DEFAULT_ADDON_NAMESPACE.to_string(),
            resolve_addon_namespace: true,
            secret_poll: RetryPolicy::attempts(
                secret_poll::ATTEMPTS,
                Duration::from_secs(secret_poll::DELAY_SECS),
            ),
            status_poll: RetryPolicy::deadline(
                Duration::from_secs(status_poll::TIMEOUT_SECS),
                Duration::from_secs(status_poll::INTERVAL_SECS),
            ),
            connect_concurrency: DEFAULT_CONNECT_CONCURRENCY,
            hub_context: None,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup, falling back to defaults for unset keys
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();

        let identity_name = lookup("HUBLINK_IDENTITY_NAME").unwrap_or(defaults.identity_name);
        ensure!(!identity_name.is_empty(), "HUBLINK_IDENTITY_NAME must not be empty");

        let profile_dir = lookup("HUBLINK_PROFILE_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.profile_dir);
        let addon_namespace =
            lookup("HUBLINK_ADDON_NAMESPACE").unwrap_or(defaults.addon_namespace);
        let resolve_addon_namespace = parse_var(
            &lookup,
            "HUBLINK_RESOLVE_ADDON_NAMESPACE",
            defaults.resolve_addon_namespace,
        )?;

        let attempts = parse_var(&lookup, "HUBLINK_SECRET_ATTEMPTS", secret_poll::ATTEMPTS)?;
        ensure!(attempts > 0, "HUBLINK_SECRET_ATTEMPTS must be at least 1");
        let delay = parse_var(&lookup, "HUBLINK_SECRET_DELAY_SECS", secret_poll::DELAY_SECS)?;

        let interval = parse_var(
            &lookup,
            "HUBLINK_STATUS_INTERVAL_SECS",
            status_poll::INTERVAL_SECS,
        )?;
        let timeout = parse_var(&lookup, "HUBLINK_STATUS_TIMEOUT_SECS", status_poll::TIMEOUT_SECS)?;

        let connect_concurrency = parse_var(
            &lookup,
            "HUBLINK_CONNECT_CONCURRENCY",
            defaults.connect_concurrency,
        )?;
        ensure!(
            connect_concurrency > 0,
            "HUBLINK_CONNECT_CONCURRENCY must be at least 1"
        );

        Ok(Config {
            identity_name,
            profile_dir,
            addon_namespace,
            resolve_addon_namespace,
            secret_poll: RetryPolicy::attempts(attempts, Duration::from_secs(delay)),
            status_poll: RetryPolicy::deadline(
                Duration::from_secs(timeout),
                Duration::from_secs(interval),
            ),
            connect_concurrency,
            hub_context: lookup("HUBLINK_HUB_CONTEXT"),
        })
    }
}

fn parse_var<T, F>(lookup: &F, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|e| anyhow!("{} has invalid value '{}': {}", key, value, e)),
        None => Ok(default),
    }
}
