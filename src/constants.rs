// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

/// Default name of the managed service account, its manifest work and its token secret.
/// Also used as the server-side apply field manager.
pub const DEFAULT_IDENTITY_NAME: &str = "multicluster-mcp-server";

/// ClusterRole bound to the identity when the caller does not name one
pub const DEFAULT_CLUSTER_ROLE: &str = "cluster-admin";

/// Namespace the managed-serviceaccount addon creates service accounts in on the spoke
pub const DEFAULT_ADDON_NAMESPACE: &str = "open-cluster-management-agent-addon";

/// Name of the ManagedClusterAddOn that materializes managed service accounts
pub const MANAGED_SERVICEACCOUNT_ADDON: &str = "managed-serviceaccount";

/// Keys of the token secret written by the managed-serviceaccount addon
pub mod secret_keys {
    pub const CA_CRT: &str = "ca.crt";
    pub const TOKEN: &str = "token";
}

/// Condition types reported by open-cluster-management resources
pub mod conditions {
    pub const APPLIED: &str = "Applied";
    pub const JOINED: &str = "ManagedClusterJoined";
    pub const AVAILABLE: &str = "ManagedClusterConditionAvailable";
    pub const STATUS_TRUE: &str = "True";
    pub const STATUS_FALSE: &str = "False";
}

/// Secret sub-poller defaults
pub mod secret_poll {
    pub const ATTEMPTS: u32 = 3;
    pub const DELAY_SECS: u64 = 5;
}

/// ManifestWork status sub-poller defaults
pub mod status_poll {
    pub const INTERVAL_SECS: u64 = 2;
    pub const TIMEOUT_SECS: u64 = 30;
}

/// Parallel connection attempts for connect-all
pub const DEFAULT_CONNECT_CONCURRENCY: usize = 4;
