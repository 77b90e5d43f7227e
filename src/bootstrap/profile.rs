// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Credential file synthesizer: turns a converged token secret into a self-contained kubeconfig.

use crate::bootstrap::poller::Credential;
use crate::error::SynthesisError;
use crate::registry::EndpointMap;
use base64::{engine::general_purpose::STANDARD, Engine};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument};

/// Location of the kubeconfig for a cluster. Deterministic so consumers can find it by cluster name.
pub fn profile_path(dir: &Path, identity: &str, cluster: &str) -> PathBuf {
    dir.join(format!("{}.{}", identity, cluster))
}

/// Everything needed to talk to a spoke API server as the managed service account
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionProfile {
    pub endpoint: String,
    /// Base64 encoded CA bundle, as kubeconfig expects it
    pub ca_data: String,
    /// Plain text bearer token
    pub token: String,
    pub namespace: String,
}

impl fmt::Debug for ConnectionProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionProfile")
            .field("endpoint", &self.endpoint)
            .field("namespace", &self.namespace)
            .field("token", &"<redacted>")
            .finish()
    }
}

impl ConnectionProfile {
    pub fn new(
        cluster: &str,
        credential: &Credential,
        endpoints: &EndpointMap,
    ) -> Result<Self, SynthesisError> {
        let endpoint = endpoints
            .get(cluster)
            .filter(|e| !e.is_empty())
            .ok_or_else(|| SynthesisError::NoEndpoint {
                cluster: cluster.to_string(),
            })?;

        let token = String::from_utf8(credential.token.clone()).map_err(|e| {
            SynthesisError::InvalidPayload(format!(
                "token in Secret {}/{} is not valid UTF-8: {}",
                credential.namespace, credential.secret_name, e
            ))
        })?;

        Ok(ConnectionProfile {
            endpoint: endpoint.to_string(),
            ca_data: STANDARD.encode(&credential.ca_data),
            token,
            namespace: credential.namespace.clone(),
        })
    }

    pub fn to_document(&self) -> KubeconfigDocument {
        KubeconfigDocument {
            api_version: "v1".to_string(),
            kind: "Config".to_string(),
            clusters: vec![NamedCluster {
                name: "cluster".to_string(),
                cluster: ClusterEntry {
                    certificate_authority_data: self.ca_data.clone(),
                    server: self.endpoint.clone(),
                },
            }],
            contexts: vec![NamedContext {
                name: "context".to_string(),
                context: ContextEntry {
                    cluster: "cluster".to_string(),
                    user: "user".to_string(),
                    namespace: self.namespace.clone(),
                },
            }],
            current_context: "context".to_string(),
            users: vec![NamedUser {
                name: "user".to_string(),
                user: UserEntry {
                    token: self.token.clone(),
                },
            }],
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct KubeconfigDocument {
    #[serde(rename = "apiVersion")]
    pub api_version: String,
    pub kind: String,
    pub clusters: Vec<NamedCluster>,
    pub contexts: Vec<NamedContext>,
    #[serde(rename = "current-context")]
    pub current_context: String,
    pub users: Vec<NamedUser>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct NamedCluster {
    pub name: String,
    pub cluster: ClusterEntry,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ClusterEntry {
    #[serde(rename = "certificate-authority-data")]
    pub certificate_authority_data: String,
    pub server: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct NamedContext {
    pub name: String,
    pub context: ContextEntry,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ContextEntry {
    pub cluster: String,
    pub user: String,
    pub namespace: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct NamedUser {
    pub name: String,
    pub user: UserEntry,
}

#[derive(Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct UserEntry {
    pub token: String,
}

impl fmt::Debug for UserEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserEntry").field("token", &"<redacted>").finish()
    }
}

/// Write the kubeconfig for `cluster` and return its path.
///
/// Fails without touching the file system when no endpoint is known for the cluster.
/// The file is replaced atomically, readers see either the previous or the new profile.
#[instrument(skip(credential, endpoints, dir))]
pub fn synthesize(
    cluster: &str,
    credential: &Credential,
    endpoints: &EndpointMap,
    dir: &Path,
    identity: &str,
) -> Result<PathBuf, SynthesisError> {
    let profile = ConnectionProfile::new(cluster, credential, endpoints)?;
    let yaml = serde_yaml::to_string(&profile.to_document())?;

    let path = profile_path(dir, identity, cluster);
    write_atomic(&path, yaml.as_bytes())?;

    info!("Kubeconfig for cluster {} written to {}", cluster, path.display());
    Ok(path)
}

fn write_atomic(path: &Path, contents: &[u8]) -> Result<(), SynthesisError> {
    let write_error = |source: std::io::Error| SynthesisError::Write {
        path: path.to_path_buf(),
        source,
    };

    let dir = path
        .parent()
        .ok_or_else(|| write_error(std::io::Error::other("profile path has no parent directory")))?;
    fs::create_dir_all(dir).map_err(write_error)?;

    let mut temp = tempfile::NamedTempFile::new_in(dir).map_err(write_error)?;
    temp.write_all(contents).map_err(write_error)?;
    temp.as_file().sync_all().map_err(write_error)?;
    temp.persist(path).map_err(|e| write_error(e.error))?;

    debug!("Persisted {} bytes to {}", contents.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const IDENTITY: &str = "multicluster-mcp-server";

    fn make_credential(token: &[u8]) -> Credential {
        Credential {
            namespace: "alpha".to_string(),
            secret_name: IDENTITY.to_string(),
            ca_data: b"-----BEGIN CERTIFICATE-----\nMIIB\n-----END CERTIFICATE-----\n".to_vec(),
            token: token.to_vec(),
        }
    }

    fn make_endpoints() -> EndpointMap {
        [("alpha".to_string(), "https://a.example:6443".to_string())]
            .into_iter()
            .collect()
    }

    #[test]
    fn test_profile_path_embeds_cluster() {
        let path = profile_path(Path::new("/tmp"), IDENTITY, "alpha");
        assert_eq!(path, PathBuf::from("/tmp/multicluster-mcp-server.alpha"));
    }

    #[test]
    fn test_synthesize_writes_kubeconfig() {
        let dir = TempDir::new().unwrap();
        let credential = make_credential(b"eyJhbGciOiJSUzI1NiJ9.payload.sig");

        let path = synthesize("alpha", &credential, &make_endpoints(), dir.path(), IDENTITY).unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        let document: KubeconfigDocument = serde_yaml::from_str(&contents).unwrap();
        assert_eq!(document.clusters[0].cluster.server, "https://a.example:6443");
        assert_eq!(
            document.clusters[0].cluster.certificate_authority_data,
            STANDARD.encode(&credential.ca_data)
        );
        assert_eq!(document.users[0].user.token, "eyJhbGciOiJSUzI1NiJ9.payload.sig");
        assert_eq!(document.contexts[0].context.namespace, "alpha");
        assert_eq!(document.current_context, "context");
    }

    #[test]
    fn test_synthesize_writes_plain_text_token() {
        let dir = TempDir::new().unwrap();
        let credential = make_credential(b"plain-token");

        let path = synthesize("alpha", &credential, &make_endpoints(), dir.path(), IDENTITY).unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        assert!(contents.contains("token: plain-token"));
        assert!(!contents.contains(&STANDARD.encode("plain-token")));
    }

    #[test]
    fn test_synthesized_profile_is_a_valid_kubeconfig() {
        let dir = TempDir::new().unwrap();
        let path = synthesize(
            "alpha",
            &make_credential(b"token"),
            &make_endpoints(),
            dir.path(),
            IDENTITY,
        )
        .unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        assert!(kube::config::Kubeconfig::from_yaml(&contents).is_ok());
    }

    #[test]
    fn test_synthesize_without_endpoint_writes_nothing() {
        let dir = TempDir::new().unwrap();

        let err = synthesize(
            "beta",
            &make_credential(b"token"),
            &make_endpoints(),
            dir.path(),
            IDENTITY,
        )
        .unwrap_err();

        assert!(matches!(err, SynthesisError::NoEndpoint { .. }));
        assert!(!profile_path(dir.path(), IDENTITY, "beta").exists());
    }

    #[test]
    fn test_synthesize_rejects_non_utf8_token() {
        let dir = TempDir::new().unwrap();

        let err = synthesize(
            "alpha",
            &make_credential(&[0xff, 0xfe]),
            &make_endpoints(),
            dir.path(),
            IDENTITY,
        )
        .unwrap_err();

        assert!(matches!(err, SynthesisError::InvalidPayload(_)));
        assert!(!profile_path(dir.path(), IDENTITY, "alpha").exists());
    }

    #[test]
    fn test_synthesize_overwrites_previous_profile() {
        let dir = TempDir::new().unwrap();
        let endpoints = make_endpoints();

        synthesize("alpha", &make_credential(b"first"), &endpoints, dir.path(), IDENTITY).unwrap();
        let path =
            synthesize("alpha", &make_credential(b"second"), &endpoints, dir.path(), IDENTITY).unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        assert!(contents.contains("token: second"));
        assert!(!contents.contains("first"));
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn test_synthesized_profile_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let path = synthesize(
            "alpha",
            &make_credential(b"token"),
            &make_endpoints(),
            dir.path(),
            IDENTITY,
        )
        .unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn test_profile_debug_redacts_token() {
        let profile = ConnectionProfile::new("alpha", &make_credential(b"hidden"), &make_endpoints()).unwrap();
        assert!(!format!("{:?}", profile).contains("hidden"));
        assert!(!format!("{:?}", profile.to_document()).contains("hidden"));
    }
}
