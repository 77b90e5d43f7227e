// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Test utilities for faking the hub API.

use base64::{engine::general_purpose::STANDARD, Engine};
use http::{Request, Response};
use kube::client::Body;
use kube::Client;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use std::time::Duration;
use tower::Service;

type Route = (String, String);

/// A mock HTTP service that answers hub requests from per-route response queues.
///
/// Each route holds a sequence of responses; every call consumes the head of the
/// sequence except the last one, which keeps being returned. Unmatched requests get a 404.
#[derive(Clone, Default)]
pub struct MockService {
    responses: Arc<Mutex<HashMap<Route, VecDeque<(u16, String)>>>>,
    calls: Arc<Mutex<HashMap<Route, usize>>>,
    log: Arc<Mutex<Vec<Route>>>,
    latency: Option<Duration>,
}

impl MockService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer GET requests for `path` with a single repeated response
    pub fn on_get(self, path: &str, status: u16, body: &str) -> Self {
        self.on_sequence("GET", path, vec![(status, body.to_string())])
    }

    /// Answer PATCH requests (server-side apply) for `path` with a single repeated response
    pub fn on_patch(self, path: &str, status: u16, body: &str) -> Self {
        self.on_sequence("PATCH", path, vec![(status, body.to_string())])
    }

    /// Answer successive GET requests for `path` with the given responses in order
    pub fn on_get_sequence(self, path: &str, responses: Vec<(u16, String)>) -> Self {
        self.on_sequence("GET", path, responses)
    }

    fn on_sequence(self, method: &str, path: &str, responses: Vec<(u16, String)>) -> Self {
        self.responses
            .lock()
            .unwrap()
            .insert((method.to_string(), path.to_string()), responses.into());
        self
    }

    /// Delay every response by `latency`
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Every request received so far as (method, path), in arrival order
    pub fn requests(&self) -> Vec<(String, String)> {
        self.log.lock().unwrap().clone()
    }

    /// Build a kube Client backed by this mock. The mock stays usable for call assertions.
    pub fn client(&self) -> Client {
        Client::new(self.clone(), "default")
    }

    /// Number of requests received for the method and exact path
    pub fn calls(&self, method: &str, path: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .get(&(method.to_string(), path.to_string()))
            .copied()
            .unwrap_or(0)
    }

    fn next_response(&self, method: &str, path: &str) -> Option<(u16, String)> {
        let route = (method.to_string(), path.to_string());
        *self.calls.lock().unwrap().entry(route.clone()).or_default() += 1;
        self.log.lock().unwrap().push(route.clone());

        let mut responses = self.responses.lock().unwrap();
        let queue = responses.get_mut(&route)?;
        if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        }
    }
}

impl Service<Request<Body>> for MockService {
    type Response = Response<Body>;
    type Error = tower::BoxError;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let method = req.method().to_string();
        let path = req.uri().path().to_string();

        let (status, body) = self
            .next_response(&method, &path)
            .unwrap_or_else(|| (404, not_found_json("resource", &path)));

        let latency = self.latency;
        Box::pin(async move {
            if let Some(latency) = latency {
                tokio::time::sleep(latency).await;
            }
            Ok(Response::builder()
                .status(status)
                .header("content-type", "application/json")
                .body(Body::from(body.into_bytes()))
                .unwrap())
        })
    }
}

/// Request paths of the hub resources touched by a connection attempt
pub mod paths {
    pub fn managed_clusters() -> String {
        "/apis/cluster.open-cluster-management.io/v1/managedclusters".to_string()
    }

    pub fn managed_service_account(cluster: &str, name: &str) -> String {
        format!(
            "/apis/authentication.open-cluster-management.io/v1beta1/namespaces/{}/managedserviceaccounts/{}",
            cluster, name
        )
    }

    pub fn manifest_work(cluster: &str, name: &str) -> String {
        format!(
            "/apis/work.open-cluster-management.io/v1/namespaces/{}/manifestworks/{}",
            cluster, name
        )
    }

    pub fn addon(cluster: &str) -> String {
        format!(
            "/apis/addon.open-cluster-management.io/v1alpha1/namespaces/{}/managedclusteraddons/managed-serviceaccount",
            cluster
        )
    }

    pub fn secret(cluster: &str, name: &str) -> String {
        format!("/api/v1/namespaces/{}/secrets/{}", cluster, name)
    }
}

/// ManagedClusterList with one entry per (name, url)
pub fn managed_cluster_list_json(clusters: &[(&str, Option<&str>)]) -> String {
    let items: Vec<_> = clusters
        .iter()
        .map(|(name, url)| {
            let configs: Vec<_> = url
                .iter()
                .map(|u| serde_json::json!({ "url": u }))
                .collect();
            serde_json::json!({
                "apiVersion": "cluster.open-cluster-management.io/v1",
                "kind": "ManagedCluster",
                "metadata": { "name": name, "creationTimestamp": "2026-01-01T00:00:00Z" },
                "spec": { "hubAcceptsClient": true, "managedClusterClientConfigs": configs },
                "status": { "conditions": [
                    { "type": "ManagedClusterJoined", "status": "True" },
                    { "type": "ManagedClusterConditionAvailable", "status": "True" }
                ]}
            })
        })
        .collect();

    serde_json::json!({
        "apiVersion": "cluster.open-cluster-management.io/v1",
        "kind": "ManagedClusterList",
        "metadata": { "resourceVersion": "1" },
        "items": items
    })
    .to_string()
}

pub fn managed_service_account_json(cluster: &str, name: &str) -> String {
    serde_json::json!({
        "apiVersion": "authentication.open-cluster-management.io/v1beta1",
        "kind": "ManagedServiceAccount",
        "metadata": { "name": name, "namespace": cluster, "resourceVersion": "42" },
        "spec": { "rotation": {} }
    })
    .to_string()
}

/// ManifestWork at generation 1 whose single manifest reports the given Applied status and message
pub fn manifest_work_json(cluster: &str, name: &str, applied: Option<(&str, Option<&str>)>) -> String {
    manifest_work_at_generation_json(
        cluster,
        name,
        1,
        applied.map(|(status, message)| (status, message, 1)),
    )
}

/// ManifestWork at `generation` whose Applied condition was observed for the given generation
pub fn manifest_work_at_generation_json(
    cluster: &str,
    name: &str,
    generation: i64,
    applied: Option<(&str, Option<&str>, i64)>,
) -> String {
    let conditions: Vec<_> = applied
        .iter()
        .map(|(status, message, observed)| {
            serde_json::json!({
                "type": "Applied",
                "status": status,
                "message": message,
                "observedGeneration": observed
            })
        })
        .collect();

    serde_json::json!({
        "apiVersion": "work.open-cluster-management.io/v1",
        "kind": "ManifestWork",
        "metadata": { "name": name, "namespace": cluster, "generation": generation },
        "spec": { "workload": { "manifests": [] } },
        "status": {
            "resourceStatus": { "manifests": [{
                "resourceMeta": { "ordinal": 0, "kind": "ClusterRoleBinding", "name": format!("{}-binding", name) },
                "conditions": conditions
            }]}
        }
    })
    .to_string()
}

pub fn addon_json(cluster: &str, namespace: Option<&str>) -> String {
    serde_json::json!({
        "apiVersion": "addon.open-cluster-management.io/v1alpha1",
        "kind": "ManagedClusterAddOn",
        "metadata": { "name": "managed-serviceaccount", "namespace": cluster },
        "spec": {},
        "status": { "namespace": namespace }
    })
    .to_string()
}

/// Token secret as the hub returns it, with data values base64 encoded on the wire
pub fn secret_json(cluster: &str, name: &str, ca: Option<&[u8]>, token: Option<&[u8]>) -> String {
    let mut data = serde_json::Map::new();
    if let Some(ca) = ca {
        data.insert("ca.crt".to_string(), STANDARD.encode(ca).into());
    }
    if let Some(token) = token {
        data.insert("token".to_string(), STANDARD.encode(token).into());
    }

    serde_json::json!({
        "apiVersion": "v1",
        "kind": "Secret",
        "metadata": { "name": name, "namespace": cluster },
        "type": "Opaque",
        "data": data
    })
    .to_string()
}

/// Create a 404 not found response
pub fn not_found_json(resource: &str, name: &str) -> String {
    serde_json::json!({
        "kind": "Status",
        "apiVersion": "v1",
        "status": "Failure",
        "message": format!("{} \"{}\" not found", resource, name),
        "reason": "NotFound",
        "code": 404
    })
    .to_string()
}

/// Create a 403 forbidden response
pub fn forbidden_json(message: &str) -> String {
    serde_json::json!({
        "kind": "Status",
        "apiVersion": "v1",
        "status": "Failure",
        "message": message,
        "reason": "Forbidden",
        "code": 403
    })
    .to_string()
}
