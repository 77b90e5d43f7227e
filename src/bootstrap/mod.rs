// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Credential bootstrap protocol: request an identity on a spoke, bind a role to it,
//! wait for both to converge and write a kubeconfig for the spoke.

pub mod binding;
pub mod identity;
pub mod orchestrator;
pub mod poller;
pub mod profile;
pub mod retry;

pub use binding::{publish_binding, resolve_subject_namespace, RoleBindingWork};
pub use identity::{request_identity, IdentityRequest};
pub use orchestrator::{Connector, Outcome};
pub use poller::{await_convergence, Credential};
pub use profile::{profile_path, synthesize};
pub use retry::RetryPolicy;

use kube::api::{Patch, PatchParams};
use kube::Api;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::Debug;
use tracing::debug;

/// Object echoed back by the hub after an apply, `None` when the response had no decodable body
pub type Acknowledgement<K> = Option<K>;

/// Server-side apply `object` as `field_manager`, taking ownership of conflicting fields
async fn server_side_apply<K>(
    api: &Api<K>,
    name: &str,
    object: &K,
    field_manager: &str,
) -> std::result::Result<Acknowledgement<K>, kube::Error>
where
    K: Clone + DeserializeOwned + Serialize + Debug,
{
    let pp = PatchParams::apply(field_manager).force();
    match api.patch(name, &pp, &Patch::Apply(object)).await {
        Ok(applied) => Ok(Some(applied)),
        Err(kube::Error::SerdeError(e)) => {
            debug!("Apply of {} returned an undecodable body: {}", name, e);
            Ok(None)
        }
        Err(e) => Err(e),
    }
}
