//! Isolation policy objects on the host cluster
//!
//! Enabling isolated mode makes the virtual cluster deploy a resource
//! quota, a limit range, and a network policy into its host namespace.
//! These are observed through structured API lookups - present means the
//! object exists, absent means the lookup returns 404 - which sidesteps
//! the substring fragility of the CLI text probe entirely.

use async_trait::async_trait;
use k8s_openapi::api::core::v1::{LimitRange, ResourceQuota};
use k8s_openapi::api::networking::v1::NetworkPolicy;
use kube::{Api, Client};
use tracing::debug;

use crate::probe::{Observation, Probe};
use crate::Result;

/// Release name the chart uses when none is supplied; pre-upgrade checks
/// look for objects derived from it
pub const DEFAULT_RELEASE: &str = "vcluster";

/// The three kinds of isolation object a virtual cluster owns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyKind {
    /// `v1` ResourceQuota capping the cluster's aggregate resource use
    ResourceQuota,
    /// `v1` LimitRange bounding per-container requests and limits
    LimitRange,
    /// `networking.k8s.io/v1` NetworkPolicy fencing workload traffic
    NetworkPolicy,
}

impl PolicyKind {
    /// All kinds, in the order the chart creates them
    pub const ALL: [Self; 3] = [Self::ResourceQuota, Self::LimitRange, Self::NetworkPolicy];

    /// Short lowercase label for logging and diagnostics
    pub fn label(&self) -> &'static str {
        match self {
            Self::ResourceQuota => "resourcequota",
            Self::LimitRange => "limitrange",
            Self::NetworkPolicy => "networkpolicy",
        }
    }
}

/// Derive the object name the chart gives an isolation resource.
///
/// Quota and limit range are `vc-<release>`; the network policy scopes the
/// workload traffic and is named `vc-work-<release>`.
pub fn object_name(kind: PolicyKind, release: &str) -> String {
    match kind {
        PolicyKind::ResourceQuota | PolicyKind::LimitRange => format!("vc-{}", release),
        PolicyKind::NetworkPolicy => format!("vc-work-{}", release),
    }
}

/// One typed lookup: Ok(true) on success, Ok(false) on 404, Err otherwise
async fn resource_exists<K>(client: &Client, namespace: &str, name: &str) -> Result<bool>
where
    K: kube::Resource<Scope = k8s_openapi::NamespaceResourceScope>
        + Clone
        + serde::de::DeserializeOwned
        + std::fmt::Debug,
    K::DynamicType: Default,
{
    let api: Api<K> = Api::namespaced(client.clone(), namespace);
    match api.get(name).await {
        Ok(_) => Ok(true),
        Err(kube::Error::Api(e)) if e.code == 404 => Ok(false),
        Err(e) => Err(e.into()),
    }
}

/// Whether the isolation object of `kind` derived from `release` currently
/// exists in `namespace`
pub async fn policy_exists(
    client: &Client,
    namespace: &str,
    kind: PolicyKind,
    release: &str,
) -> Result<bool> {
    let name = object_name(kind, release);
    let found = match kind {
        PolicyKind::ResourceQuota => {
            resource_exists::<ResourceQuota>(client, namespace, &name).await?
        }
        PolicyKind::LimitRange => resource_exists::<LimitRange>(client, namespace, &name).await?,
        PolicyKind::NetworkPolicy => {
            resource_exists::<NetworkPolicy>(client, namespace, &name).await?
        }
    };
    debug!(kind = kind.label(), name = %name, namespace, found, "policy lookup");
    Ok(found)
}

/// Structured probe over one isolation object
#[derive(Clone)]
pub struct PolicyProbe {
    client: Client,
    namespace: String,
    kind: PolicyKind,
    release: String,
    expect_present: bool,
}

impl PolicyProbe {
    /// Probe that the object exists
    pub fn present(
        client: Client,
        namespace: impl Into<String>,
        kind: PolicyKind,
        release: impl Into<String>,
    ) -> Self {
        Self {
            client,
            namespace: namespace.into(),
            kind,
            release: release.into(),
            expect_present: true,
        }
    }

    /// Probe that the lookup returns not-found
    pub fn absent(
        client: Client,
        namespace: impl Into<String>,
        kind: PolicyKind,
        release: impl Into<String>,
    ) -> Self {
        Self {
            client,
            namespace: namespace.into(),
            kind,
            release: release.into(),
            expect_present: false,
        }
    }
}

#[async_trait]
impl Probe for PolicyProbe {
    async fn observe(&self) -> Result<Observation> {
        let found = policy_exists(&self.client, &self.namespace, self.kind, &self.release).await?;
        let name = object_name(self.kind, &self.release);
        let detail = format!(
            "{} {}/{} {}",
            self.kind.label(),
            self.namespace,
            name,
            if found { "present" } else { "not found" }
        );
        Ok(Observation {
            satisfied: found == self.expect_present,
            detail,
        })
    }
}
