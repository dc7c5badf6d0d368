//! E2E: deploy a fresh virtual cluster and tear it down again
//!
//! Story: a platform operator renders the chart for a brand-new virtual
//! cluster, applies it, watches it come up, deletes it, and confirms the
//! host cluster no longer lists it.

use std::path::PathBuf;

use vcluster_verify::context::ScenarioContext;
use vcluster_verify::probe::{CliStatusProbe, Probe};
use vcluster_verify::scenario::{DeployDelete, ScenarioOutcome};

use super::helpers::require_tools;

/// Values file the chart renders with; override for non-default setups
fn values_path() -> PathBuf {
    std::env::var("VCLUSTER_VALUES_FILE")
        .unwrap_or_else(|_| "commonValues.yaml".to_string())
        .into()
}

/// Full round trip: after delete plus the absence assertion, a fresh
/// presence probe for the same name must come back unsatisfied.
#[tokio::test]
#[ignore = "requires host cluster with kubectl, helm, and vcluster - run with: cargo test --test e2e -- --ignored"]
async fn deployed_cluster_runs_and_deletion_removes_it() {
    require_tools(&["kubectl", "helm", "vcluster"]).await;

    let ctx = ScenarioContext::from_env(values_path(), "chart");
    let scenario = DeployDelete::new(&ctx);
    let name = scenario.name().to_string();

    let outcome = scenario.run().await.expect("scenario must pass");
    assert_eq!(outcome, ScenarioOutcome::Passed);

    // The scenario already asserted absence; one more fresh observation
    // proves the probe is not reporting stale state
    let probe = CliStatusProbe::running(name.as_str());
    let observation = probe.observe().await.expect("listing must succeed");
    assert!(
        !observation.satisfied,
        "deleted cluster {name} still listed as running: {}",
        observation.detail
    );
}

/// Back-to-back runs target distinct names, so a second deployment cannot
/// alias state left behind by the first. Runs are sequential because both
/// persist their manifest to the same well-known file.
#[tokio::test]
#[ignore = "requires host cluster with kubectl, helm, and vcluster - run with: cargo test --test e2e -- --ignored"]
async fn repeated_scenarios_get_distinct_clusters() {
    require_tools(&["kubectl", "helm", "vcluster"]).await;

    let ctx = ScenarioContext::from_env(values_path(), "chart");
    let first = DeployDelete::new(&ctx);
    let second = DeployDelete::new(&ctx);
    assert_ne!(first.name(), second.name());

    let a = first.run().await.expect("first scenario must pass");
    let b = second.run().await.expect("second scenario must pass");
    assert_eq!(a, ScenarioOutcome::Passed);
    assert_eq!(b, ScenarioOutcome::Passed);
}
