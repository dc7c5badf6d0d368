//! State probes
//!
//! A probe answers "does the external state currently satisfy the
//! condition?" with a fresh observation on every call - nothing is cached
//! across poll ticks. Implementations are swappable behind the [`Probe`]
//! trait so the poller never cares whether state comes from CLI text or a
//! structured API lookup.

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;

use crate::command;
use crate::Result;

/// One evaluation of external state
#[derive(Debug, Clone)]
pub struct Observation {
    /// Whether the probed condition currently holds
    pub satisfied: bool,
    /// Raw state backing the verdict, kept for timeout diagnostics
    pub detail: String,
}

impl Observation {
    /// A satisfied observation
    pub fn satisfied(detail: impl Into<String>) -> Self {
        Self {
            satisfied: true,
            detail: detail.into(),
        }
    }

    /// An unsatisfied observation
    pub fn unsatisfied(detail: impl Into<String>) -> Self {
        Self {
            satisfied: false,
            detail: detail.into(),
        }
    }
}

/// A repeatable predicate over external state
#[cfg_attr(test, automock)]
#[async_trait]
pub trait Probe: Send + Sync {
    /// Evaluate the current state from scratch
    async fn observe(&self) -> Result<Observation>;
}

// =============================================================================
// CLI text probe
// =============================================================================

/// Status token the listing prints for a healthy virtual cluster
const RUNNING_MARKER: &str = "Running";

/// What a [`CliStatusProbe`] expects to find in the listing output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expectation {
    /// The cluster is listed and marked running
    Running,
    /// The cluster no longer appears in the listing at all
    Absent,
}

/// Probe that runs `vcluster list` and matches substrings of its output.
///
/// Matching rule, exactly: presence requires BOTH the cluster name and the
/// `Running` token somewhere in the combined output; absence requires the
/// name to not appear at all. Free-text matching is fragile - a cluster
/// whose name is a prefix of another's will satisfy presence spuriously -
/// so prefer the structured API probes wherever an equivalent exists.
#[derive(Debug, Clone)]
pub struct CliStatusProbe {
    name: String,
    expectation: Expectation,
}

impl CliStatusProbe {
    /// Probe that the named cluster is listed as running
    pub fn running(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            expectation: Expectation::Running,
        }
    }

    /// Probe that the named cluster has disappeared from the listing
    pub fn absent(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            expectation: Expectation::Absent,
        }
    }
}

#[async_trait]
impl Probe for CliStatusProbe {
    async fn observe(&self) -> Result<Observation> {
        let output = command::run("vcluster", &["list"]).await?;
        let listing = output.combined();
        let satisfied = match self.expectation {
            Expectation::Running => indicates_running(&listing, &self.name),
            Expectation::Absent => indicates_absent(&listing, &self.name),
        };
        Ok(Observation {
            satisfied,
            detail: listing.trim().to_string(),
        })
    }
}

/// Presence rule: name substring AND running marker both found
pub fn indicates_running(listing: &str, name: &str) -> bool {
    listing.contains(name) && listing.contains(RUNNING_MARKER)
}

/// Absence rule: name substring not found
pub fn indicates_absent(listing: &str, name: &str) -> bool {
    !listing.contains(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listed_and_running_cluster_satisfies_presence() {
        let listing = "NAME               NAMESPACE      STATUS\n\
                       t-cluster-abc123   t-ns-abc123    Running";
        assert!(indicates_running(listing, "t-cluster-abc123"));
    }

    #[test]
    fn listed_but_pending_cluster_does_not_satisfy_presence() {
        let listing = "t-cluster-abc123   t-ns-abc123    Pending";
        assert!(!indicates_running(listing, "t-cluster-abc123"));
    }

    #[test]
    fn missing_cluster_does_not_satisfy_presence_even_if_others_run() {
        let listing = "other-cluster   other-ns   Running";
        assert!(!indicates_running(listing, "t-cluster-abc123"));
    }

    #[test]
    fn absence_holds_only_when_name_never_appears() {
        assert!(indicates_absent("other-cluster   other-ns   Running", "t-cluster-abc123"));
        assert!(!indicates_absent("t-cluster-abc123   t-ns   Terminating", "t-cluster-abc123"));
    }

    #[test]
    fn substring_names_are_a_documented_false_positive() {
        // "t-cluster-abc" is a prefix of "t-cluster-abc123"; the text rule
        // cannot tell them apart. This is exactly why the structured API
        // probes exist.
        let listing = "t-cluster-abc123   t-ns   Running";
        assert!(indicates_running(listing, "t-cluster-abc"));
        assert!(!indicates_absent(listing, "t-cluster-abc"));
    }

    #[test]
    fn observation_constructors_record_detail() {
        let yes = Observation::satisfied("t-cluster-abc123   Running");
        assert!(yes.satisfied);
        assert!(yes.detail.contains("Running"));

        let no = Observation::unsatisfied("empty listing");
        assert!(!no.satisfied);
        assert_eq!(no.detail, "empty listing");
    }
}
