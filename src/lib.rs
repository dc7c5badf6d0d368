//! vcluster-verify - lifecycle verification for virtual clusters
//!
//! Verifies that a virtual cluster deployed on a host Kubernetes cluster
//! moves through its lifecycle correctly: creation, readiness, upgrade
//! (including configuration-driven workload isolation), and teardown.
//!
//! The harness drives the already-built cluster-management tools (`helm`,
//! `kubectl`, the `vcluster` CLI, `yq`) and the host cluster API, then
//! confirms each transition with bounded polling of external state.
//!
//! # Modules
//!
//! - [`command`] - external command execution with captured output
//! - [`values`] - path-expression edits to the values document via `yq`
//! - [`probe`] - pluggable state probes (`vcluster list` text matching)
//! - [`poll`] - bounded retry-until-true polling and retried actions
//! - [`isolation`] - host-API probes for isolation policy objects
//! - [`context`] - explicit per-scenario configuration
//! - [`scenario`] - ordered lifecycle scenarios (deploy/delete, upgrade)
//! - [`error`] - error types for the harness

#![deny(missing_docs)]

pub mod command;
pub mod context;
pub mod error;
pub mod isolation;
pub mod poll;
pub mod probe;
pub mod scenario;
pub mod values;

pub use error::Error;

/// Result type alias using our custom Error type
pub type Result<T> = std::result::Result<T, Error>;

use std::time::Duration;

// =============================================================================
// Default Configuration Constants
// =============================================================================
// Centralized so the scenarios, the binary, and the e2e tests all agree on
// the same bounds.

/// Interval between poll ticks when waiting on external state
pub const POLLING_INTERVAL: Duration = Duration::from_secs(2);

/// Upper bound on any single lifecycle assertion
pub const POLLING_TIMEOUT: Duration = Duration::from_secs(120);

/// Chart repository the virtual-cluster chart is rendered from
pub const CHART_REPO: &str = "https://charts.loft.sh";

/// File the rendered manifest is persisted to; apply and delete both read it
pub const RENDERED_MANIFEST: &str = "output.yaml";
