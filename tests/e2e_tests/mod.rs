//! End-to-end tests for the lifecycle scenarios
//!
//! Tests are organized by the scenario they exercise:
//!
//! - `deploy_delete`: a fresh virtual cluster is rendered, applied,
//!   observed running, deleted, and observed gone
//! - `upgrade_isolation`: a pre-deployed virtual cluster is upgraded into
//!   isolated mode and the isolation objects are verified on the host API
//!
//! # Running These Tests
//!
//! These tests are ignored by default because they mutate a real host
//! cluster:
//!
//! ```bash
//! # Full lifecycle round trip (~5min)
//! cargo test --test e2e deploy_delete -- --ignored --nocapture
//!
//! # Upgrade and isolation verification (requires a deployed vcluster)
//! cargo test --test e2e upgrade_isolation -- --ignored --nocapture
//! ```

mod deploy_delete;
mod helpers;
mod upgrade_isolation;
