//! End-to-end lifecycle tests for vcluster-verify
//!
//! These tests require a host Kubernetes cluster plus the `kubectl`,
//! `helm`, `vcluster`, and `yq` binaries on PATH. They are ignored by
//! default and can be run with:
//!
//! ```bash
//! cargo test --test e2e -- --ignored
//! ```

mod e2e_tests;
