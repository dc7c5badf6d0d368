//! Test helpers for the e2e lifecycle tests

use kube::Client;

use vcluster_verify::command::tool_available;

/// Panic with a pointed message when a required tool is missing, so a
/// half-configured environment fails fast instead of timing out later
pub async fn require_tools(tools: &[&str]) {
    for tool in tools {
        assert!(
            tool_available(tool).await,
            "e2e tests require `{tool}` on PATH"
        );
    }
}

/// Create a client for the host cluster from the ambient kubeconfig.
///
/// Returns a fresh client per call - clients are not shared across test
/// threads.
pub async fn host_client() -> Client {
    // Install default crypto provider (required for rustls); duplicate
    // installs across tests are fine
    let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();

    Client::try_default()
        .await
        .expect("failed to create client from ambient kubeconfig")
}
