//! vcluster-verify - drive virtual-cluster lifecycle scenarios from the CLI

use std::path::PathBuf;
use std::time::Instant;

use clap::{Parser, Subcommand};
use kube::Client;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use vcluster_verify::command::tool_available;
use vcluster_verify::context::{parse_mode_flag, ScenarioContext};
use vcluster_verify::scenario::{DeployDelete, ScenarioOutcome, UpgradeIsolation};
use vcluster_verify::Error;

/// Lifecycle verification for virtual clusters on a host Kubernetes cluster
#[derive(Parser, Debug)]
#[command(name = "vcluster-verify", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Deploy a fresh virtual cluster, verify it runs, delete it, verify
    /// it is gone
    DeployDelete(DeployDeleteArgs),

    /// Upgrade a pre-deployed virtual cluster into isolated mode and
    /// verify the isolation objects on the host API
    Upgrade(UpgradeArgs),
}

#[derive(Parser, Debug)]
struct DeployDeleteArgs {
    /// Values file the chart is rendered with
    #[arg(short = 'f', long = "values", default_value = "commonValues.yaml")]
    values: PathBuf,
}

#[derive(Parser, Debug)]
struct UpgradeArgs {
    /// Values file mutated and fed to the upgrade
    #[arg(short = 'f', long = "values", default_value = "values.yaml")]
    values: PathBuf,

    /// Local chart directory the upgrade renders from
    #[arg(long = "chart-dir", default_value = "chart")]
    chart_dir: PathBuf,

    /// Name of the pre-deployed virtual cluster
    #[arg(long, env = "VCLUSTER_NAME", default_value = "vcluster")]
    name: String,

    /// Host namespace the cluster lives in
    #[arg(long, env = "VCLUSTER_NAMESPACE", default_value = "vcluster")]
    namespace: String,

    /// Control-plane distro variant to enable
    #[arg(long, env = "VCLUSTER_DISTRO", default_value = "k8s")]
    distro: String,

    /// Control-plane image repository to pin
    #[arg(long, env = "REPLACE_REPOSITORY_NAME")]
    repository: String,

    /// Control-plane image tag to pin
    #[arg(long, env = "REPLACE_TAG_NAME")]
    tag: String,

    /// Multi-namespace mode flag; the literal "true" skips this scenario
    #[arg(long, env = "MULTI_NAMESPACE_MODE", default_value = "false")]
    multi_namespace_mode: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // The kube client needs a process-wide rustls crypto provider
    if let Err(e) = rustls::crypto::aws_lc_rs::default_provider().install_default() {
        anyhow::bail!("failed to install rustls crypto provider: {:?}", e);
    }

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let start = Instant::now();

    let outcome = match cli.command {
        Commands::DeployDelete(args) => run_deploy_delete(args).await?,
        Commands::Upgrade(args) => run_upgrade(args).await?,
    };

    match outcome {
        ScenarioOutcome::Passed => {
            println!("\n=== Scenario passed ({:?}) ===", start.elapsed());
        }
        ScenarioOutcome::Skipped { reason } => {
            println!("\n=== Scenario skipped: {} ===", reason);
        }
    }
    Ok(())
}

/// Fail fast when a required tool is not on PATH
async fn check_prerequisites(tools: &[(&str, &str)]) -> anyhow::Result<()> {
    for (tool, hint) in tools {
        if !tool_available(tool).await {
            return Err(Error::prerequisite(*tool, *hint).into());
        }
    }
    Ok(())
}

async fn run_deploy_delete(args: DeployDeleteArgs) -> anyhow::Result<ScenarioOutcome> {
    check_prerequisites(&[
        ("kubectl", "https://kubernetes.io/docs/tasks/tools/"),
        ("helm", "https://helm.sh/docs/intro/install/"),
        ("vcluster", "https://www.vcluster.com/docs/get-started"),
    ])
    .await?;

    let ctx = ScenarioContext::from_env(args.values, "chart");
    let scenario = DeployDelete::new(&ctx);
    println!(
        "=== Deploy and delete: cluster {} in namespace {} ===",
        scenario.name(),
        scenario.namespace()
    );
    Ok(scenario.run().await?)
}

async fn run_upgrade(args: UpgradeArgs) -> anyhow::Result<ScenarioOutcome> {
    check_prerequisites(&[
        ("yq", "https://github.com/mikefarah/yq#install"),
        ("vcluster", "https://www.vcluster.com/docs/get-started"),
    ])
    .await?;

    let ctx = ScenarioContext {
        vcluster_name: args.name,
        vcluster_namespace: args.namespace,
        distro: args.distro,
        image_repository: args.repository,
        image_tag: args.tag,
        multi_namespace_mode: parse_mode_flag(Some(&args.multi_namespace_mode)),
        values_path: args.values,
        chart_dir: args.chart_dir,
    };

    let client = Client::try_default()
        .await
        .map_err(|e| anyhow::anyhow!("failed to create Kubernetes client: {}", e))?;

    println!(
        "=== Upgrade with isolation: cluster {} in namespace {} ===",
        ctx.vcluster_name, ctx.vcluster_namespace
    );
    Ok(UpgradeIsolation::new(ctx, client).run().await?)
}
