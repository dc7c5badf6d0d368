//! Scenario configuration
//!
//! Everything a scenario needs to know - cluster identity, variant
//! selection, mode flags, file locations - travels in an explicit
//! [`ScenarioContext`] value rather than process-wide globals, so two
//! scenarios with different contexts can coexist in one process.

use std::env;
use std::path::PathBuf;

use rand::Rng;

/// Character set for generated name suffixes
const SUFFIX_CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Environment variable selecting the control-plane distro variant
pub const ENV_DISTRO: &str = "VCLUSTER_DISTRO";
/// Environment variable selecting the control-plane image repository
pub const ENV_IMAGE_REPOSITORY: &str = "REPLACE_REPOSITORY_NAME";
/// Environment variable selecting the control-plane image tag
pub const ENV_IMAGE_TAG: &str = "REPLACE_TAG_NAME";
/// Environment variable naming the pre-deployed virtual cluster
pub const ENV_VCLUSTER_NAME: &str = "VCLUSTER_NAME";
/// Environment variable naming the pre-deployed cluster's host namespace
pub const ENV_VCLUSTER_NAMESPACE: &str = "VCLUSTER_NAMESPACE";
/// Environment variable flagging a multi-namespace test run
pub const ENV_MULTI_NAMESPACE_MODE: &str = "MULTI_NAMESPACE_MODE";

/// Configuration threaded into each scenario invocation
#[derive(Debug, Clone)]
pub struct ScenarioContext {
    /// Name of the pre-deployed virtual cluster the upgrade scenario targets
    pub vcluster_name: String,
    /// Host namespace that cluster lives in
    pub vcluster_namespace: String,
    /// Control-plane distro variant to select during upgrade
    pub distro: String,
    /// Control-plane image repository to pin during upgrade
    pub image_repository: String,
    /// Control-plane image tag to pin during upgrade
    pub image_tag: String,
    /// Whether the run targets multi-namespace mode, which cannot host
    /// the isolation scenario
    pub multi_namespace_mode: bool,
    /// Values document mutated between lifecycle steps
    pub values_path: PathBuf,
    /// Local chart directory the upgrade renders from
    pub chart_dir: PathBuf,
}

impl ScenarioContext {
    /// Build a context from the scenario-selection environment, with the
    /// file locations supplied by the caller
    pub fn from_env(values_path: impl Into<PathBuf>, chart_dir: impl Into<PathBuf>) -> Self {
        Self {
            vcluster_name: env_or(ENV_VCLUSTER_NAME, "vcluster"),
            vcluster_namespace: env_or(ENV_VCLUSTER_NAMESPACE, "vcluster"),
            distro: env_or(ENV_DISTRO, "k8s"),
            image_repository: env_or(ENV_IMAGE_REPOSITORY, ""),
            image_tag: env_or(ENV_IMAGE_TAG, ""),
            multi_namespace_mode: parse_mode_flag(env::var(ENV_MULTI_NAMESPACE_MODE).ok().as_deref()),
            values_path: values_path.into(),
            chart_dir: chart_dir.into(),
        }
    }
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Interpret the multi-namespace mode flag: only the literal `"true"`
/// enables it
pub fn parse_mode_flag(value: Option<&str>) -> bool {
    value == Some("true")
}

/// Generate a lowercase alphanumeric suffix of `len` characters, used to
/// keep concurrently running scenarios from aliasing each other's state
pub fn random_suffix(len: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..len)
        .map(|_| {
            let idx = rng.gen_range(0..SUFFIX_CHARSET.len());
            SUFFIX_CHARSET[idx] as char
        })
        .collect()
}
