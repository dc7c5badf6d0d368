//! Values document mutation
//!
//! The virtual-cluster configuration lives in a YAML values file on disk,
//! created by an earlier fixture and mutated in place between lifecycle
//! steps. Edits go through `yq` one expression at a time; a sequence of
//! edits is NOT transactional - if edit N fails, edits 1..N-1 have already
//! been persisted. That matches the tool being wrapped and callers rely on
//! edits landing in the exact order issued.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::command;
use crate::Result;

/// The three policy toggles that put a virtual cluster into isolated mode
pub const ISOLATION_EXPRESSIONS: [&str; 3] = [
    ".policies.resourceQuota.enabled = true",
    ".policies.limitRange.enabled = true",
    ".policies.networkPolicy.enabled = true",
];

/// Expression enabling a control-plane distro variant
pub fn distro_enabled_expression(distro: &str) -> String {
    format!(".controlPlane.distro.{}.enabled = true", distro)
}

/// Expression selecting the control-plane image repository
pub fn image_repository_expression(repository: &str) -> String {
    format!(".controlPlane.statefulSet.image.repository = {}", repository)
}

/// Expression selecting the control-plane image tag
pub fn image_tag_expression(tag: &str) -> String {
    format!(".controlPlane.statefulSet.image.tag = {}", tag)
}

/// An on-disk values document addressed by path expressions
#[derive(Debug, Clone)]
pub struct ValuesFile {
    path: PathBuf,
}

impl ValuesFile {
    /// Wrap the values document at `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the underlying document
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Apply one path-expression edit in place via `yq e -i`
    pub async fn edit(&self, expression: &str) -> Result<()> {
        let path = self.path.to_string_lossy();
        debug!(path = %path, expression, "applying values edit");
        command::run("yq", &["e", "-i", expression, path.as_ref()]).await?;
        Ok(())
    }

    /// Apply edits as independent sequential calls, stopping at the first
    /// failure. Earlier edits stay persisted when a later one fails.
    pub async fn edit_all<I, S>(&self, expressions: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for expression in expressions {
            self.edit(expression.as_ref()).await?;
        }
        Ok(())
    }

    /// Read the document back, for post-edit diagnostics
    pub async fn contents(&self) -> Result<String> {
        Ok(tokio::fs::read_to_string(&self.path).await?)
    }
}
