//! Capture-side working copy of the upstream repository.
//!
//! The mirror is cloned once and afterwards only updated. Working-tree edits
//! inside it belong to the operator and are never reset.

use std::path::Path;

use serde::Serialize;

use crate::error::{SyncError, VcsQuery};
use crate::tools::ExternalTools;

/// What [`ensure`] managed to do. Failures are logged, not returned.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MirrorReport {
    /// The mirror was absent and a clone succeeded.
    pub cloned: bool,
    /// An existing mirror fetched remote refs and tags.
    pub fetched: bool,
    /// An existing mirror fast-forwarded to its upstream branch.
    pub merged: bool,
}

impl MirrorReport {
    pub fn refreshed(&self) -> bool {
        self.cloned || (self.fetched && self.merged)
    }
}

/// Clone `mirror` from `remote` if absent, otherwise update it in place.
///
/// Best-effort: a failed clone or update is logged and reported, never
/// returned as an error. Call [`verify`] afterwards.
pub fn ensure(tools: &dyn ExternalTools, mirror: &Path, remote: Option<&str>) -> MirrorReport {
    let mut report = MirrorReport::default();

    if !mirror.exists() {
        let Some(remote) = remote else {
            tracing::warn!(
                "mirror {} is missing and no mirror_remote is configured",
                mirror.display()
            );
            return report;
        };
        let parent = mirror.parent().unwrap_or_else(|| Path::new("."));
        if let Err(e) = std::fs::create_dir_all(parent) {
            tracing::warn!("cannot create {}: {e}", parent.display());
            return report;
        }
        let dest = mirror.to_string_lossy().into_owned();
        tracing::info!("cloning {remote} into {dest}");
        report.cloned = step(tools, parent, VcsQuery::Clone, &["clone", remote, dest.as_str()]);
        return report;
    }

    tracing::info!("updating mirror at {}", mirror.display());
    report.fetched = step(tools, mirror, VcsQuery::Update, &["fetch", "--tags", "--prune"]);
    if report.fetched {
        report.merged = step(tools, mirror, VcsQuery::Update, &["merge", "--ff-only", "@{upstream}"]);
    }
    report
}

/// Fail unless `mirror` holds a version-control working copy.
pub fn verify(mirror: &Path) -> Result<(), SyncError> {
    if !mirror.is_dir() {
        return Err(SyncError::MirrorUnusable {
            path: mirror.to_path_buf(),
            reason: "directory does not exist".to_string(),
        });
    }
    // `.git` is a file in linked worktrees and submodules.
    if !mirror.join(".git").exists() {
        return Err(SyncError::MirrorUnusable {
            path: mirror.to_path_buf(),
            reason: "not a git working copy".to_string(),
        });
    }
    Ok(())
}

fn step(tools: &dyn ExternalTools, dir: &Path, query: VcsQuery, args: &[&str]) -> bool {
    match tools.run_vcs(dir, args) {
        Ok(out) if out.success() => true,
        Ok(out) => {
            tracing::warn!("{query} failed in {}: {}", dir.display(), out.failure_detail());
            false
        }
        Err(e) => {
            tracing::warn!("{query} failed in {}: {e}", dir.display());
            false
        }
    }
}
