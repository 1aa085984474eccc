//! Upstream tag validation.
//!
//! The pinned snapshot is only trusted when the revision checked out in its
//! repository is named by exactly `v<version>`. There is no fallback to a
//! "closest" tag.

use std::path::Path;

use sdkpin_core::SdkVersion;

use crate::error::{SyncError, VcsQuery};
use crate::tools::ExternalTools;

/// Output of `name-rev` when no tag reaches the revision.
const UNDEFINED: &str = "undefined";

/// Resolve the tag naming the checked-out revision of `repo`.
///
/// Returns `Ok(None)` when the revision is not tagged.
pub fn current_tag(tools: &dyn ExternalTools, repo: &Path) -> Result<Option<String>, SyncError> {
    let head = run_query(tools, repo, VcsQuery::Head, &["rev-parse", "HEAD"])?;
    let sha = head.trim();
    if sha.is_empty() {
        return Err(SyncError::Vcs {
            query: VcsQuery::Head,
            repo: repo.to_path_buf(),
            detail: "rev-parse printed no revision".to_string(),
        });
    }

    let names = run_query(
        tools,
        repo,
        VcsQuery::TagLookup,
        &["name-rev", "--tags", "--name-only", sha],
    )?;
    Ok(first_tag(&names))
}

/// Fail unless `repo` is checked out at `v<version>`.
pub fn validate(
    tools: &dyn ExternalTools,
    repo: &Path,
    version: &SdkVersion,
) -> Result<(), SyncError> {
    let expected = version.tag();
    match current_tag(tools, repo)? {
        Some(actual) if actual == expected => {
            tracing::info!("{} is at {expected}", repo.display());
            Ok(())
        }
        other => Err(SyncError::TagMismatch {
            repo: repo.to_path_buf(),
            expected,
            actual: other.unwrap_or_else(|| "no tag".to_string()),
        }),
    }
}

fn run_query(
    tools: &dyn ExternalTools,
    repo: &Path,
    query: VcsQuery,
    args: &[&str],
) -> Result<String, SyncError> {
    let out = tools.run_vcs(repo, args).map_err(|e| SyncError::Vcs {
        query,
        repo: repo.to_path_buf(),
        detail: format!("failed to run git: {e}"),
    })?;
    if !out.success() {
        return Err(SyncError::Vcs {
            query,
            repo: repo.to_path_buf(),
            detail: out.failure_detail(),
        });
    }
    Ok(out.stdout_text())
}

/// First line of `name-rev` output, trimmed, with the annotated-tag `^0`
/// peel suffix removed.
fn first_tag(output: &str) -> Option<String> {
    let line = output.lines().next()?.trim();
    let name = line.strip_suffix("^0").unwrap_or(line);
    if name.is_empty() || name == UNDEFINED {
        None
    } else {
        Some(name.to_string())
    }
}
