//! Error types for sdkpin-sync.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use sdkpin_core::{ConfigError, Stage};

/// Exit status for a missing or unparseable version declaration.
pub const EXIT_CONFIG: i32 = 30;
/// Exit status when the checked-out revision cannot be resolved.
pub const EXIT_VCS_HEAD: i32 = 31;
/// Exit status when the tag lookup query fails.
pub const EXIT_VCS_TAG: i32 = 32;
/// Exit status when the upstream checkout is not at `v<version>`.
pub const EXIT_TAG_MISMATCH: i32 = 33;
/// Exit status for copy/remove failures.
pub const EXIT_IO: i32 = 34;
/// Exit status when the patch cannot be applied at all.
pub const EXIT_PATCH_UNAVAILABLE: i32 = 35;
/// Exit status when no usable mirror exists after ensure.
pub const EXIT_MIRROR: i32 = 36;
/// Exit status when the patch cannot be generated or written.
pub const EXIT_CAPTURE: i32 = 37;
/// Exit status for command-line usage errors, kept clear of the patch tool's 0-2.
pub const EXIT_USAGE: i32 = 38;

/// Which version-control query failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VcsQuery {
    /// `rev-parse HEAD` in the upstream repository.
    Head,
    /// `name-rev --tags` for the resolved revision.
    TagLookup,
    /// Initial clone of the mirror.
    Clone,
    /// Fetch/merge of an existing mirror.
    Update,
    /// Diff of the mirror against the pinned tag.
    Diff,
}

impl fmt::Display for VcsQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            VcsQuery::Head => "resolving checked-out revision",
            VcsQuery::TagLookup => "looking up tag",
            VcsQuery::Clone => "cloning mirror",
            VcsQuery::Update => "updating mirror",
            VcsQuery::Diff => "generating diff",
        };
        f.write_str(s)
    }
}

/// All errors that can end a run.
///
/// None of these are retried: each needs operator action (fix the declared
/// version, check out the right tag, free disk space, regenerate the patch).
#[derive(Debug, Error)]
pub enum SyncError {
    /// Version or layout could not be resolved.
    #[error("{0}")]
    Config(#[from] ConfigError),

    /// The underlying version-control command failed or could not start.
    #[error("unexpected git error {query} in {repo}: {detail}")]
    Vcs {
        query: VcsQuery,
        repo: PathBuf,
        detail: String,
    },

    /// The upstream sandbox is not checked out at the expected tag.
    #[error("{repo} is not checked out at the expected tag {expected} (found {actual})")]
    TagMismatch {
        repo: PathBuf,
        expected: String,
        actual: String,
    },

    /// An I/O error, with annotated path and the stage it happened in.
    #[error("I/O error at {path}: {source}")]
    Io {
        stage: Stage,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The stored patch file does not exist.
    #[error("patch file not found at {path}")]
    PatchMissing { path: PathBuf },

    /// The patch tool could not be started.
    #[error("failed to run patch tool: {source}")]
    PatchTool {
        #[source]
        source: std::io::Error,
    },

    /// No version-control working copy at the mirror path after ensure.
    #[error("no usable mirror at {path}: {reason}")]
    MirrorUnusable { path: PathBuf, reason: String },
}

impl SyncError {
    /// Stage of the state machine the failure belongs to.
    pub fn stage(&self) -> Stage {
        match self {
            SyncError::Config(_) => Stage::VersionResolved,
            SyncError::Vcs { query, .. } => match query {
                VcsQuery::Head | VcsQuery::TagLookup => Stage::Validating,
                VcsQuery::Clone | VcsQuery::Update => Stage::Mirroring,
                VcsQuery::Diff => Stage::Capturing,
            },
            SyncError::TagMismatch { .. } => Stage::Validating,
            SyncError::Io { stage, .. } => *stage,
            SyncError::PatchMissing { .. } | SyncError::PatchTool { .. } => Stage::Patching,
            SyncError::MirrorUnusable { .. } => Stage::Mirroring,
        }
    }

    /// Process exit status for this failure.
    pub fn exit_code(&self) -> i32 {
        match self {
            SyncError::Config(_) => EXIT_CONFIG,
            SyncError::Vcs { query, .. } => match query {
                VcsQuery::Head => EXIT_VCS_HEAD,
                VcsQuery::TagLookup => EXIT_VCS_TAG,
                VcsQuery::Clone | VcsQuery::Update => EXIT_MIRROR,
                VcsQuery::Diff => EXIT_CAPTURE,
            },
            SyncError::TagMismatch { .. } => EXIT_TAG_MISMATCH,
            SyncError::Io { stage, .. } => match stage {
                Stage::Capturing => EXIT_CAPTURE,
                Stage::Mirroring => EXIT_MIRROR,
                Stage::Patching => EXIT_PATCH_UNAVAILABLE,
                _ => EXIT_IO,
            },
            SyncError::PatchMissing { .. } | SyncError::PatchTool { .. } => EXIT_PATCH_UNAVAILABLE,
            SyncError::MirrorUnusable { .. } => EXIT_MIRROR,
        }
    }
}

/// Convenience constructor for [`SyncError::Io`].
pub(crate) fn io_err(stage: Stage, path: impl Into<PathBuf>, source: std::io::Error) -> SyncError {
    SyncError::Io {
        stage,
        path: path.into(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_failures_have_distinct_codes() {
        let head = SyncError::Vcs {
            query: VcsQuery::Head,
            repo: PathBuf::from("/sdk"),
            detail: "exit status 128".into(),
        };
        let tag = SyncError::Vcs {
            query: VcsQuery::TagLookup,
            repo: PathBuf::from("/sdk"),
            detail: "exit status 128".into(),
        };
        let mismatch = SyncError::TagMismatch {
            repo: PathBuf::from("/sdk"),
            expected: "v3.3.1".into(),
            actual: "v3.3.0".into(),
        };
        assert_eq!(head.exit_code(), 31);
        assert_eq!(tag.exit_code(), 32);
        assert_eq!(mismatch.exit_code(), 33);
        assert!(mismatch.to_string().contains("/sdk"));
        assert!(mismatch.to_string().contains("v3.3.1"));
        assert_eq!(mismatch.stage(), Stage::Validating);
    }

    #[test]
    fn io_code_depends_on_stage() {
        let err = |stage| io_err(stage, "/x", std::io::Error::other("boom"));
        assert_eq!(err(Stage::Materializing).exit_code(), 34);
        assert_eq!(err(Stage::Cleaning).exit_code(), 34);
        assert_eq!(err(Stage::Capturing).exit_code(), 37);
    }

    #[test]
    fn config_error_is_thirty() {
        let err = SyncError::from(ConfigError::InvalidVersion("x".into()));
        assert_eq!(err.exit_code(), 30);
        assert_eq!(err.stage(), Stage::VersionResolved);
    }
}
