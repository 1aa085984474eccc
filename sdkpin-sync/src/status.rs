//! Read-only report of the synchronized state under a vendoring root.

use std::path::PathBuf;

use serde::Serialize;

use sdkpin_core::{version, VendorLayout};

use crate::patch::{self, PatchDigest};
use crate::tag;
use crate::tools::ExternalTools;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusReport {
    pub root: PathBuf,
    /// Declared SDK version, if it could be resolved.
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version_error: Option<String>,
    pub upstream: UpstreamStatus,
    pub destination: PathStatus,
    pub mirror: MirrorStatus,
    pub patch: PatchFileStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpstreamStatus {
    pub repo: PathBuf,
    pub expected_tag: Option<String>,
    pub checked_out_tag: Option<String>,
    pub tag_matches: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PathStatus {
    pub path: Option<PathBuf>,
    pub present: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MirrorStatus {
    pub path: PathBuf,
    pub present: bool,
    pub working_copy: bool,
    pub remote: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PatchFileStatus {
    pub path: PathBuf,
    #[serde(flatten)]
    pub digest: Option<PatchDigest>,
}

/// Gather a [`StatusReport`]. Never fails: problems are recorded in the report.
pub fn collect(layout: &VendorLayout, tools: &dyn ExternalTools) -> StatusReport {
    let resolved = version::resolve(&layout.build_info, &layout.version_variable);
    let (version, version_error) = match resolved {
        Ok(v) => (Some(v), None),
        Err(e) => (None, Some(e.to_string())),
    };

    let upstream = {
        let (checked_out_tag, error) = if layout.upstream_repo.exists() {
            match tag::current_tag(tools, &layout.upstream_repo) {
                Ok(t) => (t, None),
                Err(e) => (None, Some(e.to_string())),
            }
        } else {
            (None, Some("repository not found".to_string()))
        };
        let expected_tag = version.as_ref().map(|v| v.tag());
        let tag_matches = match (&expected_tag, &checked_out_tag, &error) {
            (Some(expected), Some(actual), None) => Some(expected == actual),
            (Some(_), None, None) => Some(false),
            _ => None,
        };
        UpstreamStatus {
            repo: layout.upstream_repo.clone(),
            expected_tag,
            checked_out_tag,
            tag_matches,
            error,
        }
    };

    let destination = match &version {
        Some(v) => {
            let path = layout.destination_dir(v);
            PathStatus {
                present: path.is_dir(),
                path: Some(path),
            }
        }
        None => PathStatus {
            path: None,
            present: false,
        },
    };

    let mirror = MirrorStatus {
        path: layout.mirror_path.clone(),
        present: layout.mirror_path.is_dir(),
        working_copy: layout.mirror_path.join(".git").exists(),
        remote: layout.mirror_remote.clone(),
    };

    let digest = match patch::digest(&layout.patch) {
        Ok(d) => d,
        Err(e) => {
            tracing::warn!("{e}");
            None
        }
    };

    StatusReport {
        root: layout.root.clone(),
        version: version.map(|v| v.to_string()),
        version_error,
        upstream,
        destination,
        mirror,
        patch: PatchFileStatus {
            path: layout.patch.clone(),
            digest,
        },
    }
}
