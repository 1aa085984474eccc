//! The stored compatibility patch: apply on consume, regenerate on capture.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use sha2::{Digest, Sha256};
use similar::TextDiff;

use sdkpin_core::Stage;

use crate::error::{io_err, SyncError, VcsQuery};
use crate::tools::ExternalTools;

/// Exit code `patch` uses for serious trouble; also used when it dies by signal.
const TROUBLE: i32 = 2;

/// Result of applying the patch, carrying the tool's code verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PatchStatus {
    /// Every hunk applied exactly.
    Clean,
    /// Applied, but some hunks needed offset or fuzz.
    Fuzzy,
    /// Exited 1 and left this many `*.rej` files behind.
    Rejected(usize),
    /// The tool reported trouble (status 2 or above) or died.
    Failed(i32),
}

impl PatchStatus {
    pub fn from_code(code: Option<i32>) -> Self {
        match code {
            Some(0) => PatchStatus::Clean,
            Some(1) => PatchStatus::Fuzzy,
            Some(other) => PatchStatus::Failed(other),
            None => PatchStatus::Failed(TROUBLE),
        }
    }

    /// The exit code to propagate as the run's status.
    pub fn code(self) -> i32 {
        match self {
            PatchStatus::Clean => 0,
            PatchStatus::Fuzzy | PatchStatus::Rejected(_) => 1,
            PatchStatus::Failed(code) => code,
        }
    }
}

/// Size and SHA-256 of a stored patch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PatchDigest {
    pub bytes: u64,
    pub sha256: String,
}

/// Apply `patch` inside `target_dir`.
pub fn apply(
    tools: &dyn ExternalTools,
    patch: &Path,
    target_dir: &Path,
    strip: u32,
) -> Result<PatchStatus, SyncError> {
    if !patch.is_file() {
        return Err(SyncError::PatchMissing {
            path: patch.to_path_buf(),
        });
    }
    tracing::info!("applying {} in {}", patch.display(), target_dir.display());
    let code = tools
        .apply_patch(patch, target_dir, strip)
        .map_err(|e| SyncError::PatchTool { source: e })?;
    let status = PatchStatus::from_code(code);
    match status {
        PatchStatus::Clean => tracing::info!("patch applied cleanly"),
        PatchStatus::Fuzzy | PatchStatus::Rejected(_) => tracing::debug!("patch exited with status 1"),
        PatchStatus::Failed(code) => tracing::error!("patch failed (status {code}); destination is partially patched"),
    }
    Ok(status)
}

/// Tell fuzz apart from rejected hunks after a status-1 apply.
///
/// `patch` exits 1 in both cases; only the `*.rej` files it leaves under
/// `snapshot` distinguish them. Other statuses are returned unchanged.
pub fn classify(status: PatchStatus, snapshot: &Path) -> PatchStatus {
    if status != PatchStatus::Fuzzy {
        return status;
    }
    let found = rejects(snapshot);
    if found.is_empty() {
        tracing::warn!("patch applied with offsets or fuzz; review the result");
        return status;
    }
    for path in &found {
        tracing::error!("rejected hunks saved to {}", path.display());
    }
    PatchStatus::Rejected(found.len())
}

/// Every `*.rej` file under `dir`, sorted. Unreadable entries are skipped.
pub fn rejects(dir: &Path) -> Vec<PathBuf> {
    let mut found = Vec::new();
    collect_rejects(dir, &mut found);
    found.sort();
    found
}

fn collect_rejects(dir: &Path, found: &mut Vec<PathBuf>) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        match entry.file_type() {
            Ok(ft) if ft.is_dir() => collect_rejects(&path, found),
            Ok(_) if path.extension().is_some_and(|ext| ext == "rej") => found.push(path),
            _ => {}
        }
    }
}

/// Diff the working copy `repo` against `base_ref`.
pub fn generate(tools: &dyn ExternalTools, repo: &Path, base_ref: &str) -> Result<Vec<u8>, SyncError> {
    let vcs_err = |detail: String| SyncError::Vcs {
        query: VcsQuery::Diff,
        repo: repo.to_path_buf(),
        detail,
    };
    let out = tools
        .generate_diff(repo, base_ref)
        .map_err(|e| vcs_err(format!("failed to run git: {e}")))?;
    if !out.success() {
        return Err(vcs_err(out.failure_detail()));
    }
    Ok(out.stdout)
}

/// Overwrite `path` with `contents`, creating parent directories.
///
/// The handle is dropped on every path out of this function.
pub fn write(path: &Path, contents: &[u8]) -> Result<(), SyncError> {
    let stage = Stage::Capturing;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| io_err(stage, parent, e))?;
    }
    let mut file = fs::File::create(path).map_err(|e| io_err(stage, path, e))?;
    file.write_all(contents).map_err(|e| io_err(stage, path, e))?;
    file.flush().map_err(|e| io_err(stage, path, e))?;
    Ok(())
}

/// Current contents of the stored patch, empty if it does not exist yet.
pub fn read_existing(path: &Path) -> Result<Vec<u8>, SyncError> {
    match fs::read(path) {
        Ok(bytes) => Ok(bytes),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(Vec::new()),
        Err(err) => Err(io_err(Stage::Capturing, path, err)),
    }
}

/// Unified diff between the stored patch and a freshly generated one.
///
/// Empty when nothing would change.
pub fn preview(path: &Path, stored: &[u8], fresh: &[u8]) -> String {
    if stored == fresh {
        return String::new();
    }
    let stored = String::from_utf8_lossy(stored);
    let fresh = String::from_utf8_lossy(fresh);
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    TextDiff::from_lines(&*stored, &*fresh)
        .unified_diff()
        .header(&format!("a/{name}"), &format!("b/{name}"))
        .context_radius(3)
        .to_string()
}

/// Size and digest of the stored patch, `None` if absent.
pub fn digest(path: &Path) -> Result<Option<PatchDigest>, SyncError> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(io_err(Stage::Idle, path, err)),
    };
    let mut h = Sha256::new();
    h.update(&bytes);
    Ok(Some(PatchDigest {
        bytes: bytes.len() as u64,
        sha256: hex::encode(h.finalize()),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::fake::{fail, ok, ScriptedTools};
    use tempfile::TempDir;

    const DIFF: &str = "diff --git a/WICED-SDK-3.3.1/wwd.c b/WICED-SDK-3.3.1/wwd.c\n\
                        --- a/WICED-SDK-3.3.1/wwd.c\n\
                        +++ b/WICED-SDK-3.3.1/wwd.c\n\
                        @@ -1 +1 @@\n\
                        -int x;\n\
                        +int x = 0;\n";

    #[test]
    fn status_codes_pass_through() {
        assert_eq!(PatchStatus::from_code(Some(0)), PatchStatus::Clean);
        assert_eq!(PatchStatus::from_code(Some(1)).code(), 1);
        assert_eq!(PatchStatus::from_code(Some(2)), PatchStatus::Failed(2));
        assert_eq!(PatchStatus::from_code(None).code(), 2);
    }

    #[test]
    fn apply_requires_patch_file() {
        let tmp = TempDir::new().unwrap();
        let tools = ScriptedTools::new();
        let err = apply(&tools, &tmp.path().join("missing.patch"), tmp.path(), 1).unwrap_err();
        assert_eq!(err.exit_code(), 35);
        assert!(tools.calls().is_empty());
    }

    #[test]
    fn apply_uses_strip_level() {
        let tmp = TempDir::new().unwrap();
        let patch = tmp.path().join("compat.patch");
        fs::write(&patch, DIFF).unwrap();
        let tools = ScriptedTools::new().patch(Ok(Some(1)));

        let status = apply(&tools, &patch, tmp.path(), 1).expect("apply");
        assert_eq!(status, PatchStatus::Fuzzy);
        assert!(tools.calls()[0].starts_with("patch -p1 -i "));
    }

    #[test]
    fn status_one_without_rejects_stays_fuzzy() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("wwd.c"), "int x = 0;\n").unwrap();
        fs::write(tmp.path().join("wwd.c.orig"), "int x;\n").unwrap();
        assert_eq!(classify(PatchStatus::Fuzzy, tmp.path()), PatchStatus::Fuzzy);
    }

    #[test]
    fn status_one_with_rejects_is_rejected() {
        let tmp = TempDir::new().unwrap();
        let nested = tmp.path().join("WICED/platform");
        fs::create_dir_all(&nested).unwrap();
        fs::write(tmp.path().join("wwd.c.rej"), "@@ -1 +1 @@\n").unwrap();
        fs::write(nested.join("bus.c.rej"), "@@ -1 +1 @@\n").unwrap();

        let status = classify(PatchStatus::Fuzzy, tmp.path());
        assert_eq!(status, PatchStatus::Rejected(2));
        assert_eq!(status.code(), 1);
        assert_eq!(
            rejects(tmp.path()),
            vec![nested.join("bus.c.rej"), tmp.path().join("wwd.c.rej")]
        );
    }

    #[test]
    fn classify_leaves_other_statuses_alone() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("wwd.c.rej"), "").unwrap();
        assert_eq!(classify(PatchStatus::Clean, tmp.path()), PatchStatus::Clean);
        assert_eq!(classify(PatchStatus::Failed(2), tmp.path()), PatchStatus::Failed(2));
    }

    #[test]
    fn write_truncates_previous_contents() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("nested/compat.patch");
        write(&path, b"a much longer previous patch body\n").unwrap();
        write(&path, b"short\n").unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"short\n");
    }

    #[test]
    fn generate_failure_is_capture_error() {
        let tools = ScriptedTools::new().diff(fail(128, "fatal: bad revision 'v9.9.9'"));
        let err = generate(&tools, Path::new("/mirror"), "v9.9.9").unwrap_err();
        assert_eq!(err.exit_code(), 37);
        assert!(err.to_string().contains("bad revision"));
    }

    #[test]
    fn generate_returns_stdout_bytes() {
        let tools = ScriptedTools::new().diff(ok(DIFF));
        let bytes = generate(&tools, Path::new("/mirror"), "v3.3.1").unwrap();
        assert_eq!(bytes, DIFF.as_bytes());
    }

    #[test]
    fn preview_is_empty_when_unchanged() {
        let path = Path::new("compat.patch");
        assert!(preview(path, DIFF.as_bytes(), DIFF.as_bytes()).is_empty());
        let shown = preview(path, b"", DIFF.as_bytes());
        assert!(shown.contains("--- a/compat.patch"));
        assert!(shown.contains("+int x = 0;"));
    }

    #[test]
    fn digest_reports_size_and_sha() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("compat.patch");
        assert!(digest(&path).unwrap().is_none());
        fs::write(&path, "").unwrap();
        let d = digest(&path).unwrap().expect("present");
        assert_eq!(d.bytes, 0);
        assert_eq!(
            d.sha256,
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }
}
