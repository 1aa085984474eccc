//! Boundary to the external `git` and `patch` executables.
//!
//! Everything that spawns a process goes through [`ExternalTools`] so the
//! stage logic can be driven by a scripted fake in tests.

use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// Captured result of an external command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolOutput {
    /// Exit code; `None` when the process was killed by a signal.
    pub code: Option<i32>,
    pub stdout: Vec<u8>,
    pub stderr: String,
}

impl ToolOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    pub fn stdout_text(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }

    /// One-line failure summary for diagnostics.
    pub fn failure_detail(&self) -> String {
        let status = match self.code {
            Some(code) => format!("exit status {code}"),
            None => "terminated by signal".to_string(),
        };
        let stderr = self.stderr.trim();
        if stderr.is_empty() {
            status
        } else {
            format!("{status}: {stderr}")
        }
    }
}

/// Capability interface for version-control and patch tooling.
pub trait ExternalTools {
    /// Run a version-control command with `dir` as working directory.
    fn run_vcs(&self, dir: &Path, args: &[&str]) -> io::Result<ToolOutput>;

    /// Apply `patch` inside `target_dir`, stripping `strip` leading path
    /// components. Returns the tool's exit code verbatim.
    fn apply_patch(&self, patch: &Path, target_dir: &Path, strip: u32) -> io::Result<Option<i32>>;

    /// Unified diff of the working tree of `repo` against `base_ref`,
    /// including files that are not tracked yet.
    fn generate_diff(&self, repo: &Path, base_ref: &str) -> io::Result<ToolOutput>;
}

/// Output options shared by every diff `sdkpin` generates.
const DIFF_FORMAT: [&str; 4] = ["--no-color", "--no-ext-diff", "--src-prefix=a/", "--dst-prefix=b/"];

/// [`ExternalTools`] backed by `git` and `patch` on `PATH`.
#[derive(Debug, Clone)]
pub struct SystemTools {
    pub git: PathBuf,
    pub patch: PathBuf,
}

impl Default for SystemTools {
    fn default() -> Self {
        Self {
            git: PathBuf::from("git"),
            patch: PathBuf::from("patch"),
        }
    }
}

impl ExternalTools for SystemTools {
    fn run_vcs(&self, dir: &Path, args: &[&str]) -> io::Result<ToolOutput> {
        tracing::debug!("git {} (in {})", args.join(" "), dir.display());
        let output = Command::new(&self.git)
            .args(args)
            .current_dir(dir)
            .output()?;
        Ok(ToolOutput {
            code: output.status.code(),
            stdout: output.stdout,
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }

    fn apply_patch(&self, patch: &Path, target_dir: &Path, strip: u32) -> io::Result<Option<i32>> {
        tracing::debug!(
            "patch -p{strip} -i {} (in {})",
            patch.display(),
            target_dir.display()
        );
        // stdout/stderr are inherited so operators see hunk offsets and rejects.
        let status = Command::new(&self.patch)
            .arg(format!("-p{strip}"))
            .arg("-i")
            .arg(patch)
            .current_dir(target_dir)
            .stdin(Stdio::null())
            .status()?;
        Ok(status.code())
    }

    fn generate_diff(&self, repo: &Path, base_ref: &str) -> io::Result<ToolOutput> {
        let mut args = vec!["diff"];
        args.extend(DIFF_FORMAT);
        args.push(base_ref);
        let mut tracked = self.run_vcs(repo, &args)?;
        if !tracked.success() {
            return Ok(tracked);
        }

        // Untracked files are diffed against /dev/null one by one; the index
        // is left as the operator had it.
        let listed = self.run_vcs(repo, &["ls-files", "--others", "--exclude-standard", "-z"])?;
        if !listed.success() {
            return Ok(listed);
        }
        for name in listed.stdout.split(|b| *b == 0).filter(|n| !n.is_empty()) {
            let name = String::from_utf8_lossy(name);
            let mut args = vec!["diff", "--no-index"];
            args.extend(DIFF_FORMAT);
            args.extend(["--", "/dev/null", &*name]);
            let added = self.run_vcs(repo, &args)?;
            // --no-index exits 1 when the inputs differ.
            if !matches!(added.code, Some(0) | Some(1)) {
                return Ok(added);
            }
            tracked.stdout.extend_from_slice(&added.stdout);
        }
        Ok(tracked)
    }
}

// ---------------------------------------------------------------------------
// Scripted fake
// ---------------------------------------------------------------------------
