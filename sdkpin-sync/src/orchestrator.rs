//! The sync state machine.
//!
//! ```text
//! Idle → VersionResolved ─┬─ clean ───→ Cleaning ─────────────────────────────→ Done
//!                         ├─ consume ─→ Validating → Materializing → Patching → Done
//!                         └─ capture ─→ Mirroring → Capturing ──────────────────→ Done
//!                                   (any fatal error) ─────────────────────────→ Failed
//! ```
//!
//! Nothing persists between runs except the filesystem artifacts themselves;
//! every invocation re-derives its starting point from them.

use std::path::PathBuf;

use sdkpin_core::{version, Mode, SdkVersion, Stage, VendorLayout};

use crate::dirsync;
use crate::error::SyncError;
use crate::mirror::{self, MirrorReport};
use crate::patch::{self, PatchStatus};
use crate::tools::ExternalTools;

/// How a run that reached `Done` ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Cleaned {
        destination: PathBuf,
        removed: bool,
    },
    Consumed {
        destination: PathBuf,
        files: u64,
        patch: PatchStatus,
    },
    Captured {
        patch: PathBuf,
        bytes: usize,
        changed: bool,
        mirror: MirrorReport,
    },
    /// Capture dry-run: what the stored patch would become.
    Previewed {
        patch: PathBuf,
        diff: String,
        mirror: MirrorReport,
    },
}

impl RunOutcome {
    /// Process exit status. Consume propagates the patch tool's code verbatim.
    pub fn exit_code(&self) -> i32 {
        match self {
            RunOutcome::Consumed { patch, .. } => patch.code(),
            _ => 0,
        }
    }
}

/// Drives one invocation through the state machine.
pub struct Orchestrator<'a> {
    layout: &'a VendorLayout,
    tools: &'a dyn ExternalTools,
    stage: Stage,
}

impl<'a> Orchestrator<'a> {
    pub fn new(layout: &'a VendorLayout, tools: &'a dyn ExternalTools) -> Self {
        Self {
            layout,
            tools,
            stage: Stage::Idle,
        }
    }

    /// Current (or, after `run`, final) stage.
    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Resolve the version from the build-info file and run `mode`.
    pub fn run(&mut self, mode: Mode) -> Result<RunOutcome, SyncError> {
        let resolved = version::resolve(&self.layout.build_info, &self.layout.version_variable);
        let version = match resolved {
            Ok(v) => v,
            Err(e) => return self.fail(e.into()),
        };
        self.run_resolved(&version, mode)
    }

    /// Run `mode` for an already-resolved version.
    pub fn run_resolved(&mut self, version: &SdkVersion, mode: Mode) -> Result<RunOutcome, SyncError> {
        self.enter(Stage::VersionResolved);
        tracing::info!("{mode} for SDK {version}");
        let result = match mode {
            Mode::Clean => self.clean(version),
            Mode::Consume => self.consume(version),
            Mode::Capture { dry_run } => self.capture(version, dry_run),
        };
        match result {
            Ok(outcome) => {
                self.enter(Stage::Done);
                Ok(outcome)
            }
            Err(e) => self.fail(e),
        }
    }

    fn clean(&mut self, version: &SdkVersion) -> Result<RunOutcome, SyncError> {
        self.enter(Stage::Cleaning);
        let destination = self.layout.destination_dir(version);
        let removed = dirsync::teardown(&destination)?;
        Ok(RunOutcome::Cleaned {
            destination,
            removed,
        })
    }

    fn consume(&mut self, version: &SdkVersion) -> Result<RunOutcome, SyncError> {
        self.enter(Stage::Validating);
        crate::tag::validate(self.tools, &self.layout.upstream_repo, version)?;

        self.enter(Stage::Materializing);
        let source = self.layout.source_dir(version);
        let destination = self.layout.destination_dir(version);
        let files = dirsync::materialize(&source, &destination)?;

        self.enter(Stage::Patching);
        let status = patch::apply(
            self.tools,
            &self.layout.patch,
            &self.layout.destination_root,
            self.layout.strip,
        )?;
        let status = patch::classify(status, &destination);

        Ok(RunOutcome::Consumed {
            destination,
            files,
            patch: status,
        })
    }

    fn capture(&mut self, version: &SdkVersion, dry_run: bool) -> Result<RunOutcome, SyncError> {
        let layout = self.layout;
        self.enter(Stage::Mirroring);
        let mirror_path = &layout.mirror_path;
        let report = mirror::ensure(self.tools, mirror_path, layout.mirror_remote.as_deref());
        if !report.refreshed() {
            tracing::warn!("continuing with existing mirror state at {}", mirror_path.display());
        }
        mirror::verify(mirror_path)?;

        self.enter(Stage::Capturing);
        let fresh = patch::generate(self.tools, mirror_path, &version.tag())?;
        let stored = patch::read_existing(&layout.patch)?;
        let patch_path = layout.patch.clone();

        if dry_run {
            let diff = patch::preview(&patch_path, &stored, &fresh);
            return Ok(RunOutcome::Previewed {
                patch: patch_path,
                diff,
                mirror: report,
            });
        }

        patch::write(&patch_path, &fresh)?;
        tracing::info!("wrote {} ({} bytes)", patch_path.display(), fresh.len());
        Ok(RunOutcome::Captured {
            patch: patch_path,
            bytes: fresh.len(),
            changed: stored != fresh,
            mirror: report,
        })
    }

    fn enter(&mut self, next: Stage) {
        tracing::debug!("stage {} -> {}", self.stage, next);
        self.stage = next;
    }

    fn fail(&mut self, err: SyncError) -> Result<RunOutcome, SyncError> {
        tracing::debug!("stage {} failed: {err}", self.stage);
        self.stage = Stage::Failed;
        Err(err)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
