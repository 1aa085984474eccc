//! Domain types shared by every stage of a run.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

// ---------------------------------------------------------------------------
// SdkVersion
// ---------------------------------------------------------------------------

/// A resolved `<major>.<minor>.<patch>` SDK version.
///
/// Immutable once resolved for a run. Derives the expected upstream tag and
/// the expected snapshot directory name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SdkVersion(String);

impl SdkVersion {
    /// Validate and wrap a version string.
    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        let raw = raw.trim();
        let mut parts = 0;
        for part in raw.split('.') {
            if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                return Err(ConfigError::InvalidVersion(raw.to_owned()));
            }
            parts += 1;
        }
        if parts != 3 {
            return Err(ConfigError::InvalidVersion(raw.to_owned()));
        }
        Ok(Self(raw.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `v<version>`: the tag the upstream checkout must sit on.
    pub fn tag(&self) -> String {
        format!("v{}", self.0)
    }

    /// `<prefix>-<version>`: the snapshot directory name.
    pub fn dir_name(&self, prefix: &str) -> String {
        format!("{prefix}-{}", self.0)
    }
}

impl fmt::Display for SdkVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for SdkVersion {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for SdkVersion {
    type Error = ConfigError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<SdkVersion> for String {
    fn from(v: SdkVersion) -> Self {
        v.0
    }
}

// ---------------------------------------------------------------------------
// Mode
// ---------------------------------------------------------------------------

/// What a single invocation is asked to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Validate the pinned snapshot, materialize it and apply the patch.
    #[default]
    Consume,
    /// Remove the materialized destination and stop.
    Clean,
    /// Refresh the mirror and regenerate the patch from it.
    ///
    /// With `dry_run` the stored patch is left alone and the caller gets a
    /// diff of what would change instead.
    Capture { dry_run: bool },
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Consume => write!(f, "consume"),
            Mode::Clean => write!(f, "clean"),
            Mode::Capture { dry_run: false } => write!(f, "capture"),
            Mode::Capture { dry_run: true } => write!(f, "capture (dry-run)"),
        }
    }
}

// ---------------------------------------------------------------------------
// Stage
// ---------------------------------------------------------------------------

/// Position of a run in the sync state machine.
///
/// `Idle → VersionResolved → {Cleaning | Validating → Materializing → Patching
/// | Mirroring → Capturing} → Done | Failed`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Idle,
    VersionResolved,
    Cleaning,
    Validating,
    Materializing,
    Patching,
    Mirroring,
    Capturing,
    Done,
    Failed,
}

impl Stage {
    /// Terminal stages end the run.
    pub fn is_terminal(self) -> bool {
        matches!(self, Stage::Done | Stage::Failed)
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Stage::Idle => "idle",
            Stage::VersionResolved => "version",
            Stage::Cleaning => "cleaning",
            Stage::Validating => "validating",
            Stage::Materializing => "materializing",
            Stage::Patching => "patching",
            Stage::Mirroring => "mirroring",
            Stage::Capturing => "capturing",
            Stage::Done => "done",
            Stage::Failed => "failed",
        };
        f.write_str(s)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_and_dir_name_are_derived_verbatim() {
        let v = SdkVersion::parse("3.3.1").expect("parse");
        assert_eq!(v.tag(), "v3.3.1");
        assert_eq!(v.dir_name("WICED-SDK"), "WICED-SDK-3.3.1");
    }

    #[test]
    fn rejects_non_numeric_and_short_versions() {
        for raw in ["3.3", "3.3.1.0", "v3.3.1", "3.x.1", "", "3..1"] {
            assert!(
                matches!(SdkVersion::parse(raw), Err(ConfigError::InvalidVersion(_))),
                "expected rejection of {raw:?}"
            );
        }
    }

    #[test]
    fn version_serializes_as_plain_string() {
        let v = SdkVersion::parse("10.0.22").unwrap();
        let yaml = serde_yaml::to_string(&v).unwrap();
        assert_eq!(yaml.trim(), "10.0.22");
        let back: SdkVersion = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(back, v);
    }

    #[test]
    fn mode_defaults_to_consume() {
        assert_eq!(Mode::default(), Mode::Consume);
        assert_eq!(Mode::Capture { dry_run: true }.to_string(), "capture (dry-run)");
    }

    #[test]
    fn only_done_and_failed_are_terminal() {
        assert!(Stage::Done.is_terminal());
        assert!(Stage::Failed.is_terminal());
        assert!(!Stage::Patching.is_terminal());
    }
}
