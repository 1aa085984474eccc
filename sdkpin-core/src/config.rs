//! Vendoring layout configuration.
//!
//! # Storage layout
//!
//! ```text
//! <root>/
//!   sdkpin.yaml                       (optional: every field has a default)
//!   module_build_info                 (declares WICED_SDK_VERSION ?= x.y.z)
//!   src/broadcom_wiced/sdk/
//!     xcore_compat.patch              (the stored patch)
//!     WICED-SDK-<version>/            (materialized destination)
//! <root>/../../lib_broadcom_wiced_sdk/
//!   WICED-SDK-<version>/              (pinned upstream snapshot)
//! ```
//!
//! # API pattern
//!
//! Loading takes the vendoring root explicitly (`load_at(root)`); nothing
//! here consults the process working directory.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{io_err, ConfigError};
use crate::types::SdkVersion;

/// File name looked up under the vendoring root.
pub const CONFIG_FILE: &str = "sdkpin.yaml";

// ---------------------------------------------------------------------------
// 1. On-disk config
// ---------------------------------------------------------------------------

/// Contents of `sdkpin.yaml`. Relative paths are relative to the vendoring root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VendorConfig {
    pub build_info: PathBuf,
    pub version_variable: String,
    pub sdk_prefix: String,
    pub upstream_repo: PathBuf,
    pub destination_root: PathBuf,
    pub patch: PathBuf,
    pub mirror_path: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mirror_remote: Option<String>,
    pub strip: u32,
}

impl Default for VendorConfig {
    fn default() -> Self {
        Self {
            build_info: PathBuf::from("module_build_info"),
            version_variable: "WICED_SDK_VERSION".to_string(),
            sdk_prefix: "WICED-SDK".to_string(),
            upstream_repo: PathBuf::from("../../lib_broadcom_wiced_sdk"),
            destination_root: PathBuf::from("src/broadcom_wiced/sdk"),
            patch: PathBuf::from("src/broadcom_wiced/sdk/xcore_compat.patch"),
            mirror_path: PathBuf::from("../../lib_broadcom_wiced_sdk"),
            mirror_remote: None,
            strip: 1,
        }
    }
}

impl VendorConfig {
    /// Anchor every relative path at `root`.
    pub fn resolve(self, root: &Path) -> VendorLayout {
        let anchor = |p: PathBuf| if p.is_absolute() { p } else { root.join(p) };
        VendorLayout {
            root: root.to_path_buf(),
            build_info: anchor(self.build_info),
            version_variable: self.version_variable,
            sdk_prefix: self.sdk_prefix,
            upstream_repo: anchor(self.upstream_repo),
            destination_root: anchor(self.destination_root),
            patch: anchor(self.patch),
            mirror_path: anchor(self.mirror_path),
            mirror_remote: self.mirror_remote,
            strip: self.strip,
        }
    }
}

/// `<root>/sdkpin.yaml`: pure, no I/O.
pub fn config_path_at(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE)
}

/// Load `<root>/sdkpin.yaml`, falling back to defaults when it is absent.
///
/// Returns `ConfigError::Parse` (with path) if the file is malformed.
pub fn load_at(root: &Path) -> Result<VendorConfig, ConfigError> {
    let path = config_path_at(root);
    if !path.exists() {
        return Ok(VendorConfig::default());
    }
    let contents = std::fs::read_to_string(&path).map_err(|e| io_err(&path, e))?;
    if contents.trim().is_empty() {
        return Ok(VendorConfig::default());
    }
    serde_yaml::from_str(&contents).map_err(|e| ConfigError::Parse { path, source: e })
}

/// Load and resolve in one step.
pub fn layout_at(root: &Path) -> Result<VendorLayout, ConfigError> {
    Ok(load_at(root)?.resolve(root))
}

// ---------------------------------------------------------------------------
// 2. Resolved layout
// ---------------------------------------------------------------------------

/// Absolute paths for one vendoring root, threaded through every stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VendorLayout {
    pub root: PathBuf,
    pub build_info: PathBuf,
    pub version_variable: String,
    pub sdk_prefix: String,
    pub upstream_repo: PathBuf,
    pub destination_root: PathBuf,
    pub patch: PathBuf,
    pub mirror_path: PathBuf,
    pub mirror_remote: Option<String>,
    pub strip: u32,
}

impl VendorLayout {
    /// Pinned snapshot inside the upstream repository.
    pub fn source_dir(&self, version: &SdkVersion) -> PathBuf {
        self.upstream_repo.join(version.dir_name(&self.sdk_prefix))
    }

    /// Materialized, patched copy consumed by downstream builds.
    pub fn destination_dir(&self, version: &SdkVersion) -> PathBuf {
        self.destination_root.join(version.dir_name(&self.sdk_prefix))
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
