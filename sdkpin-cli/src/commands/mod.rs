//! One module per subcommand. Each returns the process exit status.

pub mod capture;
pub mod clean;
pub mod consume;
pub mod status;

use std::path::PathBuf;

use anyhow::{Context, Result};

use sdkpin_core::{config, VendorLayout};
use sdkpin_sync::SyncError;

/// Resolve the vendoring root (default: current directory) and its layout.
pub fn load_layout(root: Option<PathBuf>) -> Result<VendorLayout> {
    let root = match root {
        Some(root) => root,
        None => std::env::current_dir().context("could not determine current directory")?,
    };
    let root = root
        .canonicalize()
        .with_context(|| format!("cannot resolve root '{}'", root.display()))?;
    config::layout_at(&root).map_err(|e| SyncError::from(e).into())
}
