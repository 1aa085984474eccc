//! Error types for sdkpin-core.

use std::path::PathBuf;

use thiserror::Error;

/// Everything that can go wrong before a run has a usable version and layout.
///
/// All variants are fatal and map to exit status 30: the operator has to fix
/// the declaration or the config file, there is nothing to retry.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Underlying I/O failure reading the build-info or config file.
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// `sdkpin.yaml` exists but is not valid YAML for [`crate::VendorConfig`].
    #[error("failed to parse config at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// The build-info file has no `<variable> ?= x.y.z` declaration.
    #[error("unable to find {variable} in {path}")]
    VersionNotFound { path: PathBuf, variable: String },

    /// A version string that is not `<major>.<minor>.<patch>`.
    #[error("invalid SDK version '{0}'; expected <major>.<minor>.<patch>")]
    InvalidVersion(String),

    /// The configured variable name cannot be embedded in the extraction pattern.
    #[error("invalid version pattern for '{variable}': {source}")]
    Pattern {
        variable: String,
        #[source]
        source: regex::Error,
    },
}

pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> ConfigError {
    ConfigError::Io {
        path: path.into(),
        source,
    }
}
