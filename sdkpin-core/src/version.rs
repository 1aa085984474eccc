//! Extraction of the pinned SDK version from the build-info declaration.

use std::path::Path;

use regex::Regex;

use crate::error::{io_err, ConfigError};
use crate::types::SdkVersion;

/// Find the first `<variable> ?= x.y.z` line in `contents`.
///
/// `?=`, `:=` and `=` are all accepted. Returns `None` when nothing matches.
pub fn extract(contents: &str, variable: &str) -> Result<Option<SdkVersion>, ConfigError> {
    let pattern = format!(
        r"^\s*{}\s*(?:\?=|:=|=)\s*(\d+\.\d+\.\d+)\b",
        regex::escape(variable)
    );
    let re = Regex::new(&pattern).map_err(|e| ConfigError::Pattern {
        variable: variable.to_owned(),
        source: e,
    })?;

    for line in contents.lines() {
        if let Some(caps) = re.captures(line) {
            return SdkVersion::parse(&caps[1]).map(Some);
        }
    }
    Ok(None)
}

/// Read `build_info` and resolve the declared version.
///
/// No default is ever assumed: a missing file or missing declaration is a
/// [`ConfigError`].
pub fn resolve(build_info: &Path, variable: &str) -> Result<SdkVersion, ConfigError> {
    let contents = std::fs::read_to_string(build_info).map_err(|e| io_err(build_info, e))?;
    extract(&contents, variable)?.ok_or_else(|| ConfigError::VersionNotFound {
        path: build_info.to_path_buf(),
        variable: variable.to_owned(),
    })
}
