//! sdkpin core library: domain types, layout config, version resolution, errors.
//!
//! - [`types`]: [`SdkVersion`], [`Mode`], [`Stage`]
//! - [`config`]: `sdkpin.yaml` load / resolve into a [`VendorLayout`]
//! - [`version`]: build-info version extraction
//! - [`error`]: [`ConfigError`]

pub mod config;
pub mod error;
pub mod types;
pub mod version;

pub use config::{VendorConfig, VendorLayout};
pub use error::ConfigError;
pub use types::{Mode, SdkVersion, Stage};
