//! Config error-message and version-resolution integration tests.

use assert_fs::prelude::*;
use predicates::prelude::predicate;
use sdkpin_core::{config, version, ConfigError, SdkVersion};

// ---------------------------------------------------------------------------
// 1. Config load errors
// ---------------------------------------------------------------------------

#[test]
fn corrupt_config_returns_parse_error_with_path() {
    let root = assert_fs::TempDir::new().expect("tempdir");
    root.child("sdkpin.yaml")
        .write_str(": : corrupt : yaml : !!!\n  - broken: [unclosed")
        .expect("write");

    let err = config::load_at(root.path()).unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }), "got: {err}");
    assert!(err.to_string().contains("sdkpin.yaml"), "got: {err}");
}

#[test]
fn unknown_config_key_is_rejected() {
    let root = assert_fs::TempDir::new().expect("tempdir");
    root.child("sdkpin.yaml")
        .write_str("patch_file: typo.patch\n")
        .expect("write");

    let err = config::load_at(root.path()).unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }), "got: {err}");
}

#[test]
fn empty_config_file_is_defaults() {
    let root = assert_fs::TempDir::new().expect("tempdir");
    root.child("sdkpin.yaml").touch().expect("touch");
    let cfg = config::load_at(root.path()).expect("load");
    assert_eq!(cfg, config::VendorConfig::default());
}

// ---------------------------------------------------------------------------
// 2. Version resolution
// ---------------------------------------------------------------------------

#[test]
fn resolves_version_from_layout_build_info() {
    let root = assert_fs::TempDir::new().expect("tempdir");
    root.child("module_build_info")
        .write_str("VERSION = 1.0.0\nDEPENDENT_MODULES = lib_xassert\nWICED_SDK_VERSION ?= 3.3.1\n")
        .expect("write");

    let layout = config::layout_at(root.path()).expect("layout");
    root.child("module_build_info").assert(predicate::path::exists());

    let v = version::resolve(&layout.build_info, &layout.version_variable).expect("resolve");
    assert_eq!(v, SdkVersion::parse("3.3.1").unwrap());
    assert_eq!(v.tag(), "v3.3.1");
}

#[test]
fn missing_declaration_names_file_and_variable() {
    let root = assert_fs::TempDir::new().expect("tempdir");
    root.child("module_build_info")
        .write_str("VERSION = 1.0.0\n")
        .expect("write");

    let layout = config::layout_at(root.path()).expect("layout");
    let err = version::resolve(&layout.build_info, &layout.version_variable).unwrap_err();
    assert!(matches!(err, ConfigError::VersionNotFound { .. }), "got: {err}");
    let msg = err.to_string();
    assert!(msg.contains("WICED_SDK_VERSION"), "got: {msg}");
    assert!(msg.contains("module_build_info"), "got: {msg}");
}

#[test]
fn missing_build_info_is_io_error() {
    let root = assert_fs::TempDir::new().expect("tempdir");
    let layout = config::layout_at(root.path()).expect("layout");
    let err = version::resolve(&layout.build_info, &layout.version_variable).unwrap_err();
    assert!(matches!(err, ConfigError::Io { .. }), "got: {err}");
}

#[test]
fn custom_variable_from_config_is_honoured() {
    let root = assert_fs::TempDir::new().expect("tempdir");
    root.child("sdkpin.yaml")
        .write_str("version_variable: ACME_SDK_VERSION\nbuild_info: build/info.mk\n")
        .expect("write");
    root.child("build/info.mk")
        .write_str("WICED_SDK_VERSION ?= 1.1.1\nACME_SDK_VERSION := 2.0.4\n")
        .expect("write");

    let layout = config::layout_at(root.path()).expect("layout");
    let v = version::resolve(&layout.build_info, &layout.version_variable).expect("resolve");
    assert_eq!(v.as_str(), "2.0.4");
}
