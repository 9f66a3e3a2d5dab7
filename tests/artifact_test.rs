//! Tests for package file conventions, artifact classification and the
//! workspace configuration

mod common;

use std::path::Path;

use assert_fs::prelude::*;
use common::TestWorkspace;
use debforge::config::{DebforgeConfig, CONFIG_FILE_NAME};
use debforge::core::artifact::{canonical_name, find_debug_package, find_dev_package, is_core_deb, DebArtifact};
use debforge::core::manifest_map::{ArtifactClassifier, ManifestMap};
use debforge::error::ArtifactError;
use debforge::infra::dirs::{DebforgeDirs, WorkspaceLayout};
use debforge::infra::sbuild::{SbuildBuilder, SbuildConfig};
use predicates::prelude::*;

fn files(names: &[&str]) -> Vec<String> {
    names.iter().map(ToString::to_string).collect()
}

// ============================================
// Unit Tests - File name conventions
// ============================================

#[test]
fn test_canonical_name_and_core_packages() {
    assert_eq!(canonical_name("libfoo1_1.2.3-1_arm64.deb"), "libfoo1");
    assert!(is_core_deb("libfoo1_1.2.3-1_arm64.deb"));
    assert!(!is_core_deb("libfoo-dev_1.2.3-1_arm64.deb"));
    assert!(!is_core_deb("libfoo1-dbgsym_1.2.3-1_arm64.ddeb"));
    assert!(!is_core_deb("libfoo_1.2.3-1.dsc"));
}

#[test]
fn test_parse_debug_package() {
    let ddeb = DebArtifact::parse("libfoo1-dbgsym_1.2.3-1_arm64.ddeb").unwrap();
    assert!(ddeb.is_debug());
    assert_eq!(ddeb.version, "1.2.3-1");
    assert_eq!(ddeb.arch.as_deref(), Some("arm64"));
    assert!(!ddeb.is_dev());
    assert!(DebArtifact::parse("libfoo-dev_1.2.3-1_arm64.deb").unwrap().is_dev());
    assert!(DebArtifact::parse("README").is_err());
}

#[test]
fn test_companions_found_by_soversion_less_name() {
    let repo = files(&[
        "libfoo1_1.2.3_arm64.deb",
        "libfoo-dev_1.2.3_arm64.deb",
        "libfoo1-dbgsym_1.2.3_arm64.ddeb",
        "libbar2_0.1.0_arm64.deb",
    ]);

    assert_eq!(
        find_dev_package(&repo, "libfoo1").unwrap().as_deref(),
        Some("libfoo-dev_1.2.3_arm64.deb")
    );
    assert_eq!(
        find_debug_package(&repo, "libfoo1").unwrap().as_deref(),
        Some("libfoo1-dbgsym_1.2.3_arm64.ddeb")
    );
    assert_eq!(find_dev_package(&repo, "libbar2").unwrap(), None);
}

#[test]
fn test_ambiguous_debug_package() {
    let repo = files(&[
        "libfoo1-dbgsym_1.2.3_arm64.ddeb",
        "libfoo1-dbgsym_1.2.4_arm64.ddeb",
    ]);
    assert!(matches!(
        find_debug_package(&repo, "libfoo1"),
        Err(ArtifactError::MultipleCandidates { .. })
    ));
}

// ============================================
// Unit Tests - Manifest map
// ============================================

#[test]
fn test_manifest_map_classification() {
    let ws = TestWorkspace::new();
    ws.create_file(
        "manifest_map.txt",
        "sources/vendor/camera\tprop\nsources/oss/libfoo\toss\nvendor/gpu\tprop\n",
    );
    let map = ManifestMap::load(&ws.path().join("manifest_map.txt"), &ws.sources()).unwrap();

    assert_eq!(map.len(), 3);
    assert_eq!(map.classify(&ws.sources().join("vendor/camera")), "prop");
    assert_eq!(map.classify(&ws.sources().join("oss/libfoo")), "oss");
    assert_eq!(map.classify(&ws.sources().join("vendor/gpu")), "prop");
    assert_eq!(map.classify(&ws.sources().join("unlisted")), "oss");
}

#[test]
fn test_artifacts_filed_by_category() {
    let ws = TestWorkspace::new();
    let repo = ws.add_source("vendor/camera", &["libcam1"], &[]);
    ws.create_file("manifest_map.txt", "sources/vendor/camera\tprop\n");
    ws.create_file("sources/vendor/libcam_2.0.0-1.dsc", "");

    let layout = WorkspaceLayout::new(ws.path(), "-ci");
    layout.prepare().unwrap();
    ws.create_file("debian_packages/temp/libcam1_2.0.0-1_arm64.deb", "");

    let config = SbuildConfig {
        distribution: "noble".to_string(),
        architecture: "arm64".to_string(),
        chroot_name: "-ci".to_string(),
        chroot_mirror: "http://ports.ubuntu.com".to_string(),
        mount_dir: layout.mount_dir(),
        temp_dir: layout.temp_dir(),
        deb_out_dir: layout.deb_out_dir(),
        local_repository: None,
        debians_repository: None,
        extra_repositories: Vec::new(),
        prepare_source: false,
        cleanup: true,
    };
    let map = ManifestMap::load(&layout.manifest_map(), &layout.sources_dir()).unwrap();
    let builder = SbuildBuilder::new(config, map);

    builder.organize_artifacts(&repo).unwrap();

    let out = assert_fs::fixture::ChildPath::new(layout.deb_out_dir());
    out.child("prop/libcam1/libcam1_2.0.0-1_arm64.deb")
        .assert(predicate::path::is_file());
    out.child("prop/libcam/libcam_2.0.0-1.dsc")
        .assert(predicate::path::is_file());
    out.child("temp/libcam1_2.0.0-1_arm64.deb")
        .assert(predicate::path::missing());
}

// ============================================
// Unit Tests - Configuration
// ============================================

#[test]
fn test_workspace_configuration() {
    let temp = assert_fs::TempDir::new().unwrap();
    temp.child(CONFIG_FILE_NAME)
        .write_str(
            "[build]\ndistribution = \"jammy\"\nchroot_name = \"-nightly\"\n\n[abi]\nkeep_temp = false\nnon_reachable_types = false\n",
        )
        .unwrap();

    let dirs = DebforgeDirs::with_config_dir(temp.path().join("user"));
    let config = DebforgeConfig::load(Some(temp.path()), &dirs).unwrap();

    assert_eq!(config.distribution(), "jammy");
    assert_eq!(config.chroot_name(), "-nightly");
    assert_eq!(config.architecture(), "arm64");
    assert!(!config.abi_keep_temp());
    assert!(!config.non_reachable_types());
}

#[test]
fn test_missing_configuration_uses_defaults() {
    let temp = assert_fs::TempDir::new().unwrap();
    let dirs = DebforgeDirs::with_config_dir(temp.path().join("user"));

    let config = DebforgeConfig::load(Some(Path::new("/nonexistent")), &dirs).unwrap();
    assert_eq!(config, DebforgeConfig::default());
    assert_eq!(config.chroot_name(), "-debforge");
}
