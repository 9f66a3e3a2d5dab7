//! Tests for the sbuild driver against a stand-in `sbuild` on `PATH`
//!
//! Kept in its own test binary since it changes the process `PATH`.

#![cfg(unix)]

mod common;

use std::os::unix::fs::PermissionsExt;

use common::TestWorkspace;
use debforge::core::builder::PackageBuild;
use debforge::core::control::ControlInfo;
use debforge::core::descriptor::PackageDescriptor;
use debforge::core::manifest_map::FixedCategory;
use debforge::error::BuildError;
use debforge::infra::dirs::WorkspaceLayout;
use debforge::infra::sbuild::{SbuildBuilder, SbuildConfig};

/// Writes `<tree>_arm64.build` into `--build-dir` and fails for the `bad` tree
const FAKE_SBUILD: &str = r#"#!/bin/sh
while [ $# -gt 0 ]; do
    if [ "$1" = "--build-dir" ]; then dir="$2"; fi
    shift
done
name=$(basename "$PWD")
echo "LOG FOR $name" > "$dir/${name}_arm64.build"
if [ "$name" = "bad" ]; then
    echo "E: Build failure" >&2
    exit 1
fi
exit 0
"#;

fn install_fake_sbuild(ws: &TestWorkspace) {
    let bin = ws.create_dir("bin");
    let script = bin.join("sbuild");
    std::fs::write(&script, FAKE_SBUILD).unwrap();
    std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

    let path = std::env::var("PATH").unwrap_or_default();
    std::env::set_var("PATH", format!("{}:{path}", bin.display()));
}

fn descriptor(ws: &TestWorkspace, tree: &str) -> PackageDescriptor {
    let repo = ws.add_source(tree, &[tree], &[]);
    PackageDescriptor::new(
        repo,
        ControlInfo {
            packages: vec![tree.to_string()],
            build_depends: Vec::new(),
        },
    )
}

#[test]
fn test_failure_log_only_holds_the_failing_build() {
    let ws = TestWorkspace::new();
    install_fake_sbuild(&ws);
    let good = descriptor(&ws, "good");
    let bad = descriptor(&ws, "bad");

    let layout = WorkspaceLayout::new(ws.path(), "-ci");
    layout.prepare().unwrap();
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
    let mut builder = SbuildBuilder::new(config, FixedCategory::default());

    builder.build(&good).unwrap();
    assert!(layout.temp_dir().join("good_arm64.build").is_file());

    match builder.build(&bad) {
        Err(BuildError::ToolFailed { tool, target, log, .. }) => {
            assert_eq!(tool, "sbuild");
            assert_eq!(target, "bad");
            assert!(log.contains("LOG FOR bad"), "{log}");
            assert!(!log.contains("LOG FOR good"), "{log}");
        }
        other => panic!("expected sbuild failure, got {other:?}"),
    }
    assert!(!layout.temp_dir().join("good_arm64.build").exists());
}
