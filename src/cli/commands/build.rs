//! CLI command for `debforge build`
//!
//! Prepares the workspace and chroot, then builds every source tree (or one
//! package and its build dependencies) with sbuild.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use indicatif::ProgressBar;

use crate::cli::output::{create_build_bar, create_spinner, is_json, print_info, print_success};
use crate::config::{defaults, DebforgeConfig};
use crate::core::builder::{BuildOrchestrator, PackageBuild};
use crate::core::descriptor::{DescriptorTable, PackageDescriptor};
use crate::core::manifest_map::ManifestMap;
use crate::error::{BuildError, DebforgeError};
use crate::infra::dirs::{DebforgeDirs, WorkspaceLayout};
use crate::infra::sbuild::{LocalRepository, SbuildBuilder, SbuildConfig};

/// Arguments of `debforge build`
#[derive(Args, Debug, Clone, Default)]
pub struct BuildArgs {
    /// Workspace directory holding `sources/`
    #[arg(long)]
    pub workspace: PathBuf,

    /// Build only this package and its build dependencies
    #[arg(long)]
    pub package: Option<String>,

    /// sbuild chroot suffix
    #[arg(long)]
    pub chroot_name: Option<String>,

    /// Target distribution
    #[arg(long)]
    pub distribution: Option<String>,

    /// Target architecture
    #[arg(long)]
    pub arch: Option<String>,

    /// Extra repository lines, comma separated
    #[arg(long, value_delimiter = ',')]
    pub apt_server_config: Vec<String>,

    /// Build source packages only
    #[arg(long)]
    pub prepare_sources: bool,

    /// Keep a half-created chroot after a failure
    #[arg(long)]
    pub nocleanup: bool,

    /// Directory with pre-built packages made available to builds
    #[arg(long, requires = "debians_url")]
    pub debians_path: Option<PathBuf>,

    /// URL the pre-built package directory is served at
    #[arg(long)]
    pub debians_url: Option<String>,

    /// URL the package output directory is served at
    #[arg(long)]
    pub local_repo_url: Option<String>,
}

/// Advances a progress bar around another build operation
struct ProgressBuild<B> {
    inner: B,
    bar: ProgressBar,
}

impl<B: PackageBuild> PackageBuild for ProgressBuild<B> {
    fn build(&mut self, descriptor: &PackageDescriptor) -> Result<(), BuildError> {
        self.bar.set_message(descriptor.packages.join(", "));
        let result = self.inner.build(descriptor);
        self.bar.inc(1);
        result
    }
}

/// Resolve the sbuild settings from flags, configuration and layout
pub fn sbuild_config(args: &BuildArgs, config: &DebforgeConfig, layout: &WorkspaceLayout) -> SbuildConfig {
    let architecture = args.arch.clone().unwrap_or_else(|| config.architecture().to_string());

    let local_repository = args
        .local_repo_url
        .as_deref()
        .map(|url| LocalRepository::served_at(layout.deb_out_dir(), url, &architecture));
    let debians_repository = args
        .debians_path
        .as_ref()
        .zip(args.debians_url.as_deref())
        .map(|(dir, url)| LocalRepository::served_at(dir, url, &architecture));

    let mut extra_repositories = config.build.apt_server_config.clone();
    extra_repositories.extend(args.apt_server_config.iter().cloned());

    SbuildConfig {
        distribution: args
            .distribution
            .clone()
            .unwrap_or_else(|| config.distribution().to_string()),
        architecture,
        chroot_name: args
            .chroot_name
            .clone()
            .unwrap_or_else(|| config.chroot_name().to_string()),
        chroot_mirror: config.chroot_mirror().to_string(),
        mount_dir: layout.mount_dir(),
        temp_dir: layout.temp_dir(),
        deb_out_dir: layout.deb_out_dir(),
        local_repository,
        debians_repository,
        extra_repositories,
        prepare_source: args.prepare_sources || config.build.prepare_source.unwrap_or(false),
        cleanup: !args.nocleanup && config.build.cleanup.unwrap_or(true),
    }
}

fn load_manifest_map(layout: &WorkspaceLayout) -> Result<ManifestMap> {
    let path = layout.manifest_map();
    if !path.is_file() {
        tracing::debug!("No manifest map at {}, classifying everything as oss", path.display());
        return Ok(ManifestMap::default());
    }
    Ok(ManifestMap::load(&path, &layout.sources_dir())?)
}

/// Execute the build command
pub fn execute(args: &BuildArgs) -> Result<i32> {
    let workspace = std::path::absolute(&args.workspace)?;
    let sources = workspace.join(defaults::SOURCES_DIR);
    if !sources.is_dir() {
        return Err(DebforgeError::SourcesNotFound { path: sources }.into());
    }
    let config = DebforgeConfig::load(Some(&workspace), &DebforgeDirs::new())?;
    let chroot_name = args
        .chroot_name
        .clone()
        .unwrap_or_else(|| config.chroot_name().to_string());

    let layout = WorkspaceLayout::new(&workspace, chroot_name);
    layout
        .prepare()
        .with_context(|| format!("Failed to prepare workspace {}", workspace.display()))?;

    let sbuild = sbuild_config(args, &config, &layout);
    let builder = SbuildBuilder::new(sbuild, load_manifest_map(&layout)?);

    let spinner = create_spinner("Preparing build chroot...");
    let prepared = builder.ensure_chroot().and_then(|()| builder.index_debians_repository());
    spinner.finish_and_clear();
    prepared?;

    let table = DescriptorTable::load(&layout.sources_dir())?;
    let total = table.len() as u64;
    let bar = create_build_bar(total);
    let mut orchestrator = BuildOrchestrator::new(table, ProgressBuild { inner: builder, bar });

    let outcome = match &args.package {
        Some(package) => {
            print_info(&format!("Building '{package}' and its build dependencies"));
            orchestrator.build_package(package)
        }
        None => orchestrator.build_all(),
    };
    orchestrator.builder().bar.finish_and_clear();
    outcome?;

    let built = orchestrator.built().len();
    if is_json() {
        let json = serde_json::json!({
            "status": "success",
            "built": orchestrator.built(),
        });
        println!("{}", serde_json::to_string_pretty(&json)?);
    } else {
        print_success(&format!("Built {built} of {total} source packages"));
    }
    Ok(0)
}
