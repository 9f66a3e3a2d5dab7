//! Output formatting and progress indicators
//!
//! This module provides utilities for displaying progress bars,
//! status lines, and formatted messages to the user.

use std::sync::atomic::{AtomicBool, Ordering};

use indicatif::{ProgressBar, ProgressStyle};

use crate::error::BuildError;

static QUIET: AtomicBool = AtomicBool::new(false);
static JSON: AtomicBool = AtomicBool::new(false);

/// Global output settings from the command line
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OutputConfig {
    /// Only errors
    pub quiet: bool,
    /// Machine-readable output
    pub json: bool,
    /// `-v` count, applied through the log filter
    pub verbose: u8,
}

impl OutputConfig {
    /// Create an output configuration
    pub fn new(quiet: bool, json: bool, verbose: u8) -> Self {
        Self { quiet, json, verbose }
    }

    /// Make this configuration visible to the print helpers
    pub fn apply_global(self) {
        QUIET.store(self.quiet, Ordering::Relaxed);
        JSON.store(self.json, Ordering::Relaxed);
    }
}

/// Whether `--quiet` is active
pub fn is_quiet() -> bool {
    QUIET.load(Ordering::Relaxed)
}

/// Whether `--json` is active
pub fn is_json() -> bool {
    JSON.load(Ordering::Relaxed)
}

fn prints_human() -> bool {
    !is_quiet() && !is_json()
}

/// Print a success line
pub fn print_success(message: &str) {
    if prints_human() {
        println!("{} {message}", status::SUCCESS);
    }
}

/// Print an informational line
pub fn print_info(message: &str) {
    if prints_human() {
        println!("{} {message}", status::INFO);
    }
}

/// Print a warning line to stderr
pub fn print_warning(message: &str) {
    if !is_json() {
        eprintln!("{} {message}", status::WARNING);
    }
}

/// Print an indented detail line
pub fn print_detail(message: &str) {
    if prints_human() {
        println!("    {message}");
    }
}

/// Print an error for the user
///
/// Tool failures already had their captured log written by the build, so
/// only the message is shown for them. Everything else gets the full chain.
pub fn display_error(error: &anyhow::Error) {
    let log_shown = error
        .downcast_ref::<BuildError>()
        .is_some_and(BuildError::log_already_shown);

    if log_shown {
        eprintln!("{} {error}", status::ERROR);
    } else {
        eprintln!("{} {error:#}", status::ERROR);
    }
    tracing::error!("{error}");
}

/// Create a spinner for operations with unknown duration
pub fn create_spinner(message: &str) -> ProgressBar {
    if !prints_human() {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
            .template("{spinner:.blue} {msg}")
            .expect("Invalid spinner template"),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(80));
    pb
}

/// Create a progress bar for build steps
pub fn create_build_bar(total: u64) -> ProgressBar {
    if !prints_human() {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} packages ({msg})")
            .expect("Invalid progress bar template")
            .progress_chars("█▓▒░"),
    );
    pb
}

/// Status message prefixes
pub mod status {
    /// Success prefix (green checkmark)
    pub const SUCCESS: &str = "✓";

    /// Error prefix (red X)
    pub const ERROR: &str = "✗";

    /// Warning prefix (yellow triangle)
    pub const WARNING: &str = "⚠";

    /// Info prefix (blue circle)
    pub const INFO: &str = "ℹ";
}
