//! ABI diff classification and version policy
//!
//! `abipkgdiff` reports its findings as a 4-bit exit status:
//!
//! | bit | value | meaning                                        |
//! |-----|-------|------------------------------------------------|
//! | 0   | 1     | internal tool error                            |
//! | 1   | 2     | usage error, seen with stripped packages       |
//! | 2   | 4     | ABI change                                     |
//! | 3   | 8     | incompatible ABI change (only together with 4) |
//!
//! The status is decoded into [`AbiDiffStatus`], possibly escalated from the
//! textual report, and then checked against the version bump.

use std::fmt;
use std::ops::{BitOr, BitOrAssign};
use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;

use crate::core::version::VersionBump;
use crate::error::AbiError;

const BIT_TOOL_ERROR: i32 = 0b0001;
const BIT_USAGE_ERROR: i32 = 0b0010;
const BIT_CHANGE: i32 = 0b0100;
const BIT_INCOMPATIBLE: i32 = 0b1000;

/// Aggregated outcome bitmask returned to calling pipelines
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub struct AbiReturnCode(u8);

impl AbiReturnCode {
    /// No ABI difference
    pub const NO_DIFF: Self = Self(0b00000);
    /// Compatible ABI difference
    pub const COMPATIBLE: Self = Self(0b00001);
    /// Incompatible ABI difference
    pub const INCOMPATIBLE: Self = Self(0b00010);
    /// Package could not be compared (stripped)
    pub const STRIPPED: Self = Self(0b00100);
    /// Reference package not found upstream
    pub const PACKAGE_NOT_FOUND: Self = Self(0b01000);
    /// Reference repository could not be queried
    pub const FETCH_ERROR: Self = Self(0b10000);

    /// Raw bit value
    pub fn bits(self) -> u8 {
        self.0
    }

    /// Whether every bit of `other` is set in `self`
    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for AbiReturnCode {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for AbiReturnCode {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl fmt::Display for AbiReturnCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#07b}", self.0)
    }
}

/// Classification of one `abipkgdiff` run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum AbiDiffStatus {
    /// No difference found
    NoDiff,
    /// Structural change, compatible by the tool's heuristic
    Compatible,
    /// Behavior-changing difference
    Incompatible,
    /// Internal tool error
    ToolError,
    /// Tool usage failure, typically a stripped package
    Stripped,
}

impl AbiDiffStatus {
    /// Decode an exit status
    ///
    /// Bits are checked from lowest to highest: a tool error wins over
    /// everything else, a usage error over any reported change. The
    /// incompatible bit without the change bit is rejected.
    pub fn from_exit_code(code: i32) -> Result<Self, AbiError> {
        if !(0..=0b1111).contains(&code) {
            return Err(AbiError::InvalidStatus {
                status: code,
                reason: "only the lower 4 bits are defined".to_string(),
            });
        }
        if code & BIT_TOOL_ERROR != 0 {
            return Ok(Self::ToolError);
        }
        if code & BIT_USAGE_ERROR != 0 {
            return Ok(Self::Stripped);
        }

        match (code & BIT_CHANGE != 0, code & BIT_INCOMPATIBLE != 0) {
            (false, false) => Ok(Self::NoDiff),
            (true, false) => Ok(Self::Compatible),
            (true, true) => Ok(Self::Incompatible),
            (false, true) => Err(AbiError::InvalidStatus {
                status: code,
                reason: "incompatible change reported without a change".to_string(),
            }),
        }
    }

    /// Decode an exit status and apply the changed-functions override
    pub fn classify(code: i32, report: &str) -> Result<Self, AbiError> {
        Ok(Self::from_exit_code(code)?.escalate(report))
    }

    /// Escalate a compatible change when the report counts changed functions
    ///
    /// The tool does not always set the incompatible bit when function
    /// bodies changed; a positive `Changed` count in the functions summary
    /// is treated as incompatible.
    #[must_use]
    pub fn escalate(self, report: &str) -> Self {
        match self {
            Self::Compatible if changed_functions(report).is_some_and(|n| n > 0) => {
                tracing::warn!("Overriding to INCOMPATIBLE change since there are changed functions");
                Self::Incompatible
            }
            other => other,
        }
    }

    /// Report label
    pub fn label(self) -> &'static str {
        match self {
            Self::NoDiff => "NO-DIFF",
            Self::Compatible => "COMPATIBLE-DIFF",
            Self::Incompatible => "INCOMPATIBLE-DIFF",
            Self::ToolError => "ERROR",
            Self::Stripped => "STRIPPED-PACKAGE",
        }
    }

    /// Contribution to the aggregated return bitmask
    ///
    /// A tool error never produces a recorded outcome, so it contributes
    /// nothing.
    pub fn return_code(self) -> AbiReturnCode {
        match self {
            Self::NoDiff | Self::ToolError => AbiReturnCode::NO_DIFF,
            Self::Compatible => AbiReturnCode::COMPATIBLE,
            Self::Incompatible => AbiReturnCode::INCOMPATIBLE,
            Self::Stripped => AbiReturnCode::STRIPPED,
        }
    }

    /// Whether the tool reported any ABI difference
    pub fn has_diff(self) -> bool {
        matches!(self, Self::Compatible | Self::Incompatible)
    }
}

impl fmt::Display for AbiDiffStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

fn functions_summary() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"Functions changes summary:\s+(\d+)\s+Removed,\s+(\d+)\s+Changed")
            .expect("valid summary pattern")
    })
}

/// Number of changed functions from the report's functions summary
pub fn changed_functions(report: &str) -> Option<u64> {
    functions_summary()
        .captures(report)
        .and_then(|caps| caps.get(2))
        .and_then(|m| m.as_str().parse().ok())
}

/// Outcome of checking a classification against a version bump
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PolicyVerdict {
    /// Whether the bump satisfies the policy
    pub passed: bool,
    /// Human readable explanation
    pub message: String,
}

impl PolicyVerdict {
    fn pass(message: impl Into<String>) -> Self {
        Self {
            passed: true,
            message: message.into(),
        }
    }

    fn fail(message: impl Into<String>) -> Self {
        Self {
            passed: false,
            message: message.into(),
        }
    }
}

impl fmt::Display for PolicyVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let outcome = if self.passed { "PASS" } else { "FAIL" };
        write!(f, "{outcome} : {}", self.message)
    }
}

/// Check a classification against the version bump
///
/// - incompatible: a major bump is required
/// - compatible: a major or minor bump is required
/// - no diff: any bump, including none, passes
///
/// Stripped and tool-error outcomes carry no ABI judgment and are rejected.
pub fn evaluate_policy(status: AbiDiffStatus, bump: VersionBump) -> Result<PolicyVerdict, AbiError> {
    let verdict = match (status, bump) {
        (AbiDiffStatus::ToolError | AbiDiffStatus::Stripped, _) => {
            return Err(AbiError::InvalidStatus {
                status: status_bits(status),
                reason: format!("{} outcome has no version policy", status.label()),
            });
        }

        (AbiDiffStatus::Incompatible, VersionBump::Major) => PolicyVerdict::pass("Major version increased"),
        (AbiDiffStatus::Incompatible, VersionBump::Minor) => {
            PolicyVerdict::fail("Minor version increased, needed major increase")
        }
        (AbiDiffStatus::Incompatible, VersionBump::Patch) => {
            PolicyVerdict::fail("Patch version increased, needed major increase")
        }

        (AbiDiffStatus::Compatible, VersionBump::Major) => PolicyVerdict::pass("Major version increased"),
        (AbiDiffStatus::Compatible, VersionBump::Minor) => PolicyVerdict::pass("Minor version increased"),
        (AbiDiffStatus::Compatible, VersionBump::Patch) => {
            PolicyVerdict::fail("Patch version increased, needed minor increase")
        }

        (AbiDiffStatus::Incompatible | AbiDiffStatus::Compatible, VersionBump::None) => {
            PolicyVerdict::fail("No version increase")
        }

        (AbiDiffStatus::NoDiff, VersionBump::None) => PolicyVerdict::pass("No version increase"),
        (AbiDiffStatus::NoDiff, bump) => PolicyVerdict::pass(format!("{bump} version increased")),
    };

    if verdict.passed {
        tracing::info!("{verdict}");
    } else {
        tracing::error!("{verdict}");
    }
    Ok(verdict)
}

fn status_bits(status: AbiDiffStatus) -> i32 {
    match status {
        AbiDiffStatus::NoDiff => 0,
        AbiDiffStatus::Compatible => BIT_CHANGE,
        AbiDiffStatus::Incompatible => BIT_CHANGE | BIT_INCOMPATIBLE,
        AbiDiffStatus::ToolError => BIT_TOOL_ERROR,
        AbiDiffStatus::Stripped => BIT_USAGE_ERROR,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SUMMARY_CHANGED: &str =
        "Functions changes summary: 0 Removed, 2 Changed, 1 Added functions\n";
    const SUMMARY_ADDED: &str =
        "Functions changes summary: 0 Removed, 0 Changed, 3 Added functions\n";

    #[test]
    fn test_decode_exit_codes() {
        assert_eq!(AbiDiffStatus::from_exit_code(0).unwrap(), AbiDiffStatus::NoDiff);
        assert_eq!(AbiDiffStatus::from_exit_code(0b0100).unwrap(), AbiDiffStatus::Compatible);
        assert_eq!(AbiDiffStatus::from_exit_code(0b1100).unwrap(), AbiDiffStatus::Incompatible);
        assert_eq!(AbiDiffStatus::from_exit_code(0b0010).unwrap(), AbiDiffStatus::Stripped);
        assert_eq!(AbiDiffStatus::from_exit_code(0b0001).unwrap(), AbiDiffStatus::ToolError);
        assert_eq!(AbiDiffStatus::from_exit_code(0b1101).unwrap(), AbiDiffStatus::ToolError);
    }

    #[test]
    fn test_incompatible_without_change_is_rejected() {
        assert!(matches!(
            AbiDiffStatus::from_exit_code(0b1000),
            Err(AbiError::InvalidStatus { status: 8, .. })
        ));
        assert!(AbiDiffStatus::from_exit_code(16).is_err());
        assert!(AbiDiffStatus::from_exit_code(-1).is_err());
    }

    #[test]
    fn test_escalation_on_changed_functions() {
        assert_eq!(
            AbiDiffStatus::classify(0b0100, SUMMARY_CHANGED).unwrap(),
            AbiDiffStatus::Incompatible
        );
        assert_eq!(
            AbiDiffStatus::classify(0b0100, SUMMARY_ADDED).unwrap(),
            AbiDiffStatus::Compatible
        );
        // Only compatible outcomes are escalated
        assert_eq!(
            AbiDiffStatus::classify(0, SUMMARY_CHANGED).unwrap(),
            AbiDiffStatus::NoDiff
        );
    }

    #[test]
    fn test_changed_functions_parsing() {
        assert_eq!(changed_functions(SUMMARY_CHANGED), Some(2));
        assert_eq!(changed_functions("no summary here"), None);
    }

    #[test]
    fn test_return_code_aggregation() {
        let mut code = AbiReturnCode::NO_DIFF;
        code |= AbiDiffStatus::Compatible.return_code();
        code |= AbiDiffStatus::Stripped.return_code();
        assert_eq!(code.bits(), 0b00101);
        assert!(code.contains(AbiReturnCode::COMPATIBLE));
        assert!(!code.contains(AbiReturnCode::INCOMPATIBLE));
        assert_eq!((code | AbiReturnCode::FETCH_ERROR).bits(), 0b10101);
    }

    #[test]
    fn test_policy_messages() {
        let verdict = |s, b| evaluate_policy(s, b).unwrap().to_string();

        assert_eq!(verdict(AbiDiffStatus::NoDiff, VersionBump::Patch), "PASS : Patch version increased");
        assert_eq!(verdict(AbiDiffStatus::NoDiff, VersionBump::None), "PASS : No version increase");
        assert_eq!(verdict(AbiDiffStatus::Compatible, VersionBump::Minor), "PASS : Minor version increased");
        assert_eq!(
            verdict(AbiDiffStatus::Compatible, VersionBump::Patch),
            "FAIL : Patch version increased, needed minor increase"
        );
        assert_eq!(
            verdict(AbiDiffStatus::Incompatible, VersionBump::Patch),
            "FAIL : Patch version increased, needed major increase"
        );
        assert_eq!(
            verdict(AbiDiffStatus::Incompatible, VersionBump::Minor),
            "FAIL : Minor version increased, needed major increase"
        );
        assert_eq!(verdict(AbiDiffStatus::Incompatible, VersionBump::None), "FAIL : No version increase");
    }

    #[test]
    fn test_policy_rejects_non_judgments() {
        assert!(evaluate_policy(AbiDiffStatus::Stripped, VersionBump::Major).is_err());
        assert!(evaluate_policy(AbiDiffStatus::ToolError, VersionBump::Major).is_err());
    }
}
