use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// TestOutcome
// ---------------------------------------------------------------------------

/// Result status attached to a finished test by the host runner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestOutcome {
    Passed,
    Failed,
    Error,
    Skipped,
}

impl TestOutcome {
    pub fn all() -> &'static [TestOutcome] {
        &[
            TestOutcome::Passed,
            TestOutcome::Failed,
            TestOutcome::Error,
            TestOutcome::Skipped,
        ]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TestOutcome::Passed => "passed",
            TestOutcome::Failed => "failed",
            TestOutcome::Error => "error",
            TestOutcome::Skipped => "skipped",
        }
    }

    /// A failing outcome is one that may indicate a regression.
    pub fn is_failing(self) -> bool {
        matches!(self, TestOutcome::Failed | TestOutcome::Error)
    }
}

impl fmt::Display for TestOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TestOutcome {
    type Err = crate::error::RelayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "passed" => Ok(TestOutcome::Passed),
            "failed" => Ok(TestOutcome::Failed),
            "error" => Ok(TestOutcome::Error),
            "skipped" => Ok(TestOutcome::Skipped),
            _ => Err(crate::error::RelayError::InvalidOutcome(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// TestEvent
// ---------------------------------------------------------------------------

/// A single finished test as delivered by the host runner.
///
/// `description` usually carries the test's docstring or display name; issue
/// keys are extracted from it and from `message` (the failure detail).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestEvent {
    pub test: String,
    pub outcome: TestOutcome,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub message: String,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
