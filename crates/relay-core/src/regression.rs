use crate::error::Result;
use crate::io::{append_text, atomic_write};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

// ---------------------------------------------------------------------------
// Regression
// ---------------------------------------------------------------------------

/// A previously fixed issue whose test is failing again.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Regression {
    pub issue: String,
    pub test: String,
    pub message: String,
    pub at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// RegressionLog
// ---------------------------------------------------------------------------

/// Collects regressions during a run.
///
/// Every `record` appends exactly one line to the side log (`<report>.log`)
/// while holding the lock, so concurrent callbacks from different issues
/// never interleave lines. The full report is rendered once at the end of
/// the run from the retained entries.
pub struct RegressionLog {
    report_path: PathBuf,
    line_log_path: PathBuf,
    entries: Mutex<Vec<Regression>>,
}

impl RegressionLog {
    pub fn new(report_path: impl Into<PathBuf>) -> Self {
        let report_path = report_path.into();
        let mut s: OsString = report_path.clone().into_os_string();
        s.push(".log");
        Self {
            report_path,
            line_log_path: PathBuf::from(s),
            entries: Mutex::new(Vec::new()),
        }
    }

    pub fn record(&self, issue: &str, test: &str, message: &str) -> Result<()> {
        let regression = Regression {
            issue: issue.to_string(),
            test: test.to_string(),
            message: message.to_string(),
            at: Utc::now(),
        };
        let mut entries = self
            .entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let line = format!(
            "{} {} regression found by {}\n",
            regression.at.to_rfc3339(),
            regression.issue,
            regression.test
        );
        append_text(&self.line_log_path, &line)?;
        entries.push(regression);
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn entries(&self) -> Vec<Regression> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn report_path(&self) -> &Path {
        &self.report_path
    }

    pub fn line_log_path(&self) -> &Path {
        &self.line_log_path
    }

    /// Render the end-of-run report, Markdown or reStructuredText by
    /// extension. No file is written when there are no regressions.
    pub fn write_report(&self) -> Result<bool> {
        let entries = self.entries();
        if entries.is_empty() {
            return Ok(false);
        }
        let ext = self
            .report_path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("md");
        let body = match ext {
            "rst" => render_rst(&entries),
            _ => render_md(&entries),
        };
        atomic_write(&self.report_path, body.as_bytes())?;
        Ok(true)
    }
}

// ---------------------------------------------------------------------------
// Renderers
// ---------------------------------------------------------------------------

fn render_md(entries: &[Regression]) -> String {
    let mut out = String::new();
    for r in entries {
        out.push_str(&format!(
            "# {issue}\n\nRegression was found by `{test}`. Debug info:\n\n```\n{message}\n```\n\n",
            issue = r.issue,
            test = r.test,
            message = r.message
        ));
    }
    out
}

fn render_rst(entries: &[Regression]) -> String {
    let mut out = String::new();
    for r in entries {
        let underline = "=".repeat(r.issue.len());
        let indented: String = r
            .message
            .lines()
            .map(|l| format!("    {l}\n"))
            .collect();
        out.push_str(&format!(
            "{issue}\n{underline}\n\nRegression was found by `{test}`. Debug info:\n\n.. sourcecode::\n\n{indented}\n",
            issue = r.issue,
            test = r.test,
        ));
    }
    out
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
