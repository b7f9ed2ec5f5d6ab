//! Default callback set.
//!
//! Every callback takes `(context, issue, test event, message)` and reacts
//! by updating the tracker or the regression log. All of them degrade to a
//! logged no-op when the run is offline, so a test run never fails just
//! because Jira is unreachable.

use crate::error::Result;
use crate::jira::Issue;
use crate::registry::{sequence, Callback, CallbackRegistry};
use crate::reporter::ReportContext;
use crate::types::TestEvent;
use std::sync::Arc;

/// Explicitly does nothing. Useful to silence a (outcome, status) pair.
pub fn do_nothing(
    _cx: &ReportContext,
    issue: &Issue,
    event: &TestEvent,
    _message: &str,
) -> Result<()> {
    tracing::debug!(issue = %issue.key, test = %event.test, "no action");
    Ok(())
}

/// Post a comment noting that the linked test passed.
pub fn write_success_comment(
    cx: &ReportContext,
    issue: &Issue,
    event: &TestEvent,
    message: &str,
) -> Result<()> {
    let Some(jira) = &cx.jira else {
        tracing::debug!(issue = %issue.key, "offline, skipping success comment");
        return Ok(());
    };
    jira.add_comment(&issue.key, message)?;
    tracing::info!(issue = %issue.key, test = %event.test, "success comment sent");
    Ok(())
}

/// Post a failure comment, then send the issue back to development.
pub fn write_failure_and_back_in_dev(
    cx: &ReportContext,
    issue: &Issue,
    event: &TestEvent,
    message: &str,
) -> Result<()> {
    let Some(jira) = &cx.jira else {
        tracing::debug!(issue = %issue.key, "offline, skipping failure report");
        return Ok(());
    };
    jira.add_comment(
        &issue.key,
        &format!("Automated test {} failed:\n{}", event.test, message),
    )?;
    tracing::info!(issue = %issue.key, test = %event.test, "failure comment sent");
    jira.transition(&issue.key, "Set as To Do")?;
    Ok(())
}

/// Record a regression in the log and, when online, warn on the issue.
///
/// The log entry is written even offline; only the comment needs the
/// connection.
pub fn warn_regression(
    cx: &ReportContext,
    issue: &Issue,
    event: &TestEvent,
    message: &str,
) -> Result<()> {
    cx.regressions.record(&issue.key, &event.test, message)?;
    tracing::warn!(issue = %issue.key, test = %event.test, "regression recorded");
    let Some(jira) = &cx.jira else {
        return Ok(());
    };
    jira.add_comment(
        &issue.key,
        &format!(
            "Automated test {} found a regression:\n{}",
            event.test, message
        ),
    )?;
    Ok(())
}

// ---------------------------------------------------------------------------
// apply_transition
// ---------------------------------------------------------------------------

struct ApplyTransition {
    name: String,
}

impl Callback for ApplyTransition {
    fn invoke(
        &self,
        cx: &ReportContext,
        issue: &Issue,
        _event: &TestEvent,
        _message: &str,
    ) -> Result<()> {
        let Some(jira) = &cx.jira else {
            tracing::debug!(issue = %issue.key, transition = %self.name, "offline, skipping transition");
            return Ok(());
        };
        jira.transition(&issue.key, &self.name)?;
        tracing::info!(issue = %issue.key, transition = %self.name, "transition applied");
        Ok(())
    }
}

/// Callback constructor: request the named workflow transition on the issue.
/// An unavailable transition is an error the reporter records, not a panic
/// and not a run abort.
pub fn apply_transition(name: impl Into<String>) -> Arc<dyn Callback> {
    Arc::new(ApplyTransition { name: name.into() })
}

// ---------------------------------------------------------------------------
// Registration
// ---------------------------------------------------------------------------

/// Install the default callback set into `registry`.
pub fn install_defaults(registry: &mut CallbackRegistry) {
    registry.register_override("do_nothing", Arc::new(do_nothing));
    registry.register_override("write_success_comment", Arc::new(write_success_comment));
    registry.register_override(
        "write_failure_and_back_in_dev",
        Arc::new(write_failure_and_back_in_dev),
    );
    registry.register_override("warn_regression", Arc::new(warn_regression));
    registry.register_override(
        "reopen_on_regression",
        sequence(vec![Arc::new(warn_regression), apply_transition("Reopen")]),
    );
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
