use crate::error::{RelayError, Result};
use crate::registry::CallbackRegistry;
use crate::types::TestOutcome;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// ActionRule
// ---------------------------------------------------------------------------

/// One row of the action table: when a test with `outcome` touches an issue
/// currently in `status`, run the callback registered under `callback`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionRule {
    pub outcome: TestOutcome,
    pub status: String,
    pub callback: String,
}

impl ActionRule {
    /// Parse a config line of the form `failed,Closed,reopen_on_regression`.
    ///
    /// Three comma-separated fields: outcome, issue status (may contain
    /// spaces, e.g. `In qualification`), callback name.
    pub fn parse(line: &str) -> Result<Self> {
        let mut parts = line.splitn(3, ',');
        let outcome = parts.next().map(str::trim).unwrap_or("");
        let status = parts.next().map(str::trim).unwrap_or("");
        let callback = parts.next().map(str::trim).unwrap_or("");

        if status.is_empty() || callback.is_empty() {
            return Err(RelayError::InvalidRule {
                line: line.to_string(),
                reason: "expected 'outcome,status,callback'".to_string(),
            });
        }
        let outcome: TestOutcome = outcome.parse().map_err(|_| RelayError::InvalidRule {
            line: line.to_string(),
            reason: format!("unknown outcome '{outcome}'"),
        })?;
        Ok(Self {
            outcome,
            status: status.to_string(),
            callback: callback.to_string(),
        })
    }

    pub fn matches(&self, outcome: TestOutcome, status: &str) -> bool {
        self.outcome == outcome && self.status == status
    }
}

// ---------------------------------------------------------------------------
// ActionTable
// ---------------------------------------------------------------------------

/// Ordered action rules. Resolution is first-match-wins in config order.
#[derive(Debug, Clone, Default)]
pub struct ActionTable {
    rules: Vec<ActionRule>,
}

impl ActionTable {
    pub fn parse(lines: &[String]) -> Result<Self> {
        let rules = lines
            .iter()
            .filter(|l| !l.trim().is_empty())
            .map(|l| ActionRule::parse(l))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { rules })
    }

    /// First rule matching the (outcome, current issue status) pair.
    pub fn resolve(&self, outcome: TestOutcome, status: &str) -> Option<&ActionRule> {
        self.rules.iter().find(|r| r.matches(outcome, status))
    }

    /// Resolve with fallback: an explicit row for `status` wins, otherwise
    /// a row registered under the configured default status applies.
    pub fn resolve_or_default<'a>(
        &'a self,
        outcome: TestOutcome,
        status: &str,
        default_status: &str,
    ) -> Option<&'a ActionRule> {
        self.resolve(outcome, status)
            .or_else(|| self.resolve(outcome, default_status))
    }

    /// Every callback named by a rule must be registered. Called at startup
    /// so a bad config fails before any test event is processed.
    pub fn validate(&self, registry: &CallbackRegistry) -> Result<()> {
        for rule in &self.rules {
            if !registry.contains(&rule.callback) {
                return Err(RelayError::CallbackNotFound(rule.callback.clone()));
            }
        }
        Ok(())
    }

    pub fn rules(&self) -> &[ActionRule] {
        &self.rules
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn parse_simple_rule() {
        let rule = ActionRule::parse("failed,Closed,reopen_on_regression").unwrap();
        assert_eq!(rule.outcome, TestOutcome::Failed);
        assert_eq!(rule.status, "Closed");
        assert_eq!(rule.callback, "reopen_on_regression");
    }

    #[test]
    fn parse_status_with_spaces() {
        let rule =
            ActionRule::parse("failed,In qualification,write_failure_and_back_in_dev").unwrap();
        assert_eq!(rule.status, "In qualification");
        assert_eq!(rule.callback, "write_failure_and_back_in_dev");
    }

    #[test]
    fn parse_trims_fields() {
        let rule = ActionRule::parse(" passed , Closed , do_nothing ").unwrap();
        assert_eq!(rule.outcome, TestOutcome::Passed);
        assert_eq!(rule.status, "Closed");
        assert_eq!(rule.callback, "do_nothing");
    }

    #[test]
    fn parse_rejects_missing_fields() {
        assert!(ActionRule::parse("failed,Closed").is_err());
        assert!(ActionRule::parse("failed").is_err());
        assert!(ActionRule::parse("").is_err());
    }

    #[test]
    fn parse_rejects_unknown_outcome() {
        let err = ActionRule::parse("exploded,Closed,do_nothing").unwrap_err();
        assert!(err.to_string().contains("exploded"));
    }

    #[test]
    fn first_match_wins() {
        let table = ActionTable::parse(&lines(&[
            "failed,Closed,reopen_on_regression",
            "failed,Closed,do_nothing",
        ]))
        .unwrap();
        let rule = table.resolve(TestOutcome::Failed, "Closed").unwrap();
        assert_eq!(rule.callback, "reopen_on_regression");
    }

    #[test]
    fn no_match_returns_none() {
        let table = ActionTable::parse(&lines(&["failed,Closed,do_nothing"])).unwrap();
        assert!(table.resolve(TestOutcome::Passed, "Closed").is_none());
        assert!(table.resolve(TestOutcome::Failed, "Open").is_none());
    }

    #[test]
    fn default_status_fallback() {
        let table = ActionTable::parse(&lines(&[
            "failed,Closed,reopen_on_regression",
            "passed,In Development,write_success_comment",
        ]))
        .unwrap();
        // No explicit row for (passed, Closed); fall back to default status.
        let rule = table
            .resolve_or_default(TestOutcome::Passed, "Closed", "In Development")
            .unwrap();
        assert_eq!(rule.callback, "write_success_comment");
        // Explicit row still wins over fallback.
        let rule = table
            .resolve_or_default(TestOutcome::Failed, "Closed", "In Development")
            .unwrap();
        assert_eq!(rule.callback, "reopen_on_regression");
    }

    #[test]
    fn validate_unknown_callback_fails() {
        let table = ActionTable::parse(&lines(&["failed,Closed,not_a_callback"])).unwrap();
        let registry = CallbackRegistry::with_defaults();
        assert!(matches!(
            table.validate(&registry),
            Err(RelayError::CallbackNotFound(name)) if name == "not_a_callback"
        ));
    }

    #[test]
    fn validate_defaults_pass() {
        let table = ActionTable::parse(&lines(&[
            "failed,Closed,reopen_on_regression",
            "passed,In qualification,write_success_comment",
        ]))
        .unwrap();
        let registry = CallbackRegistry::with_defaults();
        table.validate(&registry).unwrap();
    }

    #[test]
    fn blank_lines_are_skipped() {
        let table =
            ActionTable::parse(&lines(&["", "failed,Closed,do_nothing", "   "])).unwrap();
        assert_eq!(table.rules().len(), 1);
    }
}
