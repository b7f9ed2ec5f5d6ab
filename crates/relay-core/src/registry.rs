use crate::error::{RelayError, Result};
use crate::jira::Issue;
use crate::reporter::ReportContext;
use crate::types::TestEvent;
use std::collections::HashMap;
use std::sync::Arc;

// ---------------------------------------------------------------------------
// Callback
// ---------------------------------------------------------------------------

/// A unit of work that reacts to one (test event, issue) pair.
///
/// Implementations update the tracker through `cx.jira` and the regression
/// log through `cx.regressions`. Errors are reported per issue by the
/// reporter; they never abort the run.
pub trait Callback: Send + Sync {
    fn invoke(
        &self,
        cx: &ReportContext,
        issue: &Issue,
        event: &TestEvent,
        message: &str,
    ) -> Result<()>;
}

impl<F> Callback for F
where
    F: Fn(&ReportContext, &Issue, &TestEvent, &str) -> Result<()> + Send + Sync,
{
    fn invoke(
        &self,
        cx: &ReportContext,
        issue: &Issue,
        event: &TestEvent,
        message: &str,
    ) -> Result<()> {
        self(cx, issue, event, message)
    }
}

// ---------------------------------------------------------------------------
// Sequence
// ---------------------------------------------------------------------------

struct Sequence {
    steps: Vec<Arc<dyn Callback>>,
}

impl Callback for Sequence {
    fn invoke(
        &self,
        cx: &ReportContext,
        issue: &Issue,
        event: &TestEvent,
        message: &str,
    ) -> Result<()> {
        let mut first_err = None;
        for step in &self.steps {
            if let Err(e) = step.invoke(cx, issue, event, message) {
                tracing::warn!(issue = %issue.key, error = %e, "pipeline step failed");
                if first_err.is_none() {
                    first_err = Some(e);
                }
            }
        }
        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

/// Compose callbacks into a pipeline. Every step is attempted even when an
/// earlier one fails; the first error is returned afterwards.
pub fn sequence(steps: Vec<Arc<dyn Callback>>) -> Arc<dyn Callback> {
    Arc::new(Sequence { steps })
}

// ---------------------------------------------------------------------------
// CallbackRegistry
// ---------------------------------------------------------------------------

/// Process-scoped mapping from configuration names to callbacks.
///
/// Built explicitly before a run starts; the action table resolves against
/// it at startup so a misspelled name fails fast instead of mid-run.
#[derive(Default)]
pub struct CallbackRegistry {
    entries: HashMap<String, Arc<dyn Callback>>,
}

impl CallbackRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry pre-populated with the default callback set.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        crate::callbacks::install_defaults(&mut registry);
        registry
    }

    /// Bind `name` to `callback`. Rebinding an existing name is an error;
    /// use [`register_override`](Self::register_override) to replace.
    pub fn register(&mut self, name: impl Into<String>, callback: Arc<dyn Callback>) -> Result<()> {
        let name = name.into();
        if self.entries.contains_key(&name) {
            return Err(RelayError::CallbackExists(name));
        }
        self.entries.insert(name, callback);
        Ok(())
    }

    /// Bind `name` to `callback`, replacing any existing binding.
    pub fn register_override(&mut self, name: impl Into<String>, callback: Arc<dyn Callback>) {
        self.entries.insert(name.into(), callback);
    }

    pub fn resolve(&self, name: &str) -> Result<Arc<dyn Callback>> {
        self.entries
            .get(name)
            .cloned()
            .ok_or_else(|| RelayError::CallbackNotFound(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Registered names, sorted for stable output.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.entries.keys().cloned().collect();
        names.sort();
        names
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
