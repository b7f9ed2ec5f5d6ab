use crate::config::Config;
use crate::error::Result;
use crate::feeders::KeyScanner;
use crate::jira::{Issue, JiraClient};
use crate::pool::WorkerPool;
use crate::registry::CallbackRegistry;
use crate::regression::RegressionLog;
use crate::rules::ActionTable;
use crate::types::TestEvent;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

// ---------------------------------------------------------------------------
// ReportContext
// ---------------------------------------------------------------------------

/// What callbacks get to work with: the tracker connection (absent when the
/// run is offline) and the shared regression log.
pub struct ReportContext {
    pub jira: Option<JiraClient>,
    pub regressions: RegressionLog,
}

// ---------------------------------------------------------------------------
// ReportError / RunSummary
// ---------------------------------------------------------------------------

/// A per-issue failure recorded during the run. Never aborts the run.
#[derive(Debug, Clone, Serialize)]
pub struct ReportError {
    pub issue: String,
    pub test: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub reported: usize,
    pub regressions: usize,
    pub errors: Vec<ReportError>,
}

// ---------------------------------------------------------------------------
// Inner (shared with worker threads)
// ---------------------------------------------------------------------------

struct Inner {
    table: ActionTable,
    registry: CallbackRegistry,
    cx: ReportContext,
    default_status: String,
    // Updates for a single issue must not interleave; one lock per key.
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
    // Status fetched once per issue per run.
    statuses: Mutex<HashMap<String, String>>,
    errors: Mutex<Vec<ReportError>>,
    reported: AtomicUsize,
}

fn lock_or_recover<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl Inner {
    fn issue_lock(&self, key: &str) -> Arc<Mutex<()>> {
        let mut locks = lock_or_recover(&self.locks);
        Arc::clone(locks.entry(key.to_string()).or_default())
    }

    fn record_error(&self, key: &str, test: &str, message: String) {
        tracing::warn!(issue = %key, test = %test, error = %message, "report failed");
        lock_or_recover(&self.errors).push(ReportError {
            issue: key.to_string(),
            test: test.to_string(),
            message,
        });
    }

    /// Current status for the issue: cached, else fetched. Offline runs
    /// assume the configured default status so the rule table still applies.
    fn status_for(&self, key: &str) -> Result<String> {
        if let Some(status) = lock_or_recover(&self.statuses).get(key) {
            return Ok(status.clone());
        }
        let status = match &self.cx.jira {
            Some(jira) => jira.issue(key)?.status,
            None => {
                tracing::debug!(issue = %key, "offline, assuming default status");
                self.default_status.clone()
            }
        };
        lock_or_recover(&self.statuses).insert(key.to_string(), status.clone());
        Ok(status)
    }

    fn dispatch(&self, key: &str, event: &TestEvent) {
        let lock = self.issue_lock(key);
        let _guard = lock_or_recover(&lock);

        let status = match self.status_for(key) {
            Ok(status) => status,
            Err(e) => {
                self.record_error(key, &event.test, e.to_string());
                return;
            }
        };
        let issue = Issue {
            key: key.to_string(),
            status,
        };

        let rule = self
            .table
            .resolve_or_default(event.outcome, &issue.status, &self.default_status);
        let callback = match rule {
            Some(rule) => match self.registry.resolve(&rule.callback) {
                Ok(cb) => cb,
                // Unreachable after startup validation, but never panic here.
                Err(e) => {
                    self.record_error(key, &event.test, e.to_string());
                    return;
                }
            },
            None => match self.registry.resolve("do_nothing") {
                Ok(cb) => cb,
                Err(_) => {
                    tracing::debug!(issue = %issue.key, "no matching rule");
                    return;
                }
            },
        };

        match callback.invoke(&self.cx, &issue, event, &event.message) {
            Ok(()) => {
                self.reported.fetch_add(1, Ordering::SeqCst);
            }
            Err(e) => self.record_error(key, &event.test, e.to_string()),
        }
    }
}

// ---------------------------------------------------------------------------
// Reporter
// ---------------------------------------------------------------------------

/// The plugin core: receives finished-test events from the host runner and
/// forwards them to the tracker according to the action table.
pub struct Reporter {
    inner: Arc<Inner>,
    scanner: KeyScanner,
    pool: WorkerPool,
    online: bool,
}

impl Reporter {
    /// Build a reporter from a validated config. Fails fast on malformed
    /// rules or unregistered callback names; an unreachable server only
    /// downgrades the run to offline.
    pub fn new(config: &Config, registry: CallbackRegistry) -> Result<Self> {
        let jira_cfg = &config.jira;
        let table = config.action_table()?;
        table.validate(&registry)?;
        let scanner = KeyScanner::new(&jira_cfg.mnemonics)?;

        let client = JiraClient::from_config(jira_cfg)?;
        let jira = match client.ping() {
            Ok(()) => Some(client),
            Err(e) => {
                tracing::warn!(server = %jira_cfg.server, error = %e, "jira unreachable, running offline");
                None
            }
        };
        let online = jira.is_some();

        Ok(Self {
            inner: Arc::new(Inner {
                table,
                registry,
                cx: ReportContext {
                    jira,
                    regressions: RegressionLog::new(&jira_cfg.regression_file),
                },
                default_status: jira_cfg.default_status.clone(),
                locks: Mutex::new(HashMap::new()),
                statuses: Mutex::new(HashMap::new()),
                errors: Mutex::new(Vec::new()),
                reported: AtomicUsize::new(0),
            }),
            scanner,
            pool: WorkerPool::new(jira_cfg.reporting_threads),
            online,
        })
    }

    pub fn is_online(&self) -> bool {
        self.online
    }

    /// Handle one finished test: extract issue keys and queue a tracker
    /// update per key. Returns the number of issues queued.
    pub fn report(&self, event: &TestEvent) -> usize {
        let keys = self.scanner.scan_event(&event.description, &event.message);
        if keys.is_empty() {
            tracing::debug!(test = %event.test, "no issue keys in event");
            return 0;
        }
        let queued = keys.len();
        for key in keys {
            let inner = Arc::clone(&self.inner);
            let event = event.clone();
            self.pool.submit(move || inner.dispatch(&key, &event));
        }
        queued
    }

    /// Drain the work queue, write the regression report, and summarize.
    pub fn finish(mut self) -> Result<RunSummary> {
        self.pool.join();
        let inner = &self.inner;
        inner.cx.regressions.write_report()?;
        let errors = lock_or_recover(&inner.errors).clone();
        Ok(RunSummary {
            reported: inner.reported.load(Ordering::SeqCst),
            regressions: inner.cx.regressions.len(),
            errors,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RelayError;
    use crate::registry::Callback;
    use crate::types::TestOutcome;
    use mockito::Matcher;
    use tempfile::TempDir;

    fn config(server: &str, dir: &TempDir, actions: &[&str]) -> Config {
        let mut cfg = Config::default();
        cfg.jira.server = server.to_string();
        cfg.jira.mnemonics = vec!["PROJ".to_string()];
        cfg.jira.actions = actions.iter().map(|s| s.to_string()).collect();
        cfg.jira.regression_file = dir.path().join("regressions.md");
        cfg.jira.reporting_threads = 2;
        cfg
    }

    fn event(test: &str, outcome: TestOutcome, description: &str) -> TestEvent {
        TestEvent {
            test: test.to_string(),
            outcome,
            description: description.to_string(),
            message: "assertion failed".to_string(),
        }
    }

    fn mock_server_info(server: &mut mockito::Server) -> mockito::Mock {
        server
            .mock("GET", "/rest/api/2/serverInfo")
            .with_status(200)
            .with_body("{}")
            .create()
    }

    fn mock_issue(server: &mut mockito::Server, key: &str, status: &str) -> mockito::Mock {
        server
            .mock("GET", format!("/rest/api/2/issue/{key}").as_str())
            .match_query(Matcher::UrlEncoded("fields".into(), "status".into()))
            .with_status(200)
            .with_body(format!(
                r#"{{"key": "{key}", "fields": {{"status": {{"name": "{status}"}}}}}}"#
            ))
            .create()
    }

    struct Counting(AtomicUsize);

    impl Callback for Counting {
        fn invoke(
            &self,
            _cx: &ReportContext,
            _issue: &Issue,
            _event: &TestEvent,
            _message: &str,
        ) -> crate::Result<()> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[test]
    fn regression_reopens_closed_issue() {
        let dir = TempDir::new().unwrap();
        let mut server = mockito::Server::new();
        let _info = mock_server_info(&mut server);
        let _issue = mock_issue(&mut server, "PROJ-1", "Closed");
        let comment = server
            .mock("POST", "/rest/api/2/issue/PROJ-1/comment")
            .with_status(201)
            .with_body("{}")
            .create();
        let _transitions = server
            .mock("GET", "/rest/api/2/issue/PROJ-1/transitions")
            .with_status(200)
            .with_body(r#"{"transitions": [{"id": "3", "name": "Reopen"}]}"#)
            .create();
        let reopen = server
            .mock("POST", "/rest/api/2/issue/PROJ-1/transitions")
            .match_body(Matcher::JsonString(
                r#"{"transition": {"id": "3"}}"#.to_string(),
            ))
            .with_status(204)
            .expect(1)
            .create();

        let cfg = config(&server.url(), &dir, &["failed,Closed,reopen_on_regression"]);
        let reporter = Reporter::new(&cfg, CallbackRegistry::with_defaults()).unwrap();
        assert!(reporter.is_online());

        let queued = reporter.report(&event(
            "test_checkout",
            TestOutcome::Failed,
            "covers PROJ-1 checkout",
        ));
        assert_eq!(queued, 1);

        let summary = reporter.finish().unwrap();
        assert_eq!(summary.reported, 1);
        assert_eq!(summary.regressions, 1);
        assert!(summary.errors.is_empty());

        comment.assert();
        reopen.assert();
        // One line in the append-only log, full report rendered.
        let lines =
            std::fs::read_to_string(dir.path().join("regressions.md.log")).unwrap();
        assert_eq!(lines.lines().count(), 1);
        let report = std::fs::read_to_string(dir.path().join("regressions.md")).unwrap();
        assert!(report.contains("# PROJ-1"));
    }

    #[test]
    fn first_matching_rule_runs_exactly_once() {
        let dir = TempDir::new().unwrap();
        let mut server = mockito::Server::new();
        let _info = mock_server_info(&mut server);
        let _issue = mock_issue(&mut server, "PROJ-5", "Closed");

        let first = Arc::new(Counting(AtomicUsize::new(0)));
        let second = Arc::new(Counting(AtomicUsize::new(0)));
        let mut registry = CallbackRegistry::with_defaults();
        registry.register("first", first.clone()).unwrap();
        registry.register("second", second.clone()).unwrap();

        let cfg = config(
            &server.url(),
            &dir,
            &["failed,Closed,first", "failed,Closed,second"],
        );
        let reporter = Reporter::new(&cfg, registry).unwrap();
        reporter.report(&event("test_a", TestOutcome::Failed, "PROJ-5"));
        let summary = reporter.finish().unwrap();

        assert_eq!(summary.reported, 1);
        assert_eq!(first.0.load(Ordering::SeqCst), 1);
        assert_eq!(second.0.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn offline_run_assumes_default_status() {
        let dir = TempDir::new().unwrap();
        // Nothing listens here; the reporter downgrades to offline.
        let mut cfg = config("http://127.0.0.1:1", &dir, &["failed,Closed,warn_regression"]);
        cfg.jira.default_status = "Closed".to_string();

        let reporter = Reporter::new(&cfg, CallbackRegistry::with_defaults()).unwrap();
        assert!(!reporter.is_online());

        reporter.report(&event("test_b", TestOutcome::Failed, "PROJ-2 flow"));
        let summary = reporter.finish().unwrap();
        assert_eq!(summary.reported, 1);
        assert_eq!(summary.regressions, 1);
        assert!(dir.path().join("regressions.md.log").exists());
    }

    #[test]
    fn unknown_callback_fails_at_startup() {
        let dir = TempDir::new().unwrap();
        let cfg = config("http://127.0.0.1:1", &dir, &["failed,Closed,nonexistent"]);
        let err = Reporter::new(&cfg, CallbackRegistry::with_defaults()).err().unwrap();
        assert!(matches!(err, RelayError::CallbackNotFound(name) if name == "nonexistent"));
    }

    #[test]
    fn tracker_failure_is_reported_not_fatal() {
        let dir = TempDir::new().unwrap();
        let mut server = mockito::Server::new();
        let _info = mock_server_info(&mut server);
        let _issue = mock_issue(&mut server, "PROJ-9", "Closed");
        let _comment = server
            .mock("POST", "/rest/api/2/issue/PROJ-9/comment")
            .with_status(500)
            .create();

        let cfg = config(&server.url(), &dir, &["passed,Closed,write_success_comment"]);
        let reporter = Reporter::new(&cfg, CallbackRegistry::with_defaults()).unwrap();
        reporter.report(&event("test_c", TestOutcome::Passed, "PROJ-9"));
        // An event with no keys is quietly skipped, not an error.
        assert_eq!(
            reporter.report(&event("test_d", TestOutcome::Passed, "no keys here")),
            0
        );
        let summary = reporter.finish().unwrap();

        assert_eq!(summary.reported, 0);
        assert_eq!(summary.errors.len(), 1);
        assert_eq!(summary.errors[0].issue, "PROJ-9");
    }

    #[test]
    fn issue_status_fetched_once_per_run() {
        let dir = TempDir::new().unwrap();
        let mut server = mockito::Server::new();
        let _info = mock_server_info(&mut server);
        let issue = server
            .mock("GET", "/rest/api/2/issue/PROJ-3")
            .match_query(Matcher::UrlEncoded("fields".into(), "status".into()))
            .with_status(200)
            .with_body(r#"{"key": "PROJ-3", "fields": {"status": {"name": "Closed"}}}"#)
            .expect(1)
            .create();

        let cfg = config(&server.url(), &dir, &["passed,Closed,do_nothing"]);
        let reporter = Reporter::new(&cfg, CallbackRegistry::with_defaults()).unwrap();
        reporter.report(&event("test_e", TestOutcome::Passed, "PROJ-3"));
        reporter.report(&event("test_f", TestOutcome::Passed, "PROJ-3 again"));
        let summary = reporter.finish().unwrap();

        assert_eq!(summary.reported, 2);
        issue.assert();
    }
}
