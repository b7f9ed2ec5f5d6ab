use crate::ingest::load_events;
use crate::output::print_json;
use anyhow::Context;
use relay_core::config::Config;
use relay_core::registry::CallbackRegistry;
use relay_core::reporter::Reporter;
use std::path::Path;

pub fn run(config_path: &Path, results: &Path, enable: bool, json: bool) -> anyhow::Result<()> {
    let cfg = Config::load(config_path)
        .with_context(|| format!("cannot load config '{}'", config_path.display()))?;

    if !cfg.jira.always_on && !enable {
        println!("reporting disabled by config (always_on: false); pass --enable to force");
        return Ok(());
    }

    let registry = CallbackRegistry::with_defaults();
    let warnings = cfg
        .validate(&registry)
        .context("configuration is invalid")?;
    for warning in &warnings {
        tracing::warn!("{}", warning.message);
    }

    // Read the results before touching the network so a bad path fails fast.
    let events = load_events(results)?;

    let reporter = Reporter::new(&cfg, registry)?;
    if !reporter.is_online() {
        eprintln!("warning: jira unreachable, running offline");
    }
    let mut queued = 0;
    for event in &events {
        queued += reporter.report(event);
    }
    let summary = reporter.finish()?;

    if json {
        print_json(&summary)?;
    } else {
        println!(
            "{} events, {} issue updates queued, {} reported, {} regressions, {} errors",
            events.len(),
            queued,
            summary.reported,
            summary.regressions,
            summary.errors.len()
        );
        for err in &summary.errors {
            println!("  {}: {} ({})", err.issue, err.message, err.test);
        }
    }
    // Per-issue tracker failures are reported above but never fail the run.
    Ok(())
}
