use crate::output::print_json;
use anyhow::Context;
use relay_core::config::Config;
use relay_core::registry::CallbackRegistry;
use serde::Serialize;
use std::path::Path;

#[derive(Serialize)]
struct ValidateReport {
    ok: bool,
    warnings: Vec<String>,
}

pub fn run(config_path: &Path, json: bool) -> anyhow::Result<()> {
    let cfg = Config::load(config_path)
        .with_context(|| format!("cannot load config '{}'", config_path.display()))?;
    let registry = CallbackRegistry::with_defaults();
    let warnings = cfg
        .validate(&registry)
        .context("configuration is invalid")?;

    let messages: Vec<String> = warnings.into_iter().map(|w| w.message).collect();
    if json {
        print_json(&ValidateReport {
            ok: true,
            warnings: messages,
        })?;
    } else {
        for message in &messages {
            println!("warning: {message}");
        }
        println!("configuration ok");
    }
    Ok(())
}
