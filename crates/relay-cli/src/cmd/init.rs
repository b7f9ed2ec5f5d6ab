use relay_core::io::write_if_missing;
use std::path::Path;

const STARTER_CONFIG: &str = r#"# jira-relay configuration
jira:
  server: https://jira.example.com
  auth: basic            # basic | token
  user: automation
  password: change-me
  # token: "..."         # used when auth: token

  # Report on every run; set false to require `relay report --enable`.
  always_on: true

  # Issue-key prefixes to look for in test descriptions and failures.
  mnemonics: [PROJ]

  # outcome,issue status,callback. Evaluated in order, first match wins.
  actions:
    - "failed,Closed,reopen_on_regression"
    - "failed,In qualification,write_failure_and_back_in_dev"
    - "passed,In qualification,write_success_comment"

  regression_file: jira_regression.md
  reporting_threads: 2
  default_status: In Development
"#;

pub fn run(config_path: &Path) -> anyhow::Result<()> {
    let written = write_if_missing(config_path, STARTER_CONFIG.as_bytes())?;
    if written {
        println!("wrote {}", config_path.display());
    } else {
        println!("{} already exists, leaving it alone", config_path.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use relay_core::config::Config;
    use relay_core::registry::CallbackRegistry;

    #[test]
    fn starter_config_is_valid() {
        let cfg: Config = serde_yaml::from_str(STARTER_CONFIG).unwrap();
        let registry = CallbackRegistry::with_defaults();
        let warnings = cfg.validate(&registry).unwrap();
        assert!(warnings.is_empty(), "starter config warns: {warnings:?}");
        assert_eq!(cfg.jira.mnemonics, vec!["PROJ"]);
        assert_eq!(cfg.jira.reporting_threads, 2);
    }
}
