use crate::error::{RelayError, Result};
use crate::registry::CallbackRegistry;
use crate::rules::ActionTable;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// AuthMethod
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthMethod {
    #[default]
    Basic,
    Token,
}

// ---------------------------------------------------------------------------
// JiraSection
// ---------------------------------------------------------------------------

/// The `jira:` section of the config file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JiraSection {
    #[serde(default = "default_server")]
    pub server: String,

    #[serde(default)]
    pub auth: AuthMethod,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub token: Option<String>,

    /// Report on every run without an explicit opt-in flag.
    #[serde(default = "default_always_on", alias = "always-on")]
    pub always_on: bool,

    /// Issue-key prefixes recognized in test descriptions and failures.
    #[serde(default)]
    pub mnemonics: Vec<String>,

    /// Ordered rule lines, `outcome,status,callback`. First match wins.
    #[serde(default)]
    pub actions: Vec<String>,

    #[serde(default = "default_regression_file")]
    pub regression_file: PathBuf,

    #[serde(default = "default_reporting_threads")]
    pub reporting_threads: usize,

    /// Status assumed when an issue's actual status has no explicit rule.
    #[serde(default = "default_status")]
    pub default_status: String,
}

fn default_server() -> String {
    "https://jira.example.com".to_string()
}

fn default_always_on() -> bool {
    true
}

fn default_regression_file() -> PathBuf {
    PathBuf::from("jira_regression.md")
}

fn default_reporting_threads() -> usize {
    1
}

fn default_status() -> String {
    "In Development".to_string()
}

impl Default for JiraSection {
    fn default() -> Self {
        Self {
            server: default_server(),
            auth: AuthMethod::default(),
            user: None,
            password: None,
            token: None,
            always_on: default_always_on(),
            mnemonics: Vec::new(),
            actions: Vec::new(),
            regression_file: default_regression_file(),
            reporting_threads: default_reporting_threads(),
            default_status: default_status(),
        }
    }
}

// ---------------------------------------------------------------------------
// Config (top-level)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub jira: JiraSection,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConfigWarning {
    pub message: String,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(RelayError::ConfigNotFound(path.display().to_string()));
        }
        let data = std::fs::read_to_string(path)?;
        let cfg: Config = serde_yaml::from_str(&data)?;
        Ok(cfg)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let data = serde_yaml::to_string(self)?;
        crate::io::atomic_write(path, data.as_bytes())
    }

    /// Parse the `actions` lines into an ordered table.
    pub fn action_table(&self) -> Result<ActionTable> {
        ActionTable::parse(&self.jira.actions)
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    /// Startup validation. Malformed rules and unregistered callback names
    /// are hard errors; suspicious-but-workable settings come back as
    /// warnings.
    pub fn validate(&self, registry: &CallbackRegistry) -> Result<Vec<ConfigWarning>> {
        let table = self.action_table()?;
        table.validate(registry)?;

        let mut warnings = Vec::new();
        let jira = &self.jira;

        if jira.mnemonics.iter().all(|m| m.trim().is_empty()) {
            warnings.push(ConfigWarning {
                message: "no mnemonics configured: no issue key will ever match".to_string(),
            });
        }
        if table.is_empty() {
            warnings.push(ConfigWarning {
                message: "no action rules configured: every event falls through to do_nothing"
                    .to_string(),
            });
        }
        if jira.reporting_threads == 0 {
            warnings.push(ConfigWarning {
                message: "reporting_threads is 0, clamped to 1".to_string(),
            });
        }
        match jira.auth {
            AuthMethod::Basic => {
                if jira.user.is_none() || jira.password.is_none() {
                    warnings.push(ConfigWarning {
                        message: "basic auth without user/password: connection will be anonymous"
                            .to_string(),
                    });
                }
            }
            AuthMethod::Token => {
                if jira.token.is_none() {
                    warnings.push(ConfigWarning {
                        message: "token auth without a token: connection will be anonymous"
                            .to_string(),
                    });
                }
            }
        }

        Ok(warnings)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
