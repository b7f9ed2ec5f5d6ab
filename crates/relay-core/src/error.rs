use thiserror::Error;

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("config file not found: {0}")]
    ConfigNotFound(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("invalid action rule '{line}': {reason}")]
    InvalidRule { line: String, reason: String },

    #[error("invalid test outcome: {0}")]
    InvalidOutcome(String),

    #[error("callback not registered: {0}")]
    CallbackNotFound(String),

    #[error("callback already registered: {0}")]
    CallbackExists(String),

    #[error("issue not found: {0}")]
    IssueNotFound(String),

    #[error("transition '{name}' not available on {issue} from its current status")]
    TransitionNotAvailable { issue: String, name: String },

    #[error("jira returned {status} for {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("jira request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid mnemonic pattern: {0}")]
    Mnemonics(#[from] regex::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, RelayError>;
