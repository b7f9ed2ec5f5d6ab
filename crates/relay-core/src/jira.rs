use crate::config::{AuthMethod, JiraSection};
use crate::error::{RelayError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

// ---------------------------------------------------------------------------
// Issue / Transition
// ---------------------------------------------------------------------------

/// An issue as relay sees it: key plus the status fetched for this run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Issue {
    pub key: String,
    pub status: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Transition {
    pub id: String,
    pub name: String,
}

// Wire shapes for the handful of REST responses relay reads.

#[derive(Deserialize)]
struct IssueResponse {
    key: String,
    fields: IssueFields,
}

#[derive(Deserialize)]
struct IssueFields {
    status: StatusField,
}

#[derive(Deserialize)]
struct StatusField {
    name: String,
}

#[derive(Deserialize)]
struct TransitionsResponse {
    transitions: Vec<Transition>,
}

// ---------------------------------------------------------------------------
// Auth / JiraClient
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub enum Auth {
    Basic { user: String, password: String },
    Token(String),
    Anonymous,
}

/// Thin blocking client for the few Jira REST calls relay performs.
pub struct JiraClient {
    base: String,
    auth: Auth,
    http: reqwest::blocking::Client,
}

impl JiraClient {
    pub fn new(server: &str, auth: Auth) -> Result<Self> {
        let http = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            base: server.trim_end_matches('/').to_string(),
            auth,
            http,
        })
    }

    pub fn from_config(jira: &JiraSection) -> Result<Self> {
        let auth = match jira.auth {
            AuthMethod::Basic => match (&jira.user, &jira.password) {
                (Some(user), Some(password)) => Auth::Basic {
                    user: user.clone(),
                    password: password.clone(),
                },
                _ => Auth::Anonymous,
            },
            AuthMethod::Token => match &jira.token {
                Some(token) => Auth::Token(token.clone()),
                None => Auth::Anonymous,
            },
        };
        Self::new(&jira.server, auth)
    }

    fn request(
        &self,
        method: reqwest::Method,
        url: &str,
    ) -> reqwest::blocking::RequestBuilder {
        let builder = self.http.request(method, url);
        match &self.auth {
            Auth::Basic { user, password } => builder.basic_auth(user, Some(password)),
            Auth::Token(token) => builder.bearer_auth(token),
            Auth::Anonymous => builder,
        }
    }

    /// Cheap connectivity probe, used once at reporter startup.
    pub fn ping(&self) -> Result<()> {
        let url = format!("{}/rest/api/2/serverInfo", self.base);
        let resp = self.request(reqwest::Method::GET, &url).send()?;
        if !resp.status().is_success() {
            return Err(RelayError::UnexpectedStatus {
                status: resp.status().as_u16(),
                url,
            });
        }
        Ok(())
    }

    /// Fetch the issue's current status.
    pub fn issue(&self, key: &str) -> Result<Issue> {
        let url = format!("{}/rest/api/2/issue/{}", self.base, key);
        let resp = self
            .request(reqwest::Method::GET, &url)
            .query(&[("fields", "status")])
            .send()?;
        if resp.status().as_u16() == 404 {
            return Err(RelayError::IssueNotFound(key.to_string()));
        }
        if !resp.status().is_success() {
            return Err(RelayError::UnexpectedStatus {
                status: resp.status().as_u16(),
                url,
            });
        }
        let body: IssueResponse = resp.json()?;
        Ok(Issue {
            key: body.key,
            status: body.fields.status.name,
        })
    }

    pub fn add_comment(&self, key: &str, body: &str) -> Result<()> {
        let url = format!("{}/rest/api/2/issue/{}/comment", self.base, key);
        let resp = self
            .request(reqwest::Method::POST, &url)
            .json(&serde_json::json!({ "body": body }))
            .send()?;
        if !resp.status().is_success() {
            return Err(RelayError::UnexpectedStatus {
                status: resp.status().as_u16(),
                url,
            });
        }
        Ok(())
    }

    /// Workflow transitions available from the issue's current status.
    pub fn transitions(&self, key: &str) -> Result<Vec<Transition>> {
        let url = format!("{}/rest/api/2/issue/{}/transitions", self.base, key);
        let resp = self.request(reqwest::Method::GET, &url).send()?;
        if !resp.status().is_success() {
            return Err(RelayError::UnexpectedStatus {
                status: resp.status().as_u16(),
                url,
            });
        }
        let body: TransitionsResponse = resp.json()?;
        Ok(body.transitions)
    }

    /// Request the transition named `name` (case-insensitive match).
    ///
    /// A name the workflow does not offer from the current status is a
    /// `TransitionNotAvailable` error; callers treat it as reportable, not
    /// fatal.
    pub fn transition(&self, key: &str, name: &str) -> Result<()> {
        let available = self.transitions(key)?;
        let Some(t) = available
            .iter()
            .find(|t| t.name.eq_ignore_ascii_case(name))
        else {
            return Err(RelayError::TransitionNotAvailable {
                issue: key.to_string(),
                name: name.to_string(),
            });
        };
        let url = format!("{}/rest/api/2/issue/{}/transitions", self.base, key);
        let resp = self
            .request(reqwest::Method::POST, &url)
            .json(&serde_json::json!({ "transition": { "id": t.id } }))
            .send()?;
        if !resp.status().is_success() {
            return Err(RelayError::UnexpectedStatus {
                status: resp.status().as_u16(),
                url,
            });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
