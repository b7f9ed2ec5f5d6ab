use crate::error::Result;
use regex::Regex;

// ---------------------------------------------------------------------------
// KeyScanner
// ---------------------------------------------------------------------------

/// Extracts issue keys (`PROJ-123`) from free-form text.
///
/// The accepted key prefixes ("mnemonics") come from configuration; the
/// scanner compiles them into a single pattern once per run. With no
/// mnemonics configured, nothing ever matches.
#[derive(Debug, Clone)]
pub struct KeyScanner {
    re: Option<Regex>,
}

impl KeyScanner {
    pub fn new(mnemonics: &[String]) -> Result<Self> {
        let prefixes: Vec<String> = mnemonics
            .iter()
            .map(|m| m.trim())
            .filter(|m| !m.is_empty())
            .map(regex::escape)
            .collect();
        if prefixes.is_empty() {
            return Ok(Self { re: None });
        }
        let pattern = format!(r"\b(?:{})-\d+", prefixes.join("|"));
        Ok(Self {
            re: Some(Regex::new(&pattern)?),
        })
    }

    /// All issue keys in `text`, in order of first occurrence, deduplicated.
    pub fn scan(&self, text: &str) -> Vec<String> {
        let Some(re) = &self.re else {
            return Vec::new();
        };
        let mut keys: Vec<String> = Vec::new();
        for m in re.find_iter(text) {
            let key = m.as_str().to_string();
            if !keys.contains(&key) {
                keys.push(key);
            }
        }
        keys
    }

    /// Keys from a test's description and failure message, merged in order.
    pub fn scan_event(&self, description: &str, message: &str) -> Vec<String> {
        let mut keys = self.scan(description);
        for key in self.scan(message) {
            if !keys.contains(&key) {
                keys.push(key);
            }
        }
        keys
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
