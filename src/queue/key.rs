//! Queue key validation

use super::error::{BrokerError, BrokerResult};
use regex::Regex;
use std::fmt;
use std::sync::OnceLock;

fn key_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z0-9]+$").expect("key pattern is a valid regex"))
}

/// A validated, non-empty alphanumeric queue name
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueueKey(String);

impl QueueKey {
    /// Validate a raw key
    pub fn parse(raw: &str) -> BrokerResult<Self> {
        if key_pattern().is_match(raw) {
            Ok(Self(raw.to_string()))
        } else {
            Err(BrokerError::BadArguments(format!("invalid queue key: {:?}", raw)))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for QueueKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
