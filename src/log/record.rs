// src/log/record.rs

//! Decoded log records as emitted by org-node with `--log-format gcp`.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Severity of a log record.
///
/// Only the exact upper-case spellings map to the named variants. Anything
/// else is kept verbatim so re-serialising a record never alters it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Severity {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
    Other(String),
}

impl Severity {
    pub fn as_str(&self) -> &str {
        match self {
            Severity::Trace => "TRACE",
            Severity::Debug => "DEBUG",
            Severity::Info => "INFO",
            Severity::Warn => "WARN",
            Severity::Error => "ERROR",
            Severity::Other(s) => s,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Severity::Error)
    }
}

impl From<String> for Severity {
    fn from(s: String) -> Self {
        match s.as_str() {
            "TRACE" => Severity::Trace,
            "DEBUG" => Severity::Debug,
            "INFO" => Severity::Info,
            "WARN" => Severity::Warn,
            "ERROR" => Severity::Error,
            _ => Severity::Other(s),
        }
    }
}

impl From<Severity> for String {
    fn from(s: Severity) -> Self {
        match s {
            Severity::Other(s) => s,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One structured log record.
///
/// `severity` and `message` are required; every other field is carried in
/// `fields` untouched and written back out when the record is serialised.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogRecord {
    pub severity: Severity,
    pub message: String,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl LogRecord {
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
            fields: Map::new(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity.is_error()
    }

    /// Single-line JSON rendering used by the echo sink.
    pub fn to_json_line(&self) -> String {
        // Serialising a struct of strings and JSON values cannot fail.
        serde_json::to_string(self).unwrap_or_else(|_| self.message.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_severity_is_preserved() {
        let rec: LogRecord =
            serde_json::from_str(r#"{"severity":"NOTICE","message":"hi"}"#).unwrap();
        assert_eq!(rec.severity, Severity::Other("NOTICE".to_string()));
        assert!(rec.to_json_line().contains(r#""severity":"NOTICE""#));
    }

    #[test]
    fn severity_match_is_case_sensitive() {
        let rec: LogRecord =
            serde_json::from_str(r#"{"severity":"error","message":"lower"}"#).unwrap();
        assert!(!rec.is_error());

        let rec: LogRecord =
            serde_json::from_str(r#"{"severity":"ERROR","message":"upper"}"#).unwrap();
        assert!(rec.is_error());
    }

    #[test]
    fn extra_fields_pass_through() {
        let line = r#"{"severity":"INFO","message":"m","target":"org_node","span":{"id":3}}"#;
        let rec: LogRecord = serde_json::from_str(line).unwrap();
        assert_eq!(rec.fields.get("target"), Some(&Value::from("org_node")));

        let back: Value = serde_json::from_str(&rec.to_json_line()).unwrap();
        let orig: Value = serde_json::from_str(line).unwrap();
        assert_eq!(back, orig);
    }
}
