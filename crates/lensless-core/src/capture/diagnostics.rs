use std::collections::BTreeMap;

use crate::consts::MIN_DIAGNOSTIC_LINE_LEN;
use crate::error::{LenslessError, Result};

/// `Key: value` fields printed by the remote capture script.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CaptureDiagnostics {
    fields: BTreeMap<String, String>,
}

impl CaptureDiagnostics {
    /// Parse script output. Short lines are dropped, each remaining line is
    /// split on its first colon, and later duplicates overwrite earlier ones.
    pub fn parse(output: &str) -> Self {
        let mut fields = BTreeMap::new();
        for line in output.lines() {
            if line.chars().count() <= MIN_DIAGNOSTIC_LINE_LEN {
                continue;
            }
            let (key, value) = line.split_once(':').unwrap_or((line, ""));
            fields.insert(key.trim().to_string(), value.trim().to_string());
        }
        Self { fields }
    }

    pub fn from_bytes(stdout: &[u8]) -> Self {
        Self::parse(&String::from_utf8_lossy(stdout))
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    /// Parse a numeric field such as `Red gain`.
    pub fn gain(&self, key: &str) -> Result<f64> {
        let raw = self.get(key).ok_or_else(|| {
            LenslessError::RemoteExecution(format!("capture output has no '{key}' field"))
        })?;
        raw.parse().map_err(|_| {
            LenslessError::RemoteExecution(format!("'{key}' is not a number: '{raw}'"))
        })
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}
