use std::collections::BTreeMap;

use serde_json::Value;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RecordError {
    #[error("Record is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Record must be a JSON object, found {0}")]
    NotAnObject(&'static str),
}

/// The per-folder structured record (the email that opened the case).
///
/// `subject` and `body` are pipeline inputs; every other key is kept under
/// `extra` so record content can never shadow pipeline-controlled fields.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CaseRecord {
    pub subject: String,
    pub body: String,
    pub extra: BTreeMap<String, Value>,
}

impl CaseRecord {
    pub fn new(subject: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            body: body.into(),
            extra: BTreeMap::new(),
        }
    }

    /// Parses a flat JSON object. Missing `subject`/`body` read as empty;
    /// non-string values are rendered as JSON text.
    pub fn from_json(bytes: &[u8]) -> Result<Self, RecordError> {
        let value: Value = serde_json::from_slice(bytes)?;
        let Value::Object(map) = value else {
            return Err(RecordError::NotAnObject(json_kind(&value)));
        };

        let mut record = CaseRecord::default();
        for (key, value) in map {
            match key.as_str() {
                "subject" => record.subject = value_text(value),
                "body" => record.body = value_text(value),
                _ => {
                    record.extra.insert(key, value);
                }
            }
        }
        Ok(record)
    }

    /// Serializes back to a flat object, extras alongside subject and body.
    pub fn to_json(&self) -> Result<Vec<u8>, RecordError> {
        let mut map = serde_json::Map::new();
        for (key, value) in &self.extra {
            map.insert(key.clone(), value.clone());
        }
        map.insert("subject".to_string(), Value::String(self.subject.clone()));
        map.insert("body".to_string(), Value::String(self.body.clone()));
        Ok(serde_json::to_vec_pretty(&Value::Object(map))?)
    }

    /// Text handed to the content classifier and the amendment analysis.
    pub fn combined_text(&self) -> String {
        format!("Subject: {}\n\nBody:\n{}", self.subject, self.body)
    }
}

fn value_text(value: Value) -> String {
    match value {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
