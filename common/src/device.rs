//! # Instrument Status Payload
//!
//! The diagnostic command on the instrument prints a JSON document such as
//!
//! ```json
//! {"instruments":[{"serial_number":"ABC123","model":"Versiv 2","software_versions":["6.5"]}]}
//! ```
//!
//! Only the first entry of `instruments` is looked at. A document that lacks a
//! non-empty `serial_number` is rejected rather than reported as a device.

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SysInfo {
    pub serial_number: String,
    pub model: Option<String>,
    pub software_versions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PayloadError {
    #[error("output is not JSON: {0}")]
    NotJson(String),
    #[error("no instrument record in output")]
    NoInstrument,
    #[error("instrument record has no serial_number")]
    MissingSerial,
}

#[derive(Debug, Deserialize)]
struct Document {
    #[serde(default)]
    instruments: Option<Vec<InstrumentRecord>>,
    #[serde(flatten)]
    inline: InstrumentRecord,
}

#[derive(Debug, Default, Deserialize)]
struct InstrumentRecord {
    #[serde(default)]
    serial_number: Option<Value>,
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    software_versions: Option<Value>,
}

impl SysInfo {
    /// Parses the raw output of the diagnostic command.
    ///
    /// Anything printed before the payload (login banners, MOTD) is skipped, and
    /// so is anything after the first complete object. Each `{` is tried in turn,
    /// so braces inside a banner do not hide the document that follows.
    pub fn parse(raw: &str) -> Result<SysInfo, PayloadError> {
        let mut first_error: Option<PayloadError> = None;
        let mut parsed_until: usize = 0;
        for (start, _) in raw.match_indices('{') {
            if start < parsed_until {
                continue;
            }
            let mut stream = serde_json::Deserializer::from_str(&raw[start..]).into_iter::<Document>();
            let error = match stream.next() {
                Some(Ok(document)) => {
                    parsed_until = start + stream.byte_offset();
                    match SysInfo::from_document(document) {
                        Ok(info) => return Ok(info),
                        Err(e) => e,
                    }
                }
                Some(Err(e)) => PayloadError::NotJson(e.to_string()),
                None => continue,
            };
            // A parsed document outranks text that merely started with `{`.
            let keep = matches!(&first_error, Some(kept) if !matches!(kept, PayloadError::NotJson(_)))
                || (first_error.is_some() && matches!(error, PayloadError::NotJson(_)));
            if !keep {
                first_error = Some(error);
            }
        }
        Err(first_error.unwrap_or_else(|| PayloadError::NotJson("no JSON object".into())))
    }

    fn from_document(document: Document) -> Result<SysInfo, PayloadError> {
        let record = match document.instruments {
            Some(instruments) => instruments.into_iter().next().ok_or(PayloadError::NoInstrument)?,
            None => document.inline,
        };

        let serial_number = record
            .serial_number
            .and_then(version_text)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .ok_or(PayloadError::MissingSerial)?;

        let model = record
            .model
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty());

        Ok(SysInfo {
            serial_number,
            model,
            software_versions: record
                .software_versions
                .map(flatten_versions)
                .unwrap_or_default(),
        })
    }
}

fn flatten_versions(value: Value) -> Vec<String> {
    match value {
        Value::Array(items) => items.into_iter().filter_map(version_text).collect(),
        Value::Object(map) => map
            .into_iter()
            .filter_map(|(name, version)| version_text(version).map(|v| format!("{name} {v}")))
            .collect(),
        other => version_text(other).into_iter().collect(),
    }
}

fn version_text(value: Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
