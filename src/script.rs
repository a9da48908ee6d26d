//! Fragment scripts: TOML documents describing a fragment stream
//!
//! ```toml
//! fragments = ["0.000", 7, { bytes = "Ynl0ZXM=" }, { undefined = "name" },
//!              { null = true }, { tuple = [1, 2] }]
//! ```
//!
//! Strings, integers, floats, booleans and arrays map to the matching value
//! kinds. Single-key inline tables cover the kinds TOML has no syntax for.

use base64::Engine;
use serde::Deserialize;
use thiserror::Error;

use crate::value::{Undefined, Value};

/// Errors that can occur when loading a fragment script
#[derive(Error, Debug)]
pub enum ScriptError {
    #[error("Failed to parse fragment script: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("invalid base64 in bytes fragment: {0}")]
    InvalidBytes(#[from] base64::DecodeError),

    #[error("fragment {index}: {message}")]
    InvalidFragment { index: usize, message: String },
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct Script {
    fragments: Vec<toml::Value>,
}

/// Parse a fragment script into the values it describes
pub fn parse_script(source: &str) -> Result<Vec<Value>, ScriptError> {
    let script: Script = toml::from_str(source)?;
    script
        .fragments
        .iter()
        .enumerate()
        .map(|(index, item)| {
            to_value(item).map_err(|err| match err {
                FragmentError::Script(err) => err,
                FragmentError::Invalid(message) => ScriptError::InvalidFragment { index, message },
            })
        })
        .collect()
}

enum FragmentError {
    Script(ScriptError),
    Invalid(String),
}

impl From<base64::DecodeError> for FragmentError {
    fn from(err: base64::DecodeError) -> Self {
        FragmentError::Script(err.into())
    }
}

fn to_value(item: &toml::Value) -> Result<Value, FragmentError> {
    Ok(match item {
        toml::Value::String(s) => Value::String(s.clone()),
        toml::Value::Integer(i) => Value::Integer(*i),
        toml::Value::Float(f) => Value::Float(*f),
        toml::Value::Boolean(b) => Value::Boolean(*b),
        toml::Value::Array(items) => Value::Sequence(to_values(items)?),
        toml::Value::Datetime(_) => {
            return Err(FragmentError::Invalid(
                "datetimes have no fragment equivalent".to_string(),
            ))
        }
        toml::Value::Table(table) => {
            let mut entries = table.iter();
            let (key, inner) = match (entries.next(), entries.next()) {
                (Some(entry), None) => entry,
                _ => {
                    return Err(FragmentError::Invalid(
                        "inline tables must have exactly one key".to_string(),
                    ))
                }
            };
            match (key.as_str(), inner) {
                ("bytes", toml::Value::String(encoded)) => Value::Bytes(
                    base64::engine::general_purpose::STANDARD.decode(encoded)?,
                ),
                ("undefined", toml::Value::String(name)) => {
                    Value::Undefined(Undefined::missing(name.as_str()))
                }
                ("null", _) => Value::Null,
                ("tuple", toml::Value::Array(items)) => Value::Tuple(to_values(items)?),
                (key, _) => {
                    return Err(FragmentError::Invalid(format!(
                        "unsupported fragment table '{}'",
                        key
                    )))
                }
            }
        }
    })
}

fn to_values(items: &[toml::Value]) -> Result<Vec<Value>, FragmentError> {
    items.iter().map(to_value).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_plain_fragments() {
        let values = parse_script(r#"fragments = ["0.000", 7, 1.5, true, [1, "a"]]"#).unwrap();
        assert_eq!(
            values,
            vec![
                Value::from("0.000"),
                Value::Integer(7),
                Value::Float(1.5),
                Value::Boolean(true),
                Value::Sequence(vec![Value::Integer(1), Value::from("a")]),
            ]
        );
    }

    #[test]
    fn test_table_fragments() {
        let values = parse_script(
            r#"fragments = [{ bytes = "Ynl0ZXM=" }, { null = true }, { tuple = [1, 2] }, { undefined = "name" }]"#,
        )
        .unwrap();
        assert_eq!(values[0], Value::Bytes(b"bytes".to_vec()));
        assert_eq!(values[1], Value::Null);
        assert_eq!(values[2], Value::Tuple(vec![Value::Integer(1), Value::Integer(2)]));
        assert_eq!(values[3], Value::Undefined(Undefined::missing("name")));
    }

    #[test]
    fn test_invalid_table() {
        let err = parse_script(r#"fragments = [1, { map = 3 }]"#).unwrap_err();
        assert!(matches!(err, ScriptError::InvalidFragment { index: 1, .. }));
    }

    #[test]
    fn test_invalid_base64() {
        let err = parse_script(r#"fragments = [{ bytes = "***" }]"#).unwrap_err();
        assert!(matches!(err, ScriptError::InvalidBytes(_)));
    }

    #[test]
    fn test_missing_fragments_key() {
        assert!(matches!(
            parse_script("other = 1"),
            Err(ScriptError::ParseError(_))
        ));
    }
}
