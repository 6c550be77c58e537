//! Sample keys and the schema describing them.
//!
//! A kinship matrix is indexed by sample keys. Most datasets use plain string
//! identifiers, but keys may also be integers or structured records (for
//! example a sample name plus a batch number). The schema is only used to
//! validate keys and convert them to their external string form; it never
//! changes sample order.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{KinshipError, Result};

/// A raw sample key as stored alongside the matrix.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SampleKey {
    Str(String),
    Int(i64),
    Struct(Vec<SampleKey>),
}

impl From<&str> for SampleKey {
    fn from(s: &str) -> Self {
        SampleKey::Str(s.to_string())
    }
}

impl From<String> for SampleKey {
    fn from(s: String) -> Self {
        SampleKey::Str(s)
    }
}

impl From<i64> for SampleKey {
    fn from(v: i64) -> Self {
        SampleKey::Int(v)
    }
}

/// A named field of a structured key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyField {
    pub name: String,
    pub schema: KeySchema,
}

impl KeyField {
    pub fn new(name: &str, schema: KeySchema) -> Self {
        Self {
            name: name.to_string(),
            schema,
        }
    }
}

/// Type descriptor of the sample key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeySchema {
    String,
    Int32,
    Int64,
    Struct(Vec<KeyField>),
}

impl KeySchema {
    /// Whether keys of this schema are plain strings.
    pub fn is_string(&self) -> bool {
        matches!(self, KeySchema::String)
    }

    /// Check that `key` conforms to this schema.
    ///
    /// # Errors
    /// Returns `KinshipError::SampleKey` describing the first mismatch.
    pub fn check(&self, key: &SampleKey) -> Result<()> {
        match (self, key) {
            (KeySchema::String, SampleKey::Str(_)) => Ok(()),
            (KeySchema::Int64, SampleKey::Int(_)) => Ok(()),
            (KeySchema::Int32, SampleKey::Int(v)) => {
                if i32::try_from(*v).is_ok() {
                    Ok(())
                } else {
                    Err(KinshipError::SampleKey(format!(
                        "value {} does not fit in Int32",
                        v
                    )))
                }
            }
            (KeySchema::Struct(fields), SampleKey::Struct(values)) => {
                if fields.len() != values.len() {
                    return Err(KinshipError::SampleKey(format!(
                        "struct key has {} fields but schema {} has {}",
                        values.len(),
                        self,
                        fields.len()
                    )));
                }
                for (field, value) in fields.iter().zip(values) {
                    field.schema.check(value).map_err(|e| match e {
                        KinshipError::SampleKey(msg) => {
                            KinshipError::SampleKey(format!("field '{}': {}", field.name, msg))
                        }
                        other => other,
                    })?;
                }
                Ok(())
            }
            (schema, key) => Err(KinshipError::SampleKey(format!(
                "key {:?} does not match schema {}",
                key, schema
            ))),
        }
    }

    /// Convert a key to its external string representation.
    ///
    /// Strings are returned verbatim, integers in decimal, and structs as a
    /// compact JSON object with fields in schema order. The key is assumed to
    /// have passed [`KeySchema::check`].
    pub fn to_external(&self, key: &SampleKey) -> String {
        match key {
            SampleKey::Str(s) => s.clone(),
            SampleKey::Int(v) => v.to_string(),
            SampleKey::Struct(_) => self.to_json(key).to_string(),
        }
    }

    fn to_json(&self, key: &SampleKey) -> Value {
        match (self, key) {
            (KeySchema::Struct(fields), SampleKey::Struct(values)) => {
                let mut map = Map::new();
                for (field, value) in fields.iter().zip(values) {
                    map.insert(field.name.clone(), field.schema.to_json(value));
                }
                Value::Object(map)
            }
            (_, SampleKey::Str(s)) => Value::String(s.clone()),
            (_, SampleKey::Int(v)) => Value::from(*v),
            (_, SampleKey::Struct(values)) => {
                Value::Array(values.iter().map(|v| KeySchema::String.to_json(v)).collect())
            }
        }
    }
}

impl fmt::Display for KeySchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeySchema::String => write!(f, "String"),
            KeySchema::Int32 => write!(f, "Int32"),
            KeySchema::Int64 => write!(f, "Int64"),
            KeySchema::Struct(fields) => {
                write!(f, "Struct{{")?;
                for (i, field) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{}:{}", field.name, field.schema)?;
                }
                write!(f, "}}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_batch_schema() -> KeySchema {
        KeySchema::Struct(vec![
            KeyField::new("s", KeySchema::String),
            KeyField::new("batch", KeySchema::Int32),
        ])
    }

    #[test]
    fn test_string_key_roundtrips_verbatim() {
        let key = SampleKey::from("NA12878");
        KeySchema::String.check(&key).unwrap();
        assert_eq!(KeySchema::String.to_external(&key), "NA12878");
    }

    #[test]
    fn test_int32_range_checked() {
        assert!(KeySchema::Int32.check(&SampleKey::Int(42)).is_ok());
        assert!(KeySchema::Int32.check(&SampleKey::Int(i64::from(i32::MAX) + 1)).is_err());
        assert!(KeySchema::Int64.check(&SampleKey::Int(i64::from(i32::MAX) + 1)).is_ok());
        assert_eq!(KeySchema::Int64.to_external(&SampleKey::Int(-7)), "-7");
    }

    #[test]
    fn test_struct_key_renders_fields_in_schema_order() {
        let schema = sample_batch_schema();
        let key = SampleKey::Struct(vec!["A".into(), SampleKey::Int(3)]);
        schema.check(&key).unwrap();
        assert_eq!(schema.to_external(&key), r#"{"s":"A","batch":3}"#);
    }

    #[test]
    fn test_struct_key_arity_mismatch() {
        let schema = sample_batch_schema();
        let key = SampleKey::Struct(vec!["A".into()]);
        let err = schema.check(&key).unwrap_err();
        assert!(format!("{}", err).contains("1 fields"));
    }

    #[test]
    fn test_struct_field_type_mismatch_names_field() {
        let schema = sample_batch_schema();
        let key = SampleKey::Struct(vec!["A".into(), "x".into()]);
        let msg = format!("{}", schema.check(&key).unwrap_err());
        assert!(msg.contains("field 'batch'"), "got: {}", msg);
    }

    #[test]
    fn test_kind_mismatch() {
        assert!(KeySchema::String.check(&SampleKey::Int(1)).is_err());
        assert!(KeySchema::Int64.check(&"1".into()).is_err());
    }

    #[test]
    fn test_display_signature() {
        assert_eq!(sample_batch_schema().to_string(), "Struct{s:String,batch:Int32}");
        assert!(KeySchema::String.is_string());
        assert!(!sample_batch_schema().is_string());
    }
}
