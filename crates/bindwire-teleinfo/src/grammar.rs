//! Static field grammars.
//!
//! A [`Grammar`] lists the fields of one frame variant in wire order.
//! Applying it to parsed [`Groups`] yields a [`Record`] holding one
//! [`Field`] per grammar entry, set or unset.

use serde::Serialize;

use crate::error::{Result, TeleinfoError};
use crate::groups::Groups;

/// Expected type of a field value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Unsigned decimal digits, possibly zero-padded.
    Integer,
    /// Decimal number with an optional fractional part.
    Decimal,
    /// One of a fixed set of tokens.
    Enumerated(&'static [&'static str]),
    /// Free text.
    Text,
}

impl FieldKind {
    pub fn name(&self) -> &'static str {
        match self {
            FieldKind::Integer => "integer",
            FieldKind::Decimal => "decimal",
            FieldKind::Enumerated(_) => "enumerated token",
            FieldKind::Text => "text",
        }
    }
}

/// One entry of a grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    /// Wire label.
    pub key: &'static str,
    pub kind: FieldKind,
    /// Whether the field may be absent from a frame of this variant.
    pub optional: bool,
    /// Zero-padded width used when an integer is written back out.
    pub width: usize,
}

impl FieldSpec {
    pub const fn required(key: &'static str, kind: FieldKind, width: usize) -> Self {
        Self {
            key,
            kind,
            optional: false,
            width,
        }
    }

    pub const fn optional(key: &'static str, kind: FieldKind, width: usize) -> Self {
        Self {
            key,
            kind,
            optional: true,
            width,
        }
    }

    /// Decode a raw value according to this field's kind.
    pub fn decode(&self, raw: &str) -> Result<Value> {
        let mismatch = || TeleinfoError::FieldType {
            key: self.key,
            expected: self.kind.name(),
            raw: raw.to_string(),
        };

        match self.kind {
            FieldKind::Integer => {
                if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
                    return Err(mismatch());
                }
                raw.parse().map(Value::Integer).map_err(|_| mismatch())
            }
            FieldKind::Decimal => {
                let digits = raw.strip_prefix('-').unwrap_or(raw);
                let well_formed = !digits.is_empty()
                    && digits.bytes().filter(|&b| b == b'.').count() <= 1
                    && digits.bytes().all(|b| b.is_ascii_digit() || b == b'.')
                    && digits.bytes().any(|b| b.is_ascii_digit());
                if !well_formed {
                    return Err(mismatch());
                }
                raw.parse().map(Value::Decimal).map_err(|_| mismatch())
            }
            FieldKind::Enumerated(tokens) => tokens
                .iter()
                .find(|&&token| token == raw)
                .map(|&token| Value::Enum(token))
                .ok_or_else(mismatch),
            FieldKind::Text => Ok(Value::Text(raw.to_string())),
        }
    }

    /// Render a value the way it appears on the wire.
    pub fn encode(&self, value: &Value) -> String {
        match value {
            Value::Integer(n) => format!("{n:0width$}", width = self.width),
            Value::Decimal(d) => d.to_string(),
            Value::Enum(token) => (*token).to_string(),
            Value::Text(text) => text.clone(),
        }
    }
}

/// A decoded field value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Integer(i64),
    Decimal(f64),
    Enum(&'static str),
    Text(String),
}

impl Value {
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Enum(token) => Some(token),
            Value::Text(text) => Some(text),
            _ => None,
        }
    }
}

/// One field of a record. An unset field carries neither raw nor decoded value.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub key: &'static str,
    pub raw: Option<String>,
    pub value: Option<Value>,
}

impl Field {
    pub fn unset(key: &'static str) -> Self {
        Self {
            key,
            raw: None,
            value: None,
        }
    }

    pub fn is_set(&self) -> bool {
        self.value.is_some()
    }
}

/// Ordered field list of one frame variant.
#[derive(Debug, Clone, PartialEq)]
pub struct Grammar {
    pub name: &'static str,
    pub fields: &'static [FieldSpec],
}

impl Grammar {
    pub fn spec(&self, key: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|spec| spec.key == key)
    }

    /// Walk the grammar in order and decode each field from `groups`.
    ///
    /// Labels present in `groups` but unknown to the grammar are skipped.
    pub fn apply(&self, groups: &Groups) -> Result<Record> {
        let mut fields = Vec::with_capacity(self.fields.len());
        for spec in self.fields {
            match groups.get(spec.key) {
                Some(raw) => fields.push(Field {
                    key: spec.key,
                    raw: Some(raw.to_string()),
                    value: Some(spec.decode(raw)?),
                }),
                None if spec.optional => fields.push(Field::unset(spec.key)),
                None => {
                    return Err(TeleinfoError::MissingField {
                        key: spec.key,
                        grammar: self.name,
                    })
                }
            }
        }

        for (label, _) in groups.iter() {
            if self.spec(label).is_none() {
                tracing::debug!(label, grammar = self.name, "skipping unsupported label");
            }
        }

        Ok(Record {
            grammar: self.name,
            fields,
        })
    }

    /// Build a record from already-decoded values, rendering raw text from each spec.
    pub fn record(&self, mut lookup: impl FnMut(&'static str) -> Option<Value>) -> Record {
        let fields = self
            .fields
            .iter()
            .map(|spec| match lookup(spec.key) {
                Some(value) => Field {
                    key: spec.key,
                    raw: Some(spec.encode(&value)),
                    value: Some(value),
                },
                None => Field::unset(spec.key),
            })
            .collect();
        Record {
            grammar: self.name,
            fields,
        }
    }
}

/// Decoded fields of one frame, in grammar order.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub grammar: &'static str,
    pub fields: Vec<Field>,
}

impl Record {
    pub fn get(&self, key: &str) -> Option<&Field> {
        self.fields.iter().find(|field| field.key == key)
    }

    /// Decoded value of a field; `None` when the field is unset or unknown.
    pub fn value(&self, key: &str) -> Option<&Value> {
        self.get(key).and_then(|field| field.value.as_ref())
    }

    /// Rebuild the wire groups of every set field.
    pub fn to_groups(&self) -> Groups {
        let mut groups = Groups::new();
        for field in &self.fields {
            if let Some(raw) = &field.raw {
                // Keys come from a grammar, so they are unique.
                let _ = groups.push(field.key, raw.clone());
            }
        }
        groups
    }
}
