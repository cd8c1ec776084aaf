//! The untyped value surface: what schemaless reads produce, what the
//! extension-data member stores, and the target of runtime-decision
//! dispatch (serialization switches on the actual variant).

use std::collections::BTreeMap;

use crate::decimal::Decimal;
use crate::error::{JsonError, JsonErrorKind};
use crate::escape::write_quoted;
use crate::reader::JsonReader;
use crate::resolver::{JsonResolver, NumberMode};
use crate::scalar::{parse_f64, write_f64};
use crate::shape::{JsonShape, Shape};
use crate::symbol::Sym;
use crate::writer::JsonWriter;

pub type JsonMap = BTreeMap<String, JsonValue>;

/// Numeric payload of an untyped value. The representation is chosen by
/// the resolver's number mode at read time.
#[derive(Debug, Clone, PartialEq)]
pub enum JsonNumber {
    Double(f64),
    Decimal(Decimal),
    /// The validated literal text, untouched.
    Literal(Box<str>),
}

/// Any JSON value, as defined by RFC 8259.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum JsonValue {
    #[default]
    Null,
    Bool(bool),
    Number(JsonNumber),
    String(String),
    Array(Vec<JsonValue>),
    Object(JsonMap),
}

impl JsonValue {
    pub fn is_null(&self) -> bool {
        matches!(self, JsonValue::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            JsonValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            JsonValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            JsonValue::Number(JsonNumber::Double(x)) => Some(*x),
            _ => None,
        }
    }

    /// Member lookup on an object value.
    pub fn get(&self, key: &str) -> Option<&JsonValue> {
        match self {
            JsonValue::Object(map) => map.get(key),
            _ => None,
        }
    }

    /// Index into an array value.
    pub fn at(&self, index: usize) -> Option<&JsonValue> {
        match self {
            JsonValue::Array(items) => items.get(index),
            _ => None,
        }
    }
}

impl From<bool> for JsonValue {
    fn from(v: bool) -> Self {
        JsonValue::Bool(v)
    }
}

impl From<f64> for JsonValue {
    fn from(v: f64) -> Self {
        JsonValue::Number(JsonNumber::Double(v))
    }
}

impl From<&str> for JsonValue {
    fn from(v: &str) -> Self {
        JsonValue::String(v.to_owned())
    }
}

impl From<String> for JsonValue {
    fn from(v: String) -> Self {
        JsonValue::String(v)
    }
}

impl From<Vec<JsonValue>> for JsonValue {
    fn from(v: Vec<JsonValue>) -> Self {
        JsonValue::Array(v)
    }
}

impl From<JsonMap> for JsonValue {
    fn from(v: JsonMap) -> Self {
        JsonValue::Object(v)
    }
}

pub(crate) fn write_value<S: Sym>(
    w: &mut JsonWriter<S>,
    value: &JsonValue,
    resolver: &JsonResolver,
) -> Result<(), JsonError> {
    match value {
        JsonValue::Null => w.null(),
        JsonValue::Bool(true) => w.raw_str("true"),
        JsonValue::Bool(false) => w.raw_str("false"),
        JsonValue::Number(JsonNumber::Double(x)) => write_f64(w, *x)?,
        JsonValue::Number(JsonNumber::Decimal(d)) => w.raw_str(&d.to_string()),
        JsonValue::Number(JsonNumber::Literal(text)) => w.raw_str(text),
        JsonValue::String(s) => write_quoted(w, s, resolver.escape_mode()),
        JsonValue::Array(items) => {
            w.begin_array()?;
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    w.value_separator();
                }
                write_value(w, item, resolver)?;
            }
            w.end_array();
        }
        JsonValue::Object(map) => {
            w.begin_object()?;
            for (i, (key, item)) in map.iter().enumerate() {
                if i > 0 {
                    w.value_separator();
                }
                write_quoted(w, key, resolver.escape_mode());
                w.name_separator();
                write_value(w, item, resolver)?;
            }
            w.end_object();
        }
    }
    Ok(())
}

pub(crate) fn read_value<S: Sym>(
    rd: &mut JsonReader<'_, S>,
    resolver: &JsonResolver,
) -> Result<JsonValue, JsonError> {
    match rd.peek_after_ws()? {
        u if u == b'{' as u32 => {
            rd.expect_object_start()?;
            let mut map = JsonMap::new();
            if rd.end_if_empty(true)? {
                return Ok(JsonValue::Object(map));
            }
            loop {
                let name = rd.read_property_name_units()?;
                let key = S::decode_owned(&name).map_err(|kind| rd.err(kind))?;
                rd.expect_colon()?;
                let item = read_value(rd, resolver)?;
                map.insert(key, item);
                if rd.comma_or_end_object()? {
                    return Ok(JsonValue::Object(map));
                }
            }
        }
        u if u == b'[' as u32 => {
            rd.expect_array_start()?;
            let mut items = Vec::new();
            if rd.end_if_empty(false)? {
                return Ok(JsonValue::Array(items));
            }
            loop {
                items.push(read_value(rd, resolver)?);
                if rd.comma_or_end_array()? {
                    return Ok(JsonValue::Array(items));
                }
            }
        }
        u if u == b'"' as u32 => Ok(JsonValue::String(rd.read_string()?)),
        u if u == b't' as u32 || u == b'f' as u32 => Ok(JsonValue::Bool(rd.read_bool()?)),
        u if u == b'n' as u32 => {
            rd.read_null()?;
            Ok(JsonValue::Null)
        }
        u if u == b'-' as u32 || (b'0' as u32..=b'9' as u32).contains(&u) => {
            let lex = rd.read_number_lex()?;
            let number = match resolver.number_mode() {
                NumberMode::Double => JsonNumber::Double(parse_f64(&lex.text).map_err(
                    |kind| rd.err(kind).while_parsing("number"),
                )?),
                NumberMode::Decimal => JsonNumber::Decimal(
                    Decimal::parse(&lex.text)
                        .map_err(|kind| rd.err(kind).while_parsing("decimal"))?,
                ),
                NumberMode::Literal => JsonNumber::Literal(lex.text.into()),
            };
            Ok(JsonValue::Number(number))
        }
        _ => Err(rd.err(JsonErrorKind::UnexpectedCharacter)),
    }
}

impl JsonShape for JsonValue {
    fn shape<S: Sym>() -> Shape<Self, S> {
        Shape::codec(
            |w, v: &JsonValue, resolver| write_value(w, v, resolver),
            |rd: &mut JsonReader<'_, S>, resolver| read_value(rd, resolver),
        )
    }

    fn is_null(&self) -> bool {
        JsonValue::is_null(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accessors() {
        let v = JsonValue::from(vec![JsonValue::from(true), JsonValue::from("x")]);
        assert_eq!(v.at(0).and_then(JsonValue::as_bool), Some(true));
        assert_eq!(v.at(1).and_then(JsonValue::as_str), Some("x"));
        assert!(v.at(2).is_none());
        assert!(JsonValue::Null.is_null());
    }
}
