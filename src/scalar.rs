//! Primitive codecs and the parametric collection formatters.
//!
//! Integers format through `itoa` and floats through `zmij` (shortest
//! round-trip). Reads go through the reader's number lexer, so the RFC
//! 8259 grammar is enforced before any numeric conversion.

use core::num::IntErrorKind;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::hash::Hash;
use std::sync::OnceLock;

use crate::decimal::Decimal;
use crate::error::{JsonError, JsonErrorKind};
use crate::escape::write_quoted;
use crate::reader::{JsonReader, NumberLex};
use crate::resolver::{Formatter, JsonResolver};
use crate::shape::{JsonShape, Shape};
use crate::symbol::Sym;
use crate::writer::JsonWriter;

// ── number helpers ───────────────────────────────────────────────────

pub(crate) fn write_int<S: Sym, I: itoa::Integer>(w: &mut JsonWriter<S>, value: I) {
    let mut buf = itoa::Buffer::new();
    w.raw_str(buf.format(value));
}

/// Shortest round-trip float output. `zmij` may omit the fraction for
/// whole values; add `.0` so the output stays a float-shaped number.
pub(crate) fn write_f64<S: Sym>(w: &mut JsonWriter<S>, value: f64) -> Result<(), JsonError> {
    if !value.is_finite() {
        return Err(JsonError::new(JsonErrorKind::NonFiniteFloat, w.position()));
    }
    let mut buf = zmij::Buffer::new();
    let s = buf.format(value);
    w.raw_str(s);
    if !s.bytes().any(|b| b == b'.' || b == b'e' || b == b'E') {
        w.raw_str(".0");
    }
    Ok(())
}

pub(crate) fn write_f32<S: Sym>(w: &mut JsonWriter<S>, value: f32) -> Result<(), JsonError> {
    if !value.is_finite() {
        return Err(JsonError::new(JsonErrorKind::NonFiniteFloat, w.position()));
    }
    let mut buf = zmij::Buffer::new();
    let s = buf.format(value);
    w.raw_str(s);
    if !s.bytes().any(|b| b == b'.' || b == b'e' || b == b'E') {
        w.raw_str(".0");
    }
    Ok(())
}

pub(crate) fn parse_f64(text: &str) -> Result<f64, JsonErrorKind> {
    let value: f64 = text.parse().map_err(|_| JsonErrorKind::InvalidNumber)?;
    // The grammar admits magnitudes beyond f64; treat overflow as range.
    if value.is_finite() {
        Ok(value)
    } else {
        Err(JsonErrorKind::NumberOutOfRange)
    }
}

fn int_error(kind: &IntErrorKind) -> JsonErrorKind {
    match kind {
        IntErrorKind::PosOverflow | IntErrorKind::NegOverflow => JsonErrorKind::NumberOutOfRange,
        _ => JsonErrorKind::InvalidNumber,
    }
}

fn integer_lex<'l, 'de, S: Sym>(
    rd: &mut JsonReader<'de, S>,
    lex: &'l NumberLex<'de>,
) -> Result<&'l str, JsonError> {
    if lex.has_fraction || lex.has_exponent {
        Err(rd
            .err(JsonErrorKind::InvalidNumber)
            .while_parsing("integer"))
    } else {
        Ok(&lex.text)
    }
}

// ── integers ─────────────────────────────────────────────────────────

macro_rules! integer_shape {
    ($($ty:ty),*) => {$(
        impl JsonShape for $ty {
            fn shape<S: Sym>() -> Shape<Self, S> {
                Shape::codec(
                    |w, v: &$ty, _resolver| {
                        write_int(w, *v);
                        Ok(())
                    },
                    |rd: &mut JsonReader<'_, S>, _resolver| {
                        let lex = rd.read_number_lex()?;
                        let text = integer_lex(rd, &lex)?;
                        text.parse::<$ty>()
                            .map_err(|e| rd.err(int_error(e.kind())).while_parsing("integer"))
                    },
                )
            }
        }
    )*};
}

integer_shape!(u8, u16, u32, u64, u128, usize, i8, i16, i32, i64, i128, isize);

// ── floats ───────────────────────────────────────────────────────────

impl JsonShape for f64 {
    fn shape<S: Sym>() -> Shape<Self, S> {
        Shape::codec(
            |w, v: &f64, _resolver| write_f64(w, *v),
            |rd: &mut JsonReader<'_, S>, _resolver| {
                let lex = rd.read_number_lex()?;
                parse_f64(&lex.text).map_err(|kind| rd.err(kind).while_parsing("double"))
            },
        )
    }
}

impl JsonShape for f32 {
    fn shape<S: Sym>() -> Shape<Self, S> {
        Shape::codec(
            |w, v: &f32, _resolver| write_f32(w, *v),
            |rd: &mut JsonReader<'_, S>, _resolver| {
                let lex = rd.read_number_lex()?;
                let value: f32 = lex
                    .text
                    .parse()
                    .map_err(|_| rd.err(JsonErrorKind::InvalidNumber).while_parsing("single"))?;
                if value.is_finite() {
                    Ok(value)
                } else {
                    Err(rd
                        .err(JsonErrorKind::NumberOutOfRange)
                        .while_parsing("single"))
                }
            },
        )
    }
}

impl JsonShape for Decimal {
    fn shape<S: Sym>() -> Shape<Self, S> {
        Shape::codec(
            |w, v: &Decimal, _resolver| {
                w.raw_str(&v.to_string());
                Ok(())
            },
            |rd: &mut JsonReader<'_, S>, _resolver| {
                let lex = rd.read_number_lex()?;
                Decimal::parse(&lex.text).map_err(|kind| rd.err(kind).while_parsing("decimal"))
            },
        )
    }
}

// ── bool, unit, char, strings ────────────────────────────────────────

impl JsonShape for bool {
    fn shape<S: Sym>() -> Shape<Self, S> {
        Shape::codec(
            |w, v: &bool, _resolver| {
                w.raw_str(if *v { "true" } else { "false" });
                Ok(())
            },
            |rd: &mut JsonReader<'_, S>, _resolver| rd.read_bool(),
        )
    }
}

impl JsonShape for () {
    fn shape<S: Sym>() -> Shape<Self, S> {
        Shape::codec(
            |w, _v: &(), _resolver| {
                w.null();
                Ok(())
            },
            |rd: &mut JsonReader<'_, S>, _resolver| rd.read_null(),
        )
    }

    fn is_null(&self) -> bool {
        true
    }
}

impl JsonShape for char {
    fn shape<S: Sym>() -> Shape<Self, S> {
        Shape::codec(
            |w, v: &char, resolver| {
                let mut tmp = [0u8; 4];
                write_quoted(w, v.encode_utf8(&mut tmp), resolver.escape_mode());
                Ok(())
            },
            |rd: &mut JsonReader<'_, S>, _resolver| {
                let s = rd.read_string()?;
                let mut chars = s.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Ok(c),
                    _ => Err(rd
                        .err(JsonErrorKind::UnexpectedCharacter)
                        .while_parsing("char")),
                }
            },
        )
    }
}

impl JsonShape for String {
    fn shape<S: Sym>() -> Shape<Self, S> {
        Shape::codec(
            |w, v: &String, resolver| {
                write_quoted(w, v, resolver.escape_mode());
                Ok(())
            },
            |rd: &mut JsonReader<'_, S>, _resolver| rd.read_string(),
        )
    }
}

/// URIs travel as their string form, through the string codec.
impl JsonShape for url::Url {
    fn shape<S: Sym>() -> Shape<Self, S> {
        Shape::codec(
            |w, v: &url::Url, resolver| {
                write_quoted(w, v.as_str(), resolver.escape_mode());
                Ok(())
            },
            |rd: &mut JsonReader<'_, S>, _resolver| {
                let s = rd.read_string()?;
                url::Url::parse(&s)
                    .map_err(|_| rd.err(JsonErrorKind::InvalidUri).while_parsing("uri"))
            },
        )
    }
}

// ── option, box ──────────────────────────────────────────────────────

impl<F: JsonShape> JsonShape for Option<F> {
    fn shape<S: Sym>() -> Shape<Self, S> {
        let write_cell: OnceLock<Formatter<F, S>> = OnceLock::new();
        let read_cell: OnceLock<Formatter<F, S>> = OnceLock::new();
        Shape::codec(
            move |w, v: &Option<F>, resolver: &JsonResolver| match v {
                Some(inner) => {
                    let f = write_cell.get_or_init(|| resolver.formatter::<F, S>());
                    f.write(w, inner, resolver)
                }
                None => {
                    w.null();
                    Ok(())
                }
            },
            move |rd: &mut JsonReader<'_, S>, resolver: &JsonResolver| {
                if rd.try_null()? {
                    Ok(None)
                } else {
                    let f = read_cell.get_or_init(|| resolver.formatter::<F, S>());
                    f.read(rd, resolver).map(Some)
                }
            },
        )
    }

    fn is_null(&self) -> bool {
        self.is_none()
    }
}

impl<F: JsonShape> JsonShape for Box<F> {
    fn shape<S: Sym>() -> Shape<Self, S> {
        let write_cell: OnceLock<Formatter<F, S>> = OnceLock::new();
        let read_cell: OnceLock<Formatter<F, S>> = OnceLock::new();
        Shape::codec(
            move |w, v: &Box<F>, resolver: &JsonResolver| {
                let f = write_cell.get_or_init(|| resolver.formatter::<F, S>());
                f.write(w, v, resolver)
            },
            move |rd: &mut JsonReader<'_, S>, resolver: &JsonResolver| {
                let f = read_cell.get_or_init(|| resolver.formatter::<F, S>());
                f.read(rd, resolver).map(Box::new)
            },
        )
    }

    fn is_null(&self) -> bool {
        (**self).is_null()
    }
}

// ── sequences ────────────────────────────────────────────────────────

fn write_seq<'a, S, F, I>(
    w: &mut JsonWriter<S>,
    items: I,
    resolver: &JsonResolver,
    cell: &OnceLock<Formatter<F, S>>,
) -> Result<(), JsonError>
where
    S: Sym,
    F: JsonShape + 'a,
    I: Iterator<Item = &'a F>,
{
    let f = cell.get_or_init(|| resolver.formatter::<F, S>());
    w.begin_array()?;
    for (i, item) in items.enumerate() {
        if i > 0 {
            w.value_separator();
        }
        f.write(w, item, resolver)?;
    }
    w.end_array();
    Ok(())
}

fn read_seq<S, F>(
    rd: &mut JsonReader<'_, S>,
    resolver: &JsonResolver,
    cell: &OnceLock<Formatter<F, S>>,
    mut push: impl FnMut(F),
) -> Result<(), JsonError>
where
    S: Sym,
    F: JsonShape,
{
    let f = cell.get_or_init(|| resolver.formatter::<F, S>());
    rd.expect_array_start()?;
    if rd.end_if_empty(false)? {
        return Ok(());
    }
    loop {
        push(f.read(rd, resolver)?);
        if rd.comma_or_end_array()? {
            return Ok(());
        }
    }
}

impl<F: JsonShape> JsonShape for Vec<F> {
    fn shape<S: Sym>() -> Shape<Self, S> {
        let write_cell: OnceLock<Formatter<F, S>> = OnceLock::new();
        let read_cell: OnceLock<Formatter<F, S>> = OnceLock::new();
        Shape::codec(
            move |w, v: &Vec<F>, resolver: &JsonResolver| {
                write_seq(w, v.iter(), resolver, &write_cell)
            },
            move |rd: &mut JsonReader<'_, S>, resolver: &JsonResolver| {
                let mut out = Vec::new();
                read_seq(rd, resolver, &read_cell, |item| out.push(item))?;
                Ok(out)
            },
        )
    }
}

impl<F: JsonShape + Eq + Hash> JsonShape for HashSet<F> {
    fn shape<S: Sym>() -> Shape<Self, S> {
        let write_cell: OnceLock<Formatter<F, S>> = OnceLock::new();
        let read_cell: OnceLock<Formatter<F, S>> = OnceLock::new();
        Shape::codec(
            move |w, v: &HashSet<F>, resolver: &JsonResolver| {
                write_seq(w, v.iter(), resolver, &write_cell)
            },
            move |rd: &mut JsonReader<'_, S>, resolver: &JsonResolver| {
                let mut out = HashSet::new();
                read_seq(rd, resolver, &read_cell, |item| {
                    out.insert(item);
                })?;
                Ok(out)
            },
        )
    }
}

impl<F: JsonShape + Ord> JsonShape for BTreeSet<F> {
    fn shape<S: Sym>() -> Shape<Self, S> {
        let write_cell: OnceLock<Formatter<F, S>> = OnceLock::new();
        let read_cell: OnceLock<Formatter<F, S>> = OnceLock::new();
        Shape::codec(
            move |w, v: &BTreeSet<F>, resolver: &JsonResolver| {
                write_seq(w, v.iter(), resolver, &write_cell)
            },
            move |rd: &mut JsonReader<'_, S>, resolver: &JsonResolver| {
                let mut out = BTreeSet::new();
                read_seq(rd, resolver, &read_cell, |item| {
                    out.insert(item);
                })?;
                Ok(out)
            },
        )
    }
}

// ── string-keyed mappings ────────────────────────────────────────────

fn write_map<'a, S, F, I>(
    w: &mut JsonWriter<S>,
    entries: I,
    resolver: &JsonResolver,
    cell: &OnceLock<Formatter<F, S>>,
) -> Result<(), JsonError>
where
    S: Sym,
    F: JsonShape + 'a,
    I: Iterator<Item = (&'a String, &'a F)>,
{
    let f = cell.get_or_init(|| resolver.formatter::<F, S>());
    w.begin_object()?;
    for (i, (key, item)) in entries.enumerate() {
        if i > 0 {
            w.value_separator();
        }
        write_quoted(w, key, resolver.escape_mode());
        w.name_separator();
        f.write(w, item, resolver)?;
    }
    w.end_object();
    Ok(())
}

fn read_map<S, F>(
    rd: &mut JsonReader<'_, S>,
    resolver: &JsonResolver,
    cell: &OnceLock<Formatter<F, S>>,
    mut insert: impl FnMut(String, F),
) -> Result<(), JsonError>
where
    S: Sym,
    F: JsonShape,
{
    let f = cell.get_or_init(|| resolver.formatter::<F, S>());
    rd.expect_object_start()?;
    if rd.end_if_empty(true)? {
        return Ok(());
    }
    loop {
        let name = rd.read_property_name_units()?;
        let key = S::decode_owned(&name).map_err(|kind| rd.err(kind))?;
        rd.expect_colon()?;
        insert(key, f.read(rd, resolver)?);
        if rd.comma_or_end_object()? {
            return Ok(());
        }
    }
}

impl<F: JsonShape> JsonShape for BTreeMap<String, F> {
    fn shape<S: Sym>() -> Shape<Self, S> {
        let write_cell: OnceLock<Formatter<F, S>> = OnceLock::new();
        let read_cell: OnceLock<Formatter<F, S>> = OnceLock::new();
        Shape::codec(
            move |w, v: &BTreeMap<String, F>, resolver: &JsonResolver| {
                write_map(w, v.iter(), resolver, &write_cell)
            },
            move |rd: &mut JsonReader<'_, S>, resolver: &JsonResolver| {
                let mut out = BTreeMap::new();
                read_map(rd, resolver, &read_cell, |k, v| {
                    out.insert(k, v);
                })?;
                Ok(out)
            },
        )
    }
}

impl<F: JsonShape> JsonShape for HashMap<String, F> {
    fn shape<S: Sym>() -> Shape<Self, S> {
        let write_cell: OnceLock<Formatter<F, S>> = OnceLock::new();
        let read_cell: OnceLock<Formatter<F, S>> = OnceLock::new();
        Shape::codec(
            move |w, v: &HashMap<String, F>, resolver: &JsonResolver| {
                write_map(w, v.iter(), resolver, &write_cell)
            },
            move |rd: &mut JsonReader<'_, S>, resolver: &JsonResolver| {
                let mut out = HashMap::new();
                read_map(rd, resolver, &read_cell, |k, v| {
                    out.insert(k, v);
                })?;
                Ok(out)
            },
        )
    }
}

// ── tuples ───────────────────────────────────────────────────────────

macro_rules! tuple_shape {
    ($($name:ident : $idx:tt),+ ; $last:ident : $last_idx:tt) => {
        impl<$($name: JsonShape,)* $last: JsonShape> JsonShape for ($($name,)* $last,) {
            fn shape<S: Sym>() -> Shape<Self, S> {
                Shape::codec(
                    move |w, v: &($($name,)* $last,), resolver: &JsonResolver| {
                        w.begin_array()?;
                        $(
                            if $idx > 0 {
                                w.value_separator();
                            }
                            resolver.formatter::<$name, S>().write(w, &v.$idx, resolver)?;
                        )*
                        w.value_separator();
                        resolver.formatter::<$last, S>().write(w, &v.$last_idx, resolver)?;
                        w.end_array();
                        Ok(())
                    },
                    move |rd: &mut JsonReader<'_, S>, resolver: &JsonResolver| {
                        rd.expect_array_start()?;
                        let out = (
                            $(
                                {
                                    let item = resolver.formatter::<$name, S>().read(rd, resolver)?;
                                    if rd.comma_or_end_array()? {
                                        return Err(rd.err(JsonErrorKind::UnexpectedCharacter));
                                    }
                                    item
                                },
                            )*
                            resolver.formatter::<$last, S>().read(rd, resolver)?,
                        );
                        if !rd.comma_or_end_array()? {
                            return Err(rd.err(JsonErrorKind::UnexpectedCharacter));
                        }
                        Ok(out)
                    },
                )
            }
        }
    };
}

tuple_shape!(A: 0; B: 1);
tuple_shape!(A: 0, B: 1; C: 2);
tuple_shape!(A: 0, B: 1, C: 2; D: 3);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::writer::DEFAULT_MAX_DEPTH;

    #[test]
    fn float_output_keeps_a_fraction() {
        let mut w: JsonWriter<u8> = JsonWriter::new(DEFAULT_MAX_DEPTH);
        write_f64(&mut w, 3.0).unwrap();
        let text = String::from_utf8(w.finish()).unwrap();
        assert!(
            text.bytes().any(|b| b == b'.' || b == b'e' || b == b'E'),
            "{text:?} has no float marker"
        );
    }

    #[test]
    fn non_finite_floats_are_rejected() {
        let mut w: JsonWriter<u8> = JsonWriter::new(DEFAULT_MAX_DEPTH);
        assert_eq!(
            write_f64(&mut w, f64::NAN).unwrap_err().kind(),
            JsonErrorKind::NonFiniteFloat
        );
        assert_eq!(
            write_f64(&mut w, f64::INFINITY).unwrap_err().kind(),
            JsonErrorKind::NonFiniteFloat
        );
    }

    #[test]
    fn float_overflow_reads_as_out_of_range() {
        assert_eq!(parse_f64("1e999"), Err(JsonErrorKind::NumberOutOfRange));
        assert_eq!(parse_f64("1.5e-3"), Ok(0.0015));
    }
}
