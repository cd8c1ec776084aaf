//! ISO 8601 date/time codecs, the `[-][d.]hh:mm:ss[.fffffff]` time-span
//! form, 4-part versions, and hyphenated GUIDs.
//!
//! The accepted grammar is `YYYY-MM-DD[Thh:mm[:ss[.fraction]][Z|±hh:mm]]`.
//! Fractional seconds keep the first seven digits (100 ns resolution) and
//! accept up to sixteen; output always carries the full seven digits.

use core::fmt;
use core::fmt::Write as _;
use core::str::FromStr;

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, NaiveDateTime, TimeDelta, Timelike, Utc};
use uuid::Uuid;

use crate::error::{JsonError, JsonErrorKind};
use crate::reader::JsonReader;
use crate::shape::{JsonShape, Shape};
use crate::symbol::Sym;
use crate::writer::JsonWriter;

// ── lexing helpers ───────────────────────────────────────────────────

struct Cursor<'a> {
    bytes: &'a [u8],
    i: usize,
}

impl<'a> Cursor<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Cursor { bytes, i: 0 }
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.i).copied()
    }

    fn eat(&mut self, b: u8) -> bool {
        if self.peek() == Some(b) {
            self.i += 1;
            true
        } else {
            false
        }
    }

    /// Exactly `n` decimal digits.
    fn digits(&mut self, n: usize) -> Option<u32> {
        if self.i + n > self.bytes.len() {
            return None;
        }
        let mut value = 0u32;
        for _ in 0..n {
            let b = self.bytes[self.i];
            if !b.is_ascii_digit() {
                return None;
            }
            value = value * 10 + (b - b'0') as u32;
            self.i += 1;
        }
        Some(value)
    }

    /// A run of 1..=max digits; returns (value, count).
    fn digit_run(&mut self, max: usize) -> Option<(u64, usize)> {
        let mut value = 0u64;
        let mut count = 0;
        while count < max {
            match self.peek() {
                Some(b) if b.is_ascii_digit() => {
                    value = value * 10 + (b - b'0') as u64;
                    self.i += 1;
                    count += 1;
                }
                _ => break,
            }
        }
        if count == 0 { None } else { Some((value, count)) }
    }

    fn done(&self) -> bool {
        self.i == self.bytes.len()
    }
}

enum OffsetKind {
    Unspecified,
    Utc,
    Minutes(i32),
}

/// Parse the full grammar into a civil date-time plus the offset token.
fn parse_civil(bytes: &[u8]) -> Option<(NaiveDateTime, OffsetKind)> {
    let mut c = Cursor::new(bytes);
    let year = c.digits(4)?;
    if !c.eat(b'-') {
        return None;
    }
    let month = c.digits(2)?;
    if !c.eat(b'-') {
        return None;
    }
    let day = c.digits(2)?;
    let date = NaiveDate::from_ymd_opt(year as i32, month, day)?;

    if c.done() {
        return Some((date.and_hms_nano_opt(0, 0, 0, 0)?, OffsetKind::Unspecified));
    }
    if !c.eat(b'T') {
        return None;
    }
    let hour = c.digits(2)?;
    if !c.eat(b':') {
        return None;
    }
    let minute = c.digits(2)?;

    let mut second = 0;
    let mut nanos = 0u32;
    if c.eat(b':') {
        second = c.digits(2)?;
        if c.eat(b'.') {
            // Up to sixteen digits; the first seven (100 ns units) are
            // kept, shorter runs are right-padded.
            let (value, count) = c.digit_run(16)?;
            let mut frac7 = value;
            let mut count = count;
            while count > 7 {
                frac7 /= 10;
                count -= 1;
            }
            while count < 7 {
                frac7 *= 10;
                count += 1;
            }
            nanos = (frac7 as u32) * 100;
        }
    }

    let time = date.and_hms_nano_opt(hour, minute, second, nanos)?;

    let offset = if c.done() {
        OffsetKind::Unspecified
    } else if c.eat(b'Z') {
        OffsetKind::Utc
    } else {
        let negative = if c.eat(b'+') {
            false
        } else if c.eat(b'-') {
            true
        } else {
            return None;
        };
        let oh = c.digits(2)?;
        if !c.eat(b':') {
            return None;
        }
        let om = c.digits(2)?;
        if oh > 14 || om > 59 {
            return None;
        }
        let minutes = (oh * 60 + om) as i32;
        OffsetKind::Minutes(if negative { -minutes } else { minutes })
    };
    if !c.done() {
        return None;
    }
    Some((time, offset))
}

fn format_civil(out: &mut String, t: &NaiveDateTime) {
    let _ = write!(
        out,
        "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}.{:07}",
        t.year(),
        t.month(),
        t.day(),
        t.hour(),
        t.minute(),
        t.second(),
        t.nanosecond() / 100
    );
}

fn format_offset(out: &mut String, offset_seconds: i32) {
    let total = offset_seconds / 60;
    let sign = if total < 0 { '-' } else { '+' };
    let abs = total.unsigned_abs();
    let _ = write!(out, "{}{:02}:{:02}", sign, abs / 60, abs % 60);
}

/// Read a string token and narrow it to ASCII bytes.
fn read_ascii_token<S: Sym>(
    rd: &mut JsonReader<'_, S>,
    kind: JsonErrorKind,
    what: &'static str,
) -> Result<Vec<u8>, JsonError> {
    let units = rd.read_string_units()?;
    let mut out = Vec::with_capacity(units.len());
    for u in units.iter() {
        let v = u.as_u32();
        if v == 0 || v > 0x7F {
            return Err(rd.err(kind).while_parsing(what));
        }
        out.push(v as u8);
    }
    Ok(out)
}

fn write_ascii_quoted<S: Sym>(w: &mut JsonWriter<S>, text: &str) {
    w.quote();
    w.raw_str(text);
    w.quote();
}

// ── date-time shapes ─────────────────────────────────────────────────

impl JsonShape for NaiveDate {
    fn shape<S: Sym>() -> Shape<Self, S> {
        Shape::codec(
            |w, v: &NaiveDate, _resolver| {
                let mut out = String::with_capacity(10);
                let _ = write!(out, "{:04}-{:02}-{:02}", v.year(), v.month(), v.day());
                write_ascii_quoted(w, &out);
                Ok(())
            },
            |rd: &mut JsonReader<'_, S>, _resolver| {
                let bytes = read_ascii_token(rd, JsonErrorKind::InvalidDate, "date")?;
                let mut c = Cursor::new(&bytes);
                let parsed = (|| {
                    let year = c.digits(4)?;
                    if !c.eat(b'-') {
                        return None;
                    }
                    let month = c.digits(2)?;
                    if !c.eat(b'-') {
                        return None;
                    }
                    let day = c.digits(2)?;
                    if !c.done() {
                        return None;
                    }
                    NaiveDate::from_ymd_opt(year as i32, month, day)
                })();
                parsed.ok_or_else(|| rd.err(JsonErrorKind::InvalidDate).while_parsing("date"))
            },
        )
    }
}

/// Unspecified-kind date-time: no offset token on either side. A bare
/// date parses as midnight.
impl JsonShape for NaiveDateTime {
    fn shape<S: Sym>() -> Shape<Self, S> {
        Shape::codec(
            |w, v: &NaiveDateTime, _resolver| {
                let mut out = String::with_capacity(32);
                format_civil(&mut out, v);
                write_ascii_quoted(w, &out);
                Ok(())
            },
            |rd: &mut JsonReader<'_, S>, _resolver| {
                let bytes = read_ascii_token(rd, JsonErrorKind::InvalidDate, "datetime")?;
                match parse_civil(&bytes) {
                    Some((t, OffsetKind::Unspecified)) => Ok(t),
                    _ => Err(rd.err(JsonErrorKind::InvalidDate).while_parsing("datetime")),
                }
            },
        )
    }
}

impl JsonShape for DateTime<Utc> {
    fn shape<S: Sym>() -> Shape<Self, S> {
        Shape::codec(
            |w, v: &DateTime<Utc>, _resolver| {
                let mut out = String::with_capacity(32);
                format_civil(&mut out, &v.naive_utc());
                out.push('Z');
                write_ascii_quoted(w, &out);
                Ok(())
            },
            |rd: &mut JsonReader<'_, S>, _resolver| {
                let bytes = read_ascii_token(rd, JsonErrorKind::InvalidDate, "datetime")?;
                let fail = || rd.err(JsonErrorKind::InvalidDate).while_parsing("datetime");
                let (t, offset) = parse_civil(&bytes).ok_or_else(fail)?;
                match offset {
                    // An unspecified kind deserializing into a UTC target
                    // is taken as already UTC.
                    OffsetKind::Unspecified | OffsetKind::Utc => Ok(t.and_utc()),
                    OffsetKind::Minutes(minutes) => t
                        .checked_sub_signed(TimeDelta::seconds(minutes as i64 * 60))
                        .map(|utc| utc.and_utc())
                        .ok_or_else(fail),
                }
            },
        )
    }
}

impl JsonShape for DateTime<FixedOffset> {
    fn shape<S: Sym>() -> Shape<Self, S> {
        Shape::codec(
            |w, v: &DateTime<FixedOffset>, _resolver| {
                let mut out = String::with_capacity(32);
                format_civil(&mut out, &v.naive_local());
                format_offset(&mut out, v.offset().local_minus_utc());
                write_ascii_quoted(w, &out);
                Ok(())
            },
            |rd: &mut JsonReader<'_, S>, _resolver| {
                let bytes = read_ascii_token(rd, JsonErrorKind::InvalidDate, "datetime")?;
                let fail = || rd.err(JsonErrorKind::InvalidDate).while_parsing("datetime");
                let (t, offset) = parse_civil(&bytes).ok_or_else(fail)?;
                let seconds = match offset {
                    OffsetKind::Unspecified | OffsetKind::Utc => 0,
                    OffsetKind::Minutes(minutes) => minutes * 60,
                };
                let offset = FixedOffset::east_opt(seconds).ok_or_else(fail)?;
                let utc = t
                    .checked_sub_signed(TimeDelta::seconds(seconds as i64))
                    .ok_or_else(fail)?;
                Ok(DateTime::from_naive_utc_and_offset(utc, offset))
            },
        )
    }
}

// ── time spans ───────────────────────────────────────────────────────

// .NET-range bound on the day component, so second arithmetic stays well
// inside i64.
const MAX_SPAN_DAYS: u64 = 10_675_199;

fn parse_span(bytes: &[u8]) -> Option<TimeDelta> {
    let mut c = Cursor::new(bytes);
    let negative = c.eat(b'-');

    let (first, first_len) = c.digit_run(8)?;
    let (days, hours) = if c.eat(b'.') {
        if first > MAX_SPAN_DAYS {
            return None;
        }
        (first, c.digits(2)?)
    } else {
        if first_len != 2 {
            return None;
        }
        (0, first as u32)
    };
    if !c.eat(b':') {
        return None;
    }
    let minutes = c.digits(2)?;
    if !c.eat(b':') {
        return None;
    }
    let seconds = c.digits(2)?;
    if hours > 23 || minutes > 59 || seconds > 59 {
        return None;
    }

    let mut nanos = 0i64;
    if c.eat(b'.') {
        let (value, count) = c.digit_run(7)?;
        let mut frac7 = value;
        let mut count = count;
        while count < 7 {
            frac7 *= 10;
            count += 1;
        }
        nanos = frac7 as i64 * 100;
    }
    if !c.done() {
        return None;
    }

    let total_seconds =
        days as i64 * 86_400 + hours as i64 * 3_600 + minutes as i64 * 60 + seconds as i64;
    let span = TimeDelta::seconds(total_seconds) + TimeDelta::nanoseconds(nanos);
    Some(if negative { -span } else { span })
}

fn format_span(span: &TimeDelta) -> String {
    let seconds = span.num_seconds();
    let nanos = span.subsec_nanos();
    let negative = seconds < 0 || nanos < 0;
    let total = seconds.unsigned_abs();
    let frac7 = nanos.unsigned_abs() / 100;

    let days = total / 86_400;
    let hours = total % 86_400 / 3_600;
    let minutes = total % 3_600 / 60;
    let seconds = total % 60;

    let mut out = String::with_capacity(26);
    if negative {
        out.push('-');
    }
    if days > 0 {
        let _ = write!(out, "{days}.");
    }
    let _ = write!(out, "{hours:02}:{minutes:02}:{seconds:02}");
    if frac7 > 0 {
        let _ = write!(out, ".{frac7:07}");
    }
    out
}

impl JsonShape for TimeDelta {
    fn shape<S: Sym>() -> Shape<Self, S> {
        Shape::codec(
            |w, v: &TimeDelta, _resolver| {
                write_ascii_quoted(w, &format_span(v));
                Ok(())
            },
            |rd: &mut JsonReader<'_, S>, _resolver| {
                let bytes = read_ascii_token(rd, JsonErrorKind::InvalidTimeSpan, "timespan")?;
                parse_span(&bytes)
                    .ok_or_else(|| rd.err(JsonErrorKind::InvalidTimeSpan).while_parsing("timespan"))
            },
        )
    }
}

// ── versions ─────────────────────────────────────────────────────────

/// A four-part version: `major.minor[.build[.revision]]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Version {
    pub major: u32,
    pub minor: u32,
    pub build: Option<u32>,
    pub revision: Option<u32>,
}

impl Version {
    pub fn new(major: u32, minor: u32) -> Self {
        Version {
            major,
            minor,
            build: None,
            revision: None,
        }
    }

    pub fn with_build(major: u32, minor: u32, build: u32) -> Self {
        Version {
            major,
            minor,
            build: Some(build),
            revision: None,
        }
    }

    pub fn with_revision(major: u32, minor: u32, build: u32, revision: u32) -> Self {
        Version {
            major,
            minor,
            build: Some(build),
            revision: Some(revision),
        }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)?;
        if let Some(build) = self.build {
            write!(f, ".{build}")?;
            if let Some(revision) = self.revision {
                write!(f, ".{revision}")?;
            }
        }
        Ok(())
    }
}

impl FromStr for Version {
    type Err = JsonErrorKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        fn component(c: &mut Cursor<'_>) -> Option<u32> {
            let (value, len) = c.digit_run(10)?;
            // No leading zeros on multi-digit components.
            if len > 1 && c.bytes[c.i - len] == b'0' {
                return None;
            }
            u32::try_from(value).ok()
        }

        let mut c = Cursor::new(s.as_bytes());
        let parsed = (|| {
            let major = component(&mut c)?;
            if !c.eat(b'.') {
                return None;
            }
            let minor = component(&mut c)?;
            let mut v = Version::new(major, minor);
            if c.eat(b'.') {
                v.build = Some(component(&mut c)?);
                if c.eat(b'.') {
                    v.revision = Some(component(&mut c)?);
                }
            }
            if c.done() { Some(v) } else { None }
        })();
        parsed.ok_or(JsonErrorKind::InvalidVersion)
    }
}

impl JsonShape for Version {
    fn shape<S: Sym>() -> Shape<Self, S> {
        Shape::codec(
            |w, v: &Version, _resolver| {
                write_ascii_quoted(w, &v.to_string());
                Ok(())
            },
            |rd: &mut JsonReader<'_, S>, _resolver| {
                let bytes = read_ascii_token(rd, JsonErrorKind::InvalidVersion, "version")?;
                let text = core::str::from_utf8(&bytes)
                    .map_err(|_| rd.err(JsonErrorKind::InvalidVersion).while_parsing("version"))?;
                text.parse()
                    .map_err(|kind| rd.err(kind).while_parsing("version"))
            },
        )
    }
}

// ── GUIDs ────────────────────────────────────────────────────────────

/// Strict 36-character hyphenated form only.
fn parse_guid(bytes: &[u8]) -> Option<Uuid> {
    if bytes.len() != 36 {
        return None;
    }
    let mut value: u128 = 0;
    for (i, &b) in bytes.iter().enumerate() {
        if matches!(i, 8 | 13 | 18 | 23) {
            if b != b'-' {
                return None;
            }
            continue;
        }
        let nibble = match b {
            b'0'..=b'9' => b - b'0',
            b'a'..=b'f' => b - b'a' + 10,
            b'A'..=b'F' => b - b'A' + 10,
            _ => return None,
        };
        value = (value << 4) | nibble as u128;
    }
    Some(Uuid::from_u128(value))
}

impl JsonShape for Uuid {
    fn shape<S: Sym>() -> Shape<Self, S> {
        Shape::codec(
            |w, v: &Uuid, _resolver| {
                let mut buf = [0u8; 36];
                write_ascii_quoted(w, v.hyphenated().encode_lower(&mut buf));
                Ok(())
            },
            |rd: &mut JsonReader<'_, S>, _resolver| {
                let bytes = read_ascii_token(rd, JsonErrorKind::InvalidGuid, "guid")?;
                parse_guid(&bytes)
                    .ok_or_else(|| rd.err(JsonErrorKind::InvalidGuid).while_parsing("guid"))
            },
        )
    }
}
