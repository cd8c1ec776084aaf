use std::borrow::Cow;

use crate::error::{JsonError, JsonErrorKind};
use crate::escape::hex4;
use crate::symbol::Sym;

/// What the reader does when it meets `//` or `/* */`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CommentHandling {
    /// Comments are a parser error (strict RFC 8259).
    #[default]
    Disallow,
    /// Comments are consumed as whitespace.
    Skip,
    /// `read_token` surfaces comments as tokens; typed reads consume them.
    Preserve,
}

#[derive(Debug, Clone, Copy)]
pub struct ReadOptions {
    pub comments: CommentHandling,
    pub allow_trailing_commas: bool,
    pub max_depth: u32,
}

impl Default for ReadOptions {
    fn default() -> Self {
        ReadOptions {
            comments: CommentHandling::Disallow,
            allow_trailing_commas: false,
            max_depth: crate::writer::DEFAULT_MAX_DEPTH,
        }
    }
}

/// Token kinds produced by [`JsonReader::read_token`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsonToken {
    None,
    BeginObject,
    EndObject,
    BeginArray,
    EndArray,
    PropertyName,
    String,
    Number,
    True,
    False,
    Null,
    Comment,
}

impl JsonToken {
    fn ends_value(self) -> bool {
        matches!(
            self,
            JsonToken::String
                | JsonToken::Number
                | JsonToken::True
                | JsonToken::False
                | JsonToken::Null
                | JsonToken::EndObject
                | JsonToken::EndArray
        )
    }
}

/// One bit per open container: 1 = object, 0 = array. The first 64 levels
/// live in an inline word; deeper nesting spills into overflow words.
#[derive(Debug, Default)]
pub struct BitStack {
    depth: usize,
    word: u64,
    overflow: Vec<u64>,
}

impl BitStack {
    fn set(&mut self, index: usize, bit: bool) {
        if index < 64 {
            if bit {
                self.word |= 1 << index;
            } else {
                self.word &= !(1 << index);
            }
        } else {
            let word_index = (index - 64) / 64;
            if word_index >= self.overflow.len() {
                self.overflow.resize(word_index + 1, 0);
            }
            let mask = 1u64 << ((index - 64) % 64);
            if bit {
                self.overflow[word_index] |= mask;
            } else {
                self.overflow[word_index] &= !mask;
            }
        }
    }

    fn get(&self, index: usize) -> bool {
        if index < 64 {
            self.word & (1 << index) != 0
        } else {
            let word_index = (index - 64) / 64;
            self.overflow[word_index] & (1 << ((index - 64) % 64)) != 0
        }
    }

    pub fn push(&mut self, is_object: bool) {
        self.set(self.depth, is_object);
        self.depth += 1;
    }

    pub fn pop(&mut self) -> Option<bool> {
        if self.depth == 0 {
            return None;
        }
        self.depth -= 1;
        Some(self.get(self.depth))
    }

    /// 1 when the innermost open container is an object, 0 for an array.
    pub fn current(&self) -> Option<bool> {
        if self.depth == 0 {
            None
        } else {
            Some(self.get(self.depth - 1))
        }
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    fn truncate(&mut self, depth: usize) {
        self.depth = depth;
    }
}

/// A lexed JSON number: the validated text plus what the grammar saw, so
/// precise parsers can pick an integer, float, or decimal route.
#[derive(Debug)]
pub struct NumberLex<'de> {
    pub text: Cow<'de, str>,
    pub has_fraction: bool,
    pub has_exponent: bool,
}

#[derive(Clone, Copy)]
struct Snapshot {
    pos: usize,
    line: u32,
    line_start: usize,
    token: JsonToken,
    depth: usize,
    pending_comma: bool,
    colon_seen: bool,
}

/// Forward-only tokenizer over an immutable unit slice.
///
/// Tracks position, line, unit-in-line, and the container bit stack. When
/// constructed as a non-final block, any token cut off by the end of the
/// slice rolls all state back and yields the `Incomplete` control signal so
/// the caller can supply a continuation buffer.
pub struct JsonReader<'de, S: Sym> {
    input: &'de [S],
    pos: usize,
    line: u32,
    line_start: usize,
    token: JsonToken,
    stack: BitStack,
    opts: ReadOptions,
    is_final_block: bool,
    pending_comma: bool,
    colon_seen: bool,
}

impl<'de, S: Sym> JsonReader<'de, S> {
    pub fn new(input: &'de [S], opts: ReadOptions) -> Self {
        JsonReader {
            input,
            pos: 0,
            line: 1,
            line_start: 0,
            token: JsonToken::None,
            stack: BitStack::default(),
            opts,
            is_final_block: true,
            pending_comma: false,
            colon_seen: false,
        }
    }

    /// A reader over a block that may be followed by more data. Partial
    /// tokens roll back and report `Incomplete` instead of failing.
    pub fn non_final(input: &'de [S], opts: ReadOptions) -> Self {
        let mut r = Self::new(input, opts);
        r.is_final_block = false;
        r
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn line(&self) -> u32 {
        self.line
    }

    /// Units since the last line feed.
    pub fn column(&self) -> u32 {
        (self.pos - self.line_start) as u32
    }

    pub fn last_token(&self) -> JsonToken {
        self.token
    }

    pub fn depth(&self) -> usize {
        self.stack.depth()
    }

    // ── low-level ────────────────────────────────────────────────────

    #[inline]
    fn peek(&self) -> Option<u32> {
        self.input.get(self.pos).map(|u| u.as_u32())
    }

    #[inline]
    fn bump(&mut self) {
        self.pos += 1;
    }

    pub(crate) fn err(&self, kind: JsonErrorKind) -> JsonError {
        JsonError::located(kind, self.pos, self.line, self.column())
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot {
            pos: self.pos,
            line: self.line,
            line_start: self.line_start,
            token: self.token,
            depth: self.stack.depth(),
            pending_comma: self.pending_comma,
            colon_seen: self.colon_seen,
        }
    }

    fn restore(&mut self, snap: Snapshot) {
        self.pos = snap.pos;
        self.line = snap.line;
        self.line_start = snap.line_start;
        self.token = snap.token;
        self.stack.truncate(snap.depth);
        self.pending_comma = snap.pending_comma;
        self.colon_seen = snap.colon_seen;
    }

    /// End-of-input inside a token: roll back and signal `Incomplete` for a
    /// non-final block, otherwise a hard `Eof`.
    fn fail_eof(&mut self, snap: Snapshot) -> JsonError {
        self.fail_eof_as(snap, JsonErrorKind::Eof)
    }

    fn fail_eof_as(&mut self, snap: Snapshot, kind: JsonErrorKind) -> JsonError {
        if self.is_final_block {
            self.err(kind)
        } else {
            self.restore(snap);
            self.err(JsonErrorKind::Incomplete)
        }
    }

    fn check_bom(&self) -> Result<(), JsonError> {
        let rejected = if S::WIDTH == 1 {
            self.input.len() >= 3
                && self.input[0].as_u32() == 0xEF
                && self.input[1].as_u32() == 0xBB
                && self.input[2].as_u32() == 0xBF
        } else {
            !self.input.is_empty() && self.input[0].as_u32() == 0xFEFF
        };
        if rejected {
            Err(self.err(JsonErrorKind::BomRejected))
        } else {
            Ok(())
        }
    }

    /// Skip whitespace, and comments per the configured handling. With
    /// `stop_at_comment`, a comment in `Preserve` mode is left in place for
    /// `read_token` to surface.
    fn skip_trivia(&mut self, stop_at_comment: bool) -> Result<(), JsonError> {
        if self.pos == 0 {
            self.check_bom()?;
        }
        loop {
            match self.peek() {
                Some(0x20) | Some(0x09) | Some(0x0D) => self.bump(),
                Some(0x0A) => {
                    self.bump();
                    self.line += 1;
                    self.line_start = self.pos;
                }
                Some(u) if u == b'/' as u32 => match self.opts.comments {
                    CommentHandling::Disallow => {
                        return Err(self.err(JsonErrorKind::CommentDisallowed));
                    }
                    CommentHandling::Preserve if stop_at_comment => return Ok(()),
                    _ => self.consume_comment()?,
                },
                _ => return Ok(()),
            }
        }
    }

    fn consume_comment(&mut self) -> Result<(), JsonError> {
        let snap = self.snapshot();
        self.bump(); // '/'
        match self.peek() {
            Some(u) if u == b'/' as u32 => {
                self.bump();
                while let Some(u) = self.peek() {
                    if u == 0x0A {
                        self.bump();
                        self.line += 1;
                        self.line_start = self.pos;
                        return Ok(());
                    }
                    self.bump();
                }
                // A line comment may legitimately end at end of input.
                Ok(())
            }
            Some(u) if u == b'*' as u32 => {
                self.bump();
                let mut star = false;
                while let Some(u) = self.peek() {
                    self.bump();
                    if u == 0x0A {
                        self.line += 1;
                        self.line_start = self.pos;
                        star = false;
                    } else if star && u == b'/' as u32 {
                        return Ok(());
                    } else {
                        star = u == b'*' as u32;
                    }
                }
                if self.is_final_block {
                    Err(self.err(JsonErrorKind::UnterminatedComment))
                } else {
                    Err(self.fail_eof(snap))
                }
            }
            Some(_) => Err(self.err(JsonErrorKind::UnexpectedCharacter)),
            None => Err(self.fail_eof(snap)),
        }
    }

    // ── structural tokens ────────────────────────────────────────────

    fn expect_unit(&mut self, b: u8, kind: JsonErrorKind) -> Result<(), JsonError> {
        let snap = self.snapshot();
        self.skip_trivia(false)?;
        match self.peek() {
            None => Err(self.fail_eof(snap)),
            Some(u) if u == b as u32 => {
                self.bump();
                Ok(())
            }
            Some(_) => Err(self.err(kind)),
        }
    }

    pub fn expect_object_start(&mut self) -> Result<(), JsonError> {
        self.expect_unit(b'{', JsonErrorKind::ExpectedObjectStart)?;
        self.push_container(true)?;
        self.token = JsonToken::BeginObject;
        Ok(())
    }

    pub fn expect_array_start(&mut self) -> Result<(), JsonError> {
        self.expect_unit(b'[', JsonErrorKind::ExpectedArrayStart)?;
        self.push_container(false)?;
        self.token = JsonToken::BeginArray;
        Ok(())
    }

    fn push_container(&mut self, is_object: bool) -> Result<(), JsonError> {
        if self.stack.depth() as u32 >= self.opts.max_depth {
            return Err(self.err(JsonErrorKind::DepthExceeded));
        }
        self.stack.push(is_object);
        Ok(())
    }

    fn pop_container(&mut self, is_object: bool) -> Result<(), JsonError> {
        if self.stack.pop() != Some(is_object) {
            return Err(self.err(JsonErrorKind::MismatchedContainer));
        }
        self.token = if is_object {
            JsonToken::EndObject
        } else {
            JsonToken::EndArray
        };
        Ok(())
    }

    pub fn expect_object_end(&mut self) -> Result<(), JsonError> {
        self.expect_unit(b'}', JsonErrorKind::ExpectedObjectEnd)?;
        self.pop_container(true)
    }

    pub fn expect_array_end(&mut self) -> Result<(), JsonError> {
        self.expect_unit(b']', JsonErrorKind::ExpectedArrayEnd)?;
        self.pop_container(false)
    }

    pub fn expect_colon(&mut self) -> Result<(), JsonError> {
        self.expect_unit(b':', JsonErrorKind::ExpectedColon)
    }

    /// Skip trivia and look at the next unit without consuming it.
    pub fn peek_after_ws(&mut self) -> Result<u32, JsonError> {
        let snap = self.snapshot();
        self.skip_trivia(false)?;
        match self.peek() {
            Some(u) => Ok(u),
            None => Err(self.fail_eof(snap)),
        }
    }

    /// Directly after a container start: consume the immediate close if the
    /// container is empty.
    pub fn end_if_empty(&mut self, is_object: bool) -> Result<bool, JsonError> {
        let close = if is_object { b'}' } else { b']' };
        if self.peek_after_ws()? == close as u32 {
            self.bump();
            self.pop_container(is_object)?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn comma_or_end(&mut self, is_object: bool) -> Result<bool, JsonError> {
        let close = if is_object { b'}' } else { b']' };
        let snap = self.snapshot();
        self.skip_trivia(false)?;
        match self.peek() {
            None => Err(self.fail_eof(snap)),
            Some(u) if u == close as u32 => {
                self.bump();
                self.pop_container(is_object)?;
                Ok(true)
            }
            Some(u) if u == b',' as u32 => {
                self.bump();
                // A close directly after the comma is a trailing comma.
                let after = self.snapshot();
                self.skip_trivia(false)?;
                match self.peek() {
                    None => Err(self.fail_eof(after)),
                    Some(u) if u == close as u32 => {
                        if self.opts.allow_trailing_commas {
                            self.bump();
                            self.pop_container(is_object)?;
                            Ok(true)
                        } else {
                            Err(self.err(JsonErrorKind::TrailingComma))
                        }
                    }
                    Some(_) => Ok(false),
                }
            }
            Some(_) => Err(self.err(JsonErrorKind::ExpectedCommaOrEnd)),
        }
    }

    /// After a member value: `true` when the object just closed.
    pub fn comma_or_end_object(&mut self) -> Result<bool, JsonError> {
        self.comma_or_end(true)
    }

    /// After an array element: `true` when the array just closed.
    pub fn comma_or_end_array(&mut self) -> Result<bool, JsonError> {
        self.comma_or_end(false)
    }

    // ── literals ─────────────────────────────────────────────────────

    fn match_literal(&mut self, lit: &'static str, token: JsonToken) -> Result<(), JsonError> {
        let snap = self.snapshot();
        self.skip_trivia(false)?;
        for b in lit.bytes() {
            match self.peek() {
                None => return Err(self.fail_eof(snap)),
                Some(u) if u == b as u32 => self.bump(),
                Some(_) => return Err(self.err(JsonErrorKind::InvalidLiteral)),
            }
        }
        self.token = token;
        Ok(())
    }

    pub fn read_bool(&mut self) -> Result<bool, JsonError> {
        match self.peek_after_ws()? {
            u if u == b't' as u32 => {
                self.match_literal("true", JsonToken::True)?;
                Ok(true)
            }
            u if u == b'f' as u32 => {
                self.match_literal("false", JsonToken::False)?;
                Ok(false)
            }
            _ => Err(self.err(JsonErrorKind::InvalidLiteral)),
        }
    }

    pub fn read_null(&mut self) -> Result<(), JsonError> {
        self.match_literal("null", JsonToken::Null)
    }

    /// Consume `null` if it is next; `true` when it was.
    pub fn try_null(&mut self) -> Result<bool, JsonError> {
        if self.peek_after_ws()? == b'n' as u32 {
            self.read_null()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    // ── strings ──────────────────────────────────────────────────────

    /// Read a string token as raw units. Fast path: no escape, no control
    /// character yields a zero-copy slice of the input. Slow path: unescaped
    /// into an owned buffer.
    pub fn read_string_units(&mut self) -> Result<Cow<'de, [S]>, JsonError> {
        let units = self.scan_string(JsonErrorKind::ExpectedString)?;
        self.token = JsonToken::String;
        Ok(units)
    }

    /// Read a property-name token as raw units.
    pub fn read_property_name_units(&mut self) -> Result<Cow<'de, [S]>, JsonError> {
        let units = self.scan_string(JsonErrorKind::ExpectedPropertyName)?;
        self.token = JsonToken::PropertyName;
        Ok(units)
    }

    /// Read a string token and decode it to an owned string.
    pub fn read_string(&mut self) -> Result<String, JsonError> {
        let units = self.read_string_units()?;
        S::decode_owned(&units).map_err(|kind| self.err(kind))
    }

    fn scan_string(&mut self, expected: JsonErrorKind) -> Result<Cow<'de, [S]>, JsonError> {
        let snap = self.snapshot();
        self.skip_trivia(false)?;
        match self.peek() {
            None => return Err(self.fail_eof(snap)),
            Some(u) if u == b'"' as u32 => self.bump(),
            Some(_) => return Err(self.err(expected)),
        }
        let start = self.pos;
        loop {
            match self.peek() {
                None => return Err(self.fail_eof_as(snap, JsonErrorKind::UnterminatedString)),
                Some(u) if u == b'"' as u32 => {
                    let slice = &self.input[start..self.pos];
                    self.bump();
                    return Ok(Cow::Borrowed(slice));
                }
                Some(u) if u == b'\\' as u32 => {
                    return self.scan_string_slow(snap, start).map(Cow::Owned);
                }
                Some(u) if u < 0x20 => return Err(self.err(JsonErrorKind::ControlCharacter)),
                Some(_) => self.bump(),
            }
        }
    }

    fn scan_string_slow(&mut self, snap: Snapshot, start: usize) -> Result<Vec<S>, JsonError> {
        let mut buf: Vec<S> = self.input[start..self.pos].to_vec();
        loop {
            match self.peek() {
                None => return Err(self.fail_eof_as(snap, JsonErrorKind::UnterminatedString)),
                Some(u) if u == b'"' as u32 => {
                    self.bump();
                    return Ok(buf);
                }
                Some(u) if u == b'\\' as u32 => {
                    self.bump();
                    self.unescape_one(&mut buf, snap)?;
                }
                Some(u) if u < 0x20 => return Err(self.err(JsonErrorKind::ControlCharacter)),
                Some(_) => {
                    buf.push(self.input[self.pos]);
                    self.bump();
                }
            }
        }
    }

    fn unescape_one(&mut self, buf: &mut Vec<S>, snap: Snapshot) -> Result<(), JsonError> {
        let esc = match self.peek() {
            None => return Err(self.fail_eof(snap)),
            Some(u) => u,
        };
        self.bump();
        let plain = match esc {
            u if u == b'"' as u32 => b'"',
            u if u == b'\\' as u32 => b'\\',
            u if u == b'/' as u32 => b'/',
            u if u == b'b' as u32 => 0x08,
            u if u == b'f' as u32 => 0x0C,
            u if u == b'n' as u32 => b'\n',
            u if u == b'r' as u32 => b'\r',
            u if u == b't' as u32 => b'\t',
            u if u == b'u' as u32 => {
                let unit = self.read_hex_unit(snap)?;
                let c = if (0xD800..=0xDBFF).contains(&unit) {
                    // High surrogate: the low half must follow immediately.
                    if self.peek() != Some(b'\\' as u32) {
                        return Err(self.err(JsonErrorKind::LoneSurrogate));
                    }
                    self.bump();
                    if self.peek() != Some(b'u' as u32) {
                        return Err(self.err(JsonErrorKind::LoneSurrogate));
                    }
                    self.bump();
                    let low = self.read_hex_unit(snap)?;
                    if !(0xDC00..=0xDFFF).contains(&low) {
                        return Err(self.err(JsonErrorKind::LoneSurrogate));
                    }
                    let cp =
                        0x10000 + (((unit as u32) - 0xD800) << 10) + ((low as u32) - 0xDC00);
                    char::from_u32(cp).ok_or_else(|| self.err(JsonErrorKind::InvalidEscape))?
                } else if (0xDC00..=0xDFFF).contains(&unit) {
                    return Err(self.err(JsonErrorKind::LoneSurrogate));
                } else {
                    char::from_u32(unit as u32)
                        .ok_or_else(|| self.err(JsonErrorKind::InvalidEscape))?
                };
                S::push_char(buf, c);
                return Ok(());
            }
            _ => return Err(self.err(JsonErrorKind::InvalidEscape)),
        };
        buf.push(S::from_ascii(plain));
        Ok(())
    }

    fn read_hex_unit(&mut self, snap: Snapshot) -> Result<u16, JsonError> {
        if self.input.len() - self.pos < 4 {
            return Err(self.fail_eof(snap));
        }
        let digits = [
            self.input[self.pos].as_u32(),
            self.input[self.pos + 1].as_u32(),
            self.input[self.pos + 2].as_u32(),
            self.input[self.pos + 3].as_u32(),
        ];
        self.pos += 4;
        hex4(digits).ok_or_else(|| self.err(JsonErrorKind::InvalidEscape))
    }

    // ── numbers ──────────────────────────────────────────────────────

    /// Lex one number token, enforcing the RFC 8259 grammar: optional `-`,
    /// `0` or a non-zero-led digit run, optional fraction, optional
    /// exponent. Leading zeros, bare `.5`, and trailing `.` are rejected.
    pub fn read_number_lex(&mut self) -> Result<NumberLex<'de>, JsonError> {
        let snap = self.snapshot();
        self.skip_trivia(false)?;
        let start = self.pos;

        if self.peek() == Some(b'-' as u32) {
            self.bump();
        }
        match self.peek() {
            None => return Err(self.fail_eof(snap)),
            Some(u) if u == b'0' as u32 => {
                self.bump();
                if matches!(self.peek(), Some(d) if is_digit(d)) {
                    return Err(self.err(JsonErrorKind::InvalidNumber));
                }
            }
            Some(u) if (b'1' as u32..=b'9' as u32).contains(&u) => {
                self.bump();
                self.eat_digits();
            }
            Some(_) => return Err(self.err(JsonErrorKind::InvalidNumber)),
        }

        let mut has_fraction = false;
        if self.peek() == Some(b'.' as u32) {
            self.bump();
            if self.eat_digits() == 0 {
                return match self.peek() {
                    None if !self.is_final_block => Err(self.fail_eof(snap)),
                    _ => Err(self.err(JsonErrorKind::InvalidNumber)),
                };
            }
            has_fraction = true;
        }

        let mut has_exponent = false;
        if matches!(self.peek(), Some(u) if u == b'e' as u32 || u == b'E' as u32) {
            self.bump();
            if matches!(self.peek(), Some(u) if u == b'+' as u32 || u == b'-' as u32) {
                self.bump();
            }
            if self.eat_digits() == 0 {
                return match self.peek() {
                    None if !self.is_final_block => Err(self.fail_eof(snap)),
                    _ => Err(self.err(JsonErrorKind::InvalidNumber)),
                };
            }
            has_exponent = true;
        }

        // At the very end of a non-final block the number may continue in
        // the next segment.
        if self.pos == self.input.len() && !self.is_final_block {
            return Err(self.fail_eof(snap));
        }

        self.token = JsonToken::Number;
        let units = &self.input[start..self.pos];
        let text = match S::as_utf8(units) {
            Some(bytes) => match core::str::from_utf8(bytes) {
                Ok(s) => Cow::Borrowed(s),
                Err(_) => return Err(self.err(JsonErrorKind::InvalidNumber)),
            },
            None => Cow::Owned(units.iter().map(|u| u.as_u32() as u8 as char).collect()),
        };
        Ok(NumberLex {
            text,
            has_fraction,
            has_exponent,
        })
    }

    fn eat_digits(&mut self) -> usize {
        let start = self.pos;
        while matches!(self.peek(), Some(u) if is_digit(u)) {
            self.bump();
        }
        self.pos - start
    }

    // ── skip ─────────────────────────────────────────────────────────

    /// Advance past one entire value, container or primitive.
    pub fn skip_value(&mut self) -> Result<(), JsonError> {
        let snap = self.snapshot();
        match self.skip_value_inner() {
            Ok(()) => Ok(()),
            Err(e) if e.is_incomplete() => {
                self.restore(snap);
                Err(self.err(JsonErrorKind::Incomplete))
            }
            Err(e) => Err(e),
        }
    }

    fn skip_value_inner(&mut self) -> Result<(), JsonError> {
        match self.peek_after_ws()? {
            u if u == b'"' as u32 => {
                self.read_string_units()?;
                Ok(())
            }
            u if u == b'{' as u32 => {
                self.expect_object_start()?;
                if self.end_if_empty(true)? {
                    return Ok(());
                }
                loop {
                    self.read_property_name_units()?;
                    self.expect_colon()?;
                    self.skip_value_inner()?;
                    if self.comma_or_end_object()? {
                        return Ok(());
                    }
                }
            }
            u if u == b'[' as u32 => {
                self.expect_array_start()?;
                if self.end_if_empty(false)? {
                    return Ok(());
                }
                loop {
                    self.skip_value_inner()?;
                    if self.comma_or_end_array()? {
                        return Ok(());
                    }
                }
            }
            u if u == b't' as u32 || u == b'f' as u32 => {
                self.read_bool()?;
                Ok(())
            }
            u if u == b'n' as u32 => self.read_null(),
            u if u == b'-' as u32 || is_digit(u) => {
                self.read_number_lex()?;
                Ok(())
            }
            _ => Err(self.err(JsonErrorKind::UnexpectedCharacter)),
        }
    }

    // ── document end ─────────────────────────────────────────────────

    /// After the top-level value: only trivia may remain.
    pub fn expect_end(&mut self) -> Result<(), JsonError> {
        self.skip_trivia(false)?;
        if self.pos == self.input.len() {
            Ok(())
        } else {
            Err(self.err(JsonErrorKind::UnexpectedCharacter))
        }
    }

    // ── generic token scan ───────────────────────────────────────────

    /// Classify and consume the next token, validating separators and
    /// container context. `Preserve` mode surfaces comments; otherwise they
    /// are trivia. Returns `JsonToken::None` at a clean end of input.
    pub fn read_token(&mut self) -> Result<JsonToken, JsonError> {
        loop {
            let snap = self.snapshot();
            self.skip_trivia(true)?;
            let unit = match self.peek() {
                None => {
                    if self.stack.depth() > 0 {
                        return Err(self.fail_eof(snap));
                    }
                    self.token = JsonToken::None;
                    return Ok(JsonToken::None);
                }
                Some(u) => u,
            };

            let in_object = self.stack.current() == Some(true);
            let at_name_position =
                in_object && (self.token == JsonToken::BeginObject || self.pending_comma);

            match unit {
                u if u == b'/' as u32 => {
                    // Comments are trivia for separator state; keep the last
                    // significant token.
                    self.consume_comment()?;
                    return Ok(JsonToken::Comment);
                }
                u if u == b',' as u32 => {
                    if !self.token.ends_value() || self.pending_comma {
                        return Err(self.err(JsonErrorKind::UnexpectedCharacter));
                    }
                    self.bump();
                    self.pending_comma = true;
                }
                u if u == b':' as u32 => {
                    if self.token != JsonToken::PropertyName || self.colon_seen {
                        return Err(self.err(JsonErrorKind::UnexpectedCharacter));
                    }
                    self.bump();
                    self.colon_seen = true;
                }
                u if u == b'}' as u32 => {
                    if self.pending_comma && !self.opts.allow_trailing_commas {
                        return Err(self.err(JsonErrorKind::TrailingComma));
                    }
                    if self.token == JsonToken::PropertyName {
                        return Err(self.err(JsonErrorKind::UnexpectedCharacter));
                    }
                    self.bump();
                    self.pop_container(true)?;
                    self.pending_comma = false;
                    return Ok(JsonToken::EndObject);
                }
                u if u == b']' as u32 => {
                    if self.pending_comma && !self.opts.allow_trailing_commas {
                        return Err(self.err(JsonErrorKind::TrailingComma));
                    }
                    self.bump();
                    self.pop_container(false)?;
                    self.pending_comma = false;
                    return Ok(JsonToken::EndArray);
                }
                u if u == b'"' as u32 && at_name_position => {
                    self.read_property_name_units()?;
                    self.pending_comma = false;
                    self.colon_seen = false;
                    return Ok(JsonToken::PropertyName);
                }
                _ => {
                    if at_name_position {
                        return Err(self.err(JsonErrorKind::ExpectedPropertyName));
                    }
                    if in_object && self.token == JsonToken::PropertyName && !self.colon_seen {
                        return Err(self.err(JsonErrorKind::ExpectedColon));
                    }
                    if self.stack.depth() > 0 && self.token.ends_value() && !self.pending_comma {
                        return Err(self.err(JsonErrorKind::ExpectedCommaOrEnd));
                    }
                    self.pending_comma = false;
                    self.colon_seen = false;
                    let token = match unit {
                        u if u == b'{' as u32 => {
                            self.expect_object_start()?;
                            JsonToken::BeginObject
                        }
                        u if u == b'[' as u32 => {
                            self.expect_array_start()?;
                            JsonToken::BeginArray
                        }
                        u if u == b'"' as u32 => {
                            self.read_string_units()?;
                            JsonToken::String
                        }
                        u if u == b't' as u32 => {
                            self.match_literal("true", JsonToken::True)?;
                            JsonToken::True
                        }
                        u if u == b'f' as u32 => {
                            self.match_literal("false", JsonToken::False)?;
                            JsonToken::False
                        }
                        u if u == b'n' as u32 => {
                            self.read_null()?;
                            JsonToken::Null
                        }
                        u if u == b'-' as u32 || is_digit(u) => {
                            self.read_number_lex()?;
                            JsonToken::Number
                        }
                        _ => return Err(self.err(JsonErrorKind::UnexpectedCharacter)),
                    };
                    return Ok(token);
                }
            }
        }
    }
}

fn is_digit(u: u32) -> bool {
    (b'0' as u32..=b'9' as u32).contains(&u)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reader(s: &str) -> JsonReader<'_, u8> {
        JsonReader::new(s.as_bytes(), ReadOptions::default())
    }

    fn reader_with(s: &str, opts: ReadOptions) -> JsonReader<'_, u8> {
        JsonReader::new(s.as_bytes(), opts)
    }

    #[test]
    fn bit_stack_spills_past_64() {
        let mut stack = BitStack::default();
        for i in 0..130 {
            stack.push(i % 3 == 0);
        }
        assert_eq!(stack.depth(), 130);
        for i in (0..130).rev() {
            assert_eq!(stack.pop(), Some(i % 3 == 0));
        }
        assert_eq!(stack.pop(), None);
    }

    #[test]
    fn fast_path_string_is_borrowed() {
        let mut r = reader(r#"  "hello""#);
        match r.read_string_units().unwrap() {
            Cow::Borrowed(b) => assert_eq!(b, b"hello"),
            Cow::Owned(_) => panic!("expected zero-copy slice"),
        }
    }

    #[test]
    fn escaped_string_is_unescaped() {
        let mut r = reader(r#""a\"b\\cA😀""#);
        assert_eq!(r.read_string().unwrap(), "a\"b\\cA\u{1F600}");
    }

    #[test]
    fn lone_surrogate_is_rejected() {
        let mut r = reader(r#""\uD800x""#);
        assert_eq!(
            r.read_string().unwrap_err().kind(),
            JsonErrorKind::LoneSurrogate
        );
        let mut r = reader(r#""\uDC00""#);
        assert_eq!(
            r.read_string().unwrap_err().kind(),
            JsonErrorKind::LoneSurrogate
        );
    }

    #[test]
    fn raw_control_in_string_is_rejected() {
        let mut r = reader("\"a\u{1}b\"");
        assert_eq!(
            r.read_string().unwrap_err().kind(),
            JsonErrorKind::ControlCharacter
        );
    }

    #[test]
    fn unknown_escape_is_rejected() {
        let mut r = reader(r#""\q""#);
        assert_eq!(
            r.read_string().unwrap_err().kind(),
            JsonErrorKind::InvalidEscape
        );
    }

    #[test]
    fn number_grammar_is_strict() {
        assert_eq!(reader("1e10").read_number_lex().unwrap().text, "1e10");
        assert_eq!(reader("1.5e-3").read_number_lex().unwrap().text, "1.5e-3");
        assert_eq!(reader("0.0").read_number_lex().unwrap().text, "0.0");
        assert_eq!(reader("-0").read_number_lex().unwrap().text, "-0");
        for bad in ["01", ".5", "1.", "+1", "1e", "--1"] {
            assert!(reader(bad).read_number_lex().is_err(), "{bad:?} accepted");
        }
    }

    #[test]
    fn number_lex_records_shape() {
        let mut r = reader("1.25e3 ");
        let lex = r.read_number_lex().unwrap();
        assert!(lex.has_fraction);
        assert!(lex.has_exponent);
        let lex = reader("42 ").read_number_lex().unwrap();
        assert!(!lex.has_fraction && !lex.has_exponent);
    }

    #[test]
    fn depth_ceiling_is_enforced() {
        let deep = "[".repeat(65);
        let mut r = reader(&deep);
        let mut last = Ok(());
        for _ in 0..65 {
            last = r.expect_array_start();
            if last.is_err() {
                break;
            }
        }
        assert_eq!(last.unwrap_err().kind(), JsonErrorKind::DepthExceeded);
    }

    #[test]
    fn mismatched_container_is_rejected() {
        let mut r = reader("[}");
        r.expect_array_start().unwrap();
        assert_eq!(
            r.read_token().unwrap_err().kind(),
            JsonErrorKind::MismatchedContainer
        );
    }

    #[test]
    fn line_and_column_are_tracked() {
        let mut r = reader("{\n  \"a\": x");
        r.expect_object_start().unwrap();
        r.read_property_name_units().unwrap();
        r.expect_colon().unwrap();
        let err = r.skip_value().unwrap_err();
        assert_eq!(err.line(), Some(2));
        assert_eq!(err.column(), Some(7));
    }

    #[test]
    fn comments_are_rejected_by_default() {
        let mut r = reader("// hey\n1");
        assert_eq!(
            r.read_number_lex().unwrap_err().kind(),
            JsonErrorKind::CommentDisallowed
        );
    }

    #[test]
    fn comments_are_skipped_when_enabled() {
        let opts = ReadOptions {
            comments: CommentHandling::Skip,
            ..ReadOptions::default()
        };
        let mut r = reader_with("/* c */ { /* c */ \"a\" /* c */ : 1 // c\n }", opts);
        r.expect_object_start().unwrap();
        assert!(!r.end_if_empty(true).unwrap());
        r.read_property_name_units().unwrap();
        r.expect_colon().unwrap();
        assert_eq!(r.read_number_lex().unwrap().text, "1");
        assert!(r.comma_or_end_object().unwrap());
        r.expect_end().unwrap();
    }

    #[test]
    fn preserve_mode_surfaces_comment_tokens() {
        let opts = ReadOptions {
            comments: CommentHandling::Preserve,
            ..ReadOptions::default()
        };
        let mut r = reader_with("/* a */ 1", opts);
        assert_eq!(r.read_token().unwrap(), JsonToken::Comment);
        assert_eq!(r.read_token().unwrap(), JsonToken::Number);
    }

    #[test]
    fn trailing_comma_matrix() {
        let mut r = reader(r#"{"a":1,}"#);
        r.expect_object_start().unwrap();
        r.read_property_name_units().unwrap();
        r.expect_colon().unwrap();
        r.read_number_lex().unwrap();
        assert_eq!(
            r.comma_or_end_object().unwrap_err().kind(),
            JsonErrorKind::TrailingComma
        );

        let opts = ReadOptions {
            allow_trailing_commas: true,
            ..ReadOptions::default()
        };
        let mut r = reader_with(r#"{"a":1,}"#, opts);
        r.expect_object_start().unwrap();
        r.read_property_name_units().unwrap();
        r.expect_colon().unwrap();
        r.read_number_lex().unwrap();
        assert!(r.comma_or_end_object().unwrap());
    }

    #[test]
    fn skip_value_passes_whole_containers() {
        let mut r = reader(r#"{"a":[1,{"b":"x"},null],"c":2} "#);
        r.skip_value().unwrap();
        r.expect_end().unwrap();
        assert_eq!(r.depth(), 0);
    }

    #[test]
    fn bom_is_rejected() {
        let mut r = reader("\u{FEFF}1");
        assert_eq!(
            r.read_number_lex().unwrap_err().kind(),
            JsonErrorKind::BomRejected
        );
        let units: Vec<u16> = [0xFEFFu16, b'1' as u16].to_vec();
        let mut r = JsonReader::<u16>::new(&units, ReadOptions::default());
        assert_eq!(
            r.read_number_lex().unwrap_err().kind(),
            JsonErrorKind::BomRejected
        );
    }

    #[test]
    fn incomplete_token_rolls_back() {
        let mut r = JsonReader::<u8>::non_final(br#"{"name": "Ali"#, ReadOptions::default());
        r.expect_object_start().unwrap();
        r.read_property_name_units().unwrap();
        r.expect_colon().unwrap();
        let before = r.position();
        let err = r.read_string_units().unwrap_err();
        assert!(err.is_incomplete());
        assert_eq!(r.position(), before);
        assert_eq!(r.depth(), 1);
    }

    #[test]
    fn incomplete_number_at_block_end() {
        let mut r = JsonReader::<u8>::non_final(b"123", ReadOptions::default());
        assert!(r.read_number_lex().unwrap_err().is_incomplete());
        assert_eq!(r.position(), 0);
        // The same bytes as a final block form a complete number.
        let mut r = reader("123");
        assert_eq!(r.read_number_lex().unwrap().text, "123");
    }

    #[test]
    fn utf16_reader_matches_utf8_reader() {
        let doc = r#"{"a": [1, "two", true]}"#;
        let units: Vec<u16> = doc.encode_utf16().collect();
        let mut a = reader(doc);
        let mut b = JsonReader::<u16>::new(&units, ReadOptions::default());
        loop {
            let ta = a.read_token().unwrap();
            let tb = b.read_token().unwrap();
            assert_eq!(ta, tb);
            if ta == JsonToken::None {
                break;
            }
        }
    }

    #[test]
    fn token_stream_for_nested_document() {
        use JsonToken::*;
        let mut r = reader(r#"{"a":1,"b":[2,3],"c":{"d":true}}"#);
        let expected = [
            BeginObject,
            PropertyName,
            Number,
            PropertyName,
            BeginArray,
            Number,
            Number,
            EndArray,
            PropertyName,
            BeginObject,
            PropertyName,
            True,
            EndObject,
            EndObject,
            None,
        ];
        for want in expected {
            assert_eq!(r.read_token().unwrap(), want);
        }
    }

    #[test]
    fn values_without_separator_are_rejected() {
        let mut r = reader("[1 2]");
        r.read_token().unwrap();
        r.read_token().unwrap();
        assert_eq!(
            r.read_token().unwrap_err().kind(),
            JsonErrorKind::ExpectedCommaOrEnd
        );
    }
}
