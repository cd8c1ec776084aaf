use core::fmt;

use thiserror::Error;

/// One discriminant per failure class. Reads produce the parser kinds,
/// writes produce the format kinds, and formatter generation produces
/// `Unsupported`/`DuplicateMemberName`.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsonErrorKind {
    #[error("unexpected end of input")]
    Eof,
    #[error("expected '{{'")]
    ExpectedObjectStart,
    #[error("expected '}}'")]
    ExpectedObjectEnd,
    #[error("expected '['")]
    ExpectedArrayStart,
    #[error("expected ']'")]
    ExpectedArrayEnd,
    #[error("expected ':'")]
    ExpectedColon,
    #[error("expected ',' or end of container")]
    ExpectedCommaOrEnd,
    #[error("expected a property name")]
    ExpectedPropertyName,
    #[error("expected a string")]
    ExpectedString,
    #[error("closing bracket does not match open container")]
    MismatchedContainer,
    #[error("trailing comma not allowed")]
    TrailingComma,
    #[error("comments not allowed")]
    CommentDisallowed,
    #[error("unterminated comment")]
    UnterminatedComment,
    #[error("byte-order mark not allowed")]
    BomRejected,
    #[error("unknown literal")]
    InvalidLiteral,
    #[error("invalid number")]
    InvalidNumber,
    #[error("number out of range")]
    NumberOutOfRange,
    #[error("unterminated string")]
    UnterminatedString,
    #[error("invalid escape sequence")]
    InvalidEscape,
    #[error("unpaired surrogate")]
    LoneSurrogate,
    #[error("control character in string")]
    ControlCharacter,
    #[error("invalid UTF-8")]
    InvalidUtf8,
    #[error("invalid UTF-16")]
    InvalidUtf16,
    #[error("unexpected character")]
    UnexpectedCharacter,
    #[error("maximum depth exceeded")]
    DepthExceeded,
    #[error("invalid date")]
    InvalidDate,
    #[error("invalid time span")]
    InvalidTimeSpan,
    #[error("invalid GUID")]
    InvalidGuid,
    #[error("invalid version")]
    InvalidVersion,
    #[error("invalid URI")]
    InvalidUri,
    #[error("non-finite number cannot be written")]
    NonFiniteFloat,
    #[error("unsupported type")]
    Unsupported,
    #[error("duplicate member name")]
    DuplicateMemberName,
    #[error("missing required member")]
    MissingMember,
    #[error("needs more data")]
    Incomplete,
}

/// Error produced by a reader, a writer, or formatter generation.
///
/// Carries the byte (or code-unit) offset where the failure was detected.
/// Reader errors additionally carry the line and the byte-in-line. The
/// `Incomplete` kind is a control signal from a non-final input block, not
/// a failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonError {
    kind: JsonErrorKind,
    offset: usize,
    location: Option<(u32, u32)>,
    parsing: Option<&'static str>,
}

impl JsonError {
    pub(crate) fn new(kind: JsonErrorKind, offset: usize) -> Self {
        JsonError {
            kind,
            offset,
            location: None,
            parsing: None,
        }
    }

    pub(crate) fn located(kind: JsonErrorKind, offset: usize, line: u32, column: u32) -> Self {
        JsonError {
            kind,
            offset,
            location: Some((line, column)),
            parsing: None,
        }
    }

    /// Tag this error with the JSON value type being parsed ("integer",
    /// "datetime", ...).
    pub(crate) fn while_parsing(mut self, what: &'static str) -> Self {
        self.parsing = Some(what);
        self
    }

    pub fn kind(&self) -> JsonErrorKind {
        self.kind
    }

    /// Offset of the offending unit, in bytes for the UTF-8 lane and in
    /// code units for the UTF-16 lane.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// 1-based line number, when the error came from a reader.
    pub fn line(&self) -> Option<u32> {
        self.location.map(|(l, _)| l)
    }

    /// 0-based unit-in-line, when the error came from a reader.
    pub fn column(&self) -> Option<u32> {
        self.location.map(|(_, c)| c)
    }

    /// True for the needs-more-data control signal of a non-final block.
    pub fn is_incomplete(&self) -> bool {
        self.kind == JsonErrorKind::Incomplete
    }
}

impl fmt::Display for JsonError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;
        if let Some(what) = self.parsing {
            write!(f, " while parsing {what}")?;
        }
        match self.location {
            Some((line, column)) => write!(f, " at {line}:{column} (offset {})", self.offset),
            None => write!(f, " at offset {}", self.offset),
        }
    }
}

impl std::error::Error for JsonError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_location() {
        let err = JsonError::located(JsonErrorKind::InvalidNumber, 42, 3, 17).while_parsing("integer");
        assert_eq!(
            err.to_string(),
            "invalid number while parsing integer at 3:17 (offset 42)"
        );
        assert_eq!(err.line(), Some(3));
        assert_eq!(err.column(), Some(17));
    }

    #[test]
    fn display_without_location() {
        let err = JsonError::new(JsonErrorKind::NonFiniteFloat, 9);
        assert_eq!(err.to_string(), "non-finite number cannot be written at offset 9");
        assert_eq!(err.line(), None);
    }
}
