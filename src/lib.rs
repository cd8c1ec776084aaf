//! JSON codec engine with per-type formatters synthesized at first use.
//!
//! A type describes itself once through [`JsonShape`]; the resolver turns
//! that description into a serializer/deserializer closure pair on first
//! request and caches it by `(type, lane, resolver)` identity. Readers and
//! writers come in two lanes, UTF-8 bytes and UTF-16 code units, and
//! monomorphize per lane.
//!
//! The free functions below run on the shared strict RFC 8259 resolver;
//! build a [`JsonResolver`] for camelCase naming, null exclusion, HTML or
//! non-ASCII escaping, comments, or trailing commas.

mod composite;
mod dispatch;
mod pool;
mod scalar;

pub mod datetime;
pub mod decimal;
pub mod error;
pub mod escape;
pub mod reader;
pub mod resolver;
pub mod shape;
pub mod symbol;
pub mod value;
pub mod writer;

pub use datetime::Version;
pub use decimal::Decimal;
pub use error::{JsonError, JsonErrorKind};
pub use escape::EscapeMode;
pub use reader::{CommentHandling, JsonReader, JsonToken, ReadOptions};
pub use resolver::{Formatter, JsonResolver, NamingConvention, NumberMode, ResolverConfig};
pub use shape::{JsonShape, ObjectShape, Shape, SlotArray};
pub use symbol::Sym;
pub use value::{JsonMap, JsonNumber, JsonValue};
pub use writer::JsonWriter;

/// Serialize to UTF-8 bytes with the strict resolver.
pub fn to_vec<T: JsonShape>(value: &T) -> Result<Vec<u8>, JsonError> {
    JsonResolver::strict().to_vec(value)
}

/// Serialize to an owned string with the strict resolver.
pub fn to_string<T: JsonShape>(value: &T) -> Result<String, JsonError> {
    JsonResolver::strict().to_string(value)
}

/// Serialize to UTF-16 code units with the strict resolver.
pub fn to_utf16<T: JsonShape>(value: &T) -> Result<Vec<u16>, JsonError> {
    JsonResolver::strict().to_utf16(value)
}

/// Deserialize a whole UTF-8 document with the strict resolver.
pub fn from_slice<T: JsonShape>(input: &[u8]) -> Result<T, JsonError> {
    JsonResolver::strict().from_slice(input)
}

/// Deserialize a whole document from text with the strict resolver.
pub fn from_str<T: JsonShape>(input: &str) -> Result<T, JsonError> {
    JsonResolver::strict().from_str(input)
}

/// Deserialize a whole UTF-16 document with the strict resolver.
pub fn from_utf16<T: JsonShape>(input: &[u16]) -> Result<T, JsonError> {
    JsonResolver::strict().from_utf16(input)
}

/// Deserialize one document from the front of `input`, reporting its byte
/// length; trailing bytes are not touched.
pub fn from_slice_prefix<T: JsonShape>(input: &[u8]) -> Result<(T, usize), JsonError> {
    JsonResolver::strict().from_slice_prefix(input)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Datelike, FixedOffset, NaiveDateTime, Timelike, Utc};

    #[derive(Debug, PartialEq, Default)]
    struct Friend {
        age: u32,
        name: String,
    }

    impl JsonShape for Friend {
        fn shape<S: Sym>() -> Shape<Self, S> {
            Shape::Object(
                ObjectShape::new(Friend::default)
                    .field("age", |f: &Friend| &f.age, |f: &mut Friend, v| f.age = v)
                    .field("name", |f: &Friend| &f.name, |f: &mut Friend, v| f.name = v),
            )
        }
    }

    #[test]
    fn json_flat_struct() {
        let input = br#"{"age": 42, "name": "Alice"}"#;
        let result: Friend = from_slice(input).unwrap();
        assert_eq!(
            result,
            Friend {
                age: 42,
                name: "Alice".into()
            }
        );
    }

    #[test]
    fn json_reversed_key_order() {
        let input = br#"{"name": "Alice", "age": 42}"#;
        let result: Friend = from_slice(input).unwrap();
        assert_eq!(result.age, 42);
        assert_eq!(result.name, "Alice");
    }

    #[test]
    fn json_unknown_keys_skipped() {
        let input = br#"{"age": 42, "extra": {"deep": [1,2]}, "name": "Alice"}"#;
        let result: Friend = from_slice(input).unwrap();
        assert_eq!(result.age, 42);
        assert_eq!(result.name, "Alice");
    }

    #[test]
    fn serialize_follows_declaration_order() {
        let friend = Friend {
            age: 42,
            name: "Alice".into(),
        };
        assert_eq!(to_string(&friend).unwrap(), r#"{"age":42,"name":"Alice"}"#);
    }

    #[test]
    fn message_scenario() {
        #[derive(Debug, PartialEq, Default)]
        struct Greeting {
            message: String,
        }
        impl JsonShape for Greeting {
            fn shape<S: Sym>() -> Shape<Self, S> {
                Shape::Object(ObjectShape::new(Greeting::default).field(
                    "message",
                    |g: &Greeting| &g.message,
                    |g: &mut Greeting, v| g.message = v,
                ))
            }
        }

        let parsed: Greeting = from_slice(br#"{ "message": "Hello, World!" }"#).unwrap();
        assert_eq!(parsed.message, "Hello, World!");
        assert_eq!(
            to_string(&parsed).unwrap(),
            r#"{"message":"Hello, World!"}"#
        );
    }

    #[derive(Debug, PartialEq, Default)]
    struct Tri {
        first: Option<i32>,
        second: Option<bool>,
        third: Option<String>,
    }

    impl JsonShape for Tri {
        fn shape<S: Sym>() -> Shape<Self, S> {
            Shape::Object(
                ObjectShape::new(Tri::default)
                    .field("First", |t: &Tri| &t.first, |t: &mut Tri, v| t.first = v)
                    .field("Second", |t: &Tri| &t.second, |t: &mut Tri, v| {
                        t.second = v
                    })
                    .field("Third", |t: &Tri| &t.third, |t: &mut Tri, v| t.third = v),
            )
        }
    }

    #[test]
    fn nulls_land_as_none() {
        let parsed: Tri = from_slice(br#"{"First":null,"Second":null,"Third":null}"#).unwrap();
        assert_eq!(parsed, Tri::default());
    }

    #[test]
    fn exclude_nulls_resolver_drops_none_members() {
        let resolver = JsonResolver::new(ResolverConfig {
            exclude_nulls: true,
            ..ResolverConfig::default()
        });
        let value = Tri {
            second: Some(true),
            ..Tri::default()
        };
        assert_eq!(resolver.to_string(&value).unwrap(), r#"{"Second":true}"#);
        // The strict resolver keeps them.
        assert_eq!(
            to_string(&value).unwrap(),
            r#"{"First":null,"Second":true,"Third":null}"#
        );
    }

    #[derive(Debug, PartialEq, Default)]
    struct Inner {
        d: bool,
    }

    impl JsonShape for Inner {
        fn shape<S: Sym>() -> Shape<Self, S> {
            Shape::Object(ObjectShape::new(Inner::default).field(
                "d",
                |i: &Inner| &i.d,
                |i: &mut Inner, v| i.d = v,
            ))
        }
    }

    #[derive(Debug, PartialEq, Default)]
    struct Doc {
        a: i64,
        b: Vec<i64>,
        c: Inner,
    }

    impl JsonShape for Doc {
        fn shape<S: Sym>() -> Shape<Self, S> {
            Shape::Object(
                ObjectShape::new(Doc::default)
                    .field("a", |d: &Doc| &d.a, |d: &mut Doc, v| d.a = v)
                    .field("b", |d: &Doc| &d.b, |d: &mut Doc, v| d.b = v)
                    .field("c", |d: &Doc| &d.c, |d: &mut Doc, v| d.c = v),
            )
        }
    }

    #[test]
    fn nested_document_roundtrips_to_same_bytes() {
        let input = br#"{"a":1,"b":[2,3,4],"c":{"d":true}}"#;
        let parsed: Doc = from_slice(input).unwrap();
        assert_eq!(
            parsed,
            Doc {
                a: 1,
                b: vec![2, 3, 4],
                c: Inner { d: true },
            }
        );
        assert_eq!(to_vec(&parsed).unwrap(), input);
    }

    #[test]
    fn utf16_lane_agrees_with_utf8_lane() {
        let doc = r#"{"a":1,"b":[2,3,4],"c":{"d":true}}"#;
        let units: Vec<u16> = doc.encode_utf16().collect();
        let from8: Doc = from_str(doc).unwrap();
        let from16: Doc = from_utf16(&units).unwrap();
        assert_eq!(from8, from16);

        let written = to_utf16(&from8).unwrap();
        assert_eq!(written, units);
    }

    // ── strings and escapes ──────────────────────────────────────────

    #[test]
    fn escape_payload_is_identical_on_both_lanes() {
        let s = "a\"b\\c\u{1}".to_owned();
        let bytes = to_vec(&s).unwrap();
        assert_eq!(bytes, br#""a\"b\\c\u0001""#);
        let units = to_utf16(&s).unwrap();
        let narrowed: Vec<u8> = units.iter().map(|&u| u as u8).collect();
        assert_eq!(narrowed, bytes);
    }

    #[test]
    fn empty_string_roundtrips() {
        let bytes = to_vec(&String::new()).unwrap();
        assert_eq!(bytes, br#""""#);
        assert_eq!(from_slice::<String>(&bytes).unwrap(), "");
    }

    #[test]
    fn every_control_character_roundtrips() {
        let s: String = (0u8..0x20).map(char::from).collect();
        let bytes = to_vec(&s).unwrap();
        assert_eq!(from_slice::<String>(&bytes).unwrap(), s);
    }

    #[test]
    fn surrogate_pair_escapes_roundtrip() {
        let parsed: String = from_slice(br#""\ud83d\ude00!""#).unwrap();
        assert_eq!(parsed, "\u{1F600}!");
        let s = "mixed \u{1F600} and \"quotes\"".to_owned();
        assert_eq!(from_slice::<String>(&to_vec(&s).unwrap()).unwrap(), s);
    }

    // ── numbers ──────────────────────────────────────────────────────

    #[test]
    fn min_signed_64_roundtrips() {
        let bytes = to_vec(&i64::MIN).unwrap();
        assert_eq!(bytes, b"-9223372036854775808");
        assert_eq!(from_slice::<i64>(&bytes).unwrap(), i64::MIN);
    }

    #[test]
    fn negative_zero_integer_normalizes() {
        assert_eq!(from_slice::<i64>(b"-0").unwrap(), 0);
        assert_eq!(to_vec(&0i64).unwrap(), b"0");
    }

    #[test]
    fn malformed_numbers_are_rejected() {
        for bad in [&b"01"[..], b".5", b"1.", b"+1", b"1e"] {
            assert!(from_slice::<f64>(bad).is_err(), "{bad:?} accepted");
        }
        assert_eq!(from_slice::<f64>(b"1e10").unwrap(), 1e10);
        assert_eq!(from_slice::<f64>(b"1.5e-3").unwrap(), 0.0015);
        assert_eq!(from_slice::<f64>(b"0.0").unwrap(), 0.0);
    }

    #[test]
    fn integer_overflow_is_out_of_range() {
        let err = from_slice::<u8>(b"256").unwrap_err();
        assert_eq!(err.kind(), JsonErrorKind::NumberOutOfRange);
        let err = from_slice::<i32>(b"1.5").unwrap_err();
        assert_eq!(err.kind(), JsonErrorKind::InvalidNumber);
    }

    #[test]
    fn decimal_preserves_digits_a_double_would_lose() {
        let text = b"0.1234567890123456789012345678";
        let d: Decimal = from_slice(text).unwrap();
        assert_eq!(to_vec(&d).unwrap(), text);
    }

    // ── dates, spans, guids, versions ────────────────────────────────

    #[test]
    fn utc_datetime_roundtrips() {
        let text = br#""1997-07-16T19:20:30.4500000Z""#;
        let t: DateTime<Utc> = from_slice(text).unwrap();
        assert_eq!(t.nanosecond(), 450_000_000);
        assert_eq!(to_vec(&t).unwrap(), text);
    }

    #[test]
    fn offset_datetime_roundtrips_with_full_fraction() {
        let t: DateTime<FixedOffset> = from_slice(br#""1997-07-16T19:20:30+01:00""#).unwrap();
        assert_eq!(
            to_string(&t).unwrap(),
            r#""1997-07-16T19:20:30.0000000+01:00""#
        );
        let back: DateTime<FixedOffset> = from_str(&to_string(&t).unwrap()).unwrap();
        assert_eq!(back, t);
    }

    #[test]
    fn date_only_parses_as_unspecified_midnight() {
        let t: NaiveDateTime = from_slice(br#""1997-07-16""#).unwrap();
        assert_eq!((t.year(), t.month(), t.day()), (1997, 7, 16));
        assert_eq!((t.hour(), t.minute(), t.second()), (0, 0, 0));
    }

    #[test]
    fn long_fractions_truncate_to_seven_digits() {
        let t: DateTime<Utc> = from_slice(br#""1997-07-16T19:20:30.45678901Z""#).unwrap();
        assert_eq!(t.nanosecond(), 456_789_000);
    }

    #[test]
    fn timespan_guid_version_roundtrip() {
        let span: chrono::TimeDelta = from_slice(br#""-3.04:05:06.7000000""#).unwrap();
        assert_eq!(to_vec(&span).unwrap(), br#""-3.04:05:06.7000000""#);

        let guid: uuid::Uuid = from_slice(br#""01234567-89ab-cdef-0123-456789abcdef""#).unwrap();
        assert_eq!(
            to_vec(&guid).unwrap(),
            br#""01234567-89ab-cdef-0123-456789abcdef""#
        );

        let version: Version = from_slice(br#""10.0.19041.1""#).unwrap();
        assert_eq!(version, Version::with_revision(10, 0, 19041, 1));
        assert_eq!(to_vec(&version).unwrap(), br#""10.0.19041.1""#);
    }

    // ── depth ────────────────────────────────────────────────────────

    #[test]
    fn deep_nesting_fails_before_returning() {
        let input = "[".repeat(65);
        let err = from_slice::<JsonValue>(input.as_bytes()).unwrap_err();
        assert_eq!(err.kind(), JsonErrorKind::DepthExceeded);
    }

    #[test]
    fn deep_value_fails_on_write() {
        let mut v = JsonValue::Array(Vec::new());
        for _ in 0..65 {
            v = JsonValue::Array(vec![v]);
        }
        let err = to_vec(&v).unwrap_err();
        assert_eq!(err.kind(), JsonErrorKind::DepthExceeded);
    }

    // ── comments and trailing commas ─────────────────────────────────

    #[derive(Debug, PartialEq, Default)]
    struct OneA {
        a: i64,
    }

    impl JsonShape for OneA {
        fn shape<S: Sym>() -> Shape<Self, S> {
            Shape::Object(ObjectShape::new(OneA::default).field(
                "a",
                |o: &OneA| &o.a,
                |o: &mut OneA, v| o.a = v,
            ))
        }
    }

    #[test]
    fn comments_in_skip_mode() {
        let resolver = JsonResolver::new(ResolverConfig {
            comments: CommentHandling::Skip,
            ..ResolverConfig::default()
        });
        let parsed: OneA = resolver
            .from_str("/* c */ { /* c */ \"a\" /* c */ : 1 // c\n }")
            .unwrap();
        assert_eq!(parsed, OneA { a: 1 });
    }

    #[test]
    fn trailing_commas_only_when_allowed() {
        assert!(from_slice::<Vec<i64>>(b"[1,2,]").is_err());
        let resolver = JsonResolver::new(ResolverConfig {
            allow_trailing_commas: true,
            ..ResolverConfig::default()
        });
        assert_eq!(
            resolver.from_slice::<Vec<i64>>(b"[1,2,]").unwrap(),
            vec![1, 2]
        );
        assert_eq!(
            resolver.from_slice::<OneA>(br#"{"a":1,}"#).unwrap(),
            OneA { a: 1 }
        );
    }

    // ── document framing ─────────────────────────────────────────────

    #[test]
    fn prefix_read_reports_document_length() {
        let input = br#"{"a":1}   trailing garbage"#;
        let (parsed, consumed) = from_slice_prefix::<OneA>(input).unwrap();
        assert_eq!(parsed, OneA { a: 1 });
        assert_eq!(consumed, 7);
    }

    #[test]
    fn whole_document_read_rejects_trailing_garbage() {
        assert!(from_slice::<OneA>(br#"{"a":1} x"#).is_err());
        assert!(from_slice::<OneA>(br#"{"a":1}   "#).is_ok());
    }

    // ── naming conventions ───────────────────────────────────────────

    #[derive(Debug, PartialEq, Default)]
    struct Person {
        first_name: String,
        home_town: Option<String>,
    }

    impl JsonShape for Person {
        fn shape<S: Sym>() -> Shape<Self, S> {
            Shape::Object(
                ObjectShape::new(Person::default)
                    .field(
                        "first_name",
                        |p: &Person| &p.first_name,
                        |p: &mut Person, v| p.first_name = v,
                    )
                    .field(
                        "home_town",
                        |p: &Person| &p.home_town,
                        |p: &mut Person, v| p.home_town = v,
                    ),
            )
        }
    }

    #[test]
    fn camel_case_resolver_renames_members() {
        let resolver = JsonResolver::new(ResolverConfig {
            naming: NamingConvention::CamelCase,
            ..ResolverConfig::default()
        });
        let person = Person {
            first_name: "Ada".into(),
            home_town: None,
        };
        assert_eq!(
            resolver.to_string(&person).unwrap(),
            r#"{"firstName":"Ada","homeTown":null}"#
        );
        let parsed: Person = resolver
            .from_str(r#"{"firstName":"Ada","homeTown":null}"#)
            .unwrap();
        assert_eq!(parsed, person);
        // Declared names are not matched under the renamed convention.
        let missed: Person = resolver.from_str(r#"{"first_name":"Ada"}"#).unwrap();
        assert_eq!(missed.first_name, "");
    }

    #[test]
    fn ada_case_resolver_renames_members() {
        let resolver = JsonResolver::new(ResolverConfig {
            naming: NamingConvention::AdaCase,
            ..ResolverConfig::default()
        });
        let parsed: Person = resolver.from_str(r#"{"FIRST_NAME":"Grace"}"#).unwrap();
        assert_eq!(parsed.first_name, "Grace");
    }

    #[test]
    fn duplicate_names_after_convention_poison_the_formatter() {
        #[derive(Debug, PartialEq, Default)]
        struct Clash {
            a_b: u32,
            a__b: u32,
        }
        impl JsonShape for Clash {
            fn shape<S: Sym>() -> Shape<Self, S> {
                Shape::Object(
                    ObjectShape::new(Clash::default)
                        .field("a_b", |c: &Clash| &c.a_b, |c: &mut Clash, v| c.a_b = v)
                        .field("a__b", |c: &Clash| &c.a__b, |c: &mut Clash, v| {
                            c.a__b = v
                        }),
                )
            }
        }
        let resolver = JsonResolver::new(ResolverConfig {
            naming: NamingConvention::CamelCase,
            ..ResolverConfig::default()
        });
        let err = resolver.to_vec(&Clash::default()).unwrap_err();
        assert_eq!(err.kind(), JsonErrorKind::DuplicateMemberName);
        // The poisoned entry keeps failing on later requests.
        let err = resolver.from_slice::<Clash>(b"{}").unwrap_err();
        assert_eq!(err.kind(), JsonErrorKind::DuplicateMemberName);
        // The declared-name resolver is unaffected.
        assert!(to_vec(&Clash::default()).is_ok());
    }

    // ── predicates, extension data, constructors ─────────────────────

    #[test]
    fn should_serialize_predicate_skips_members() {
        #[derive(Debug, PartialEq, Default)]
        struct Account {
            name: String,
            secret: String,
        }
        impl JsonShape for Account {
            fn shape<S: Sym>() -> Shape<Self, S> {
                Shape::Object(
                    ObjectShape::new(Account::default)
                        .field(
                            "name",
                            |a: &Account| &a.name,
                            |a: &mut Account, v| a.name = v,
                        )
                        .field(
                            "secret",
                            |a: &Account| &a.secret,
                            |a: &mut Account, v| a.secret = v,
                        )
                        .serialize_if(|a: &Account| !a.secret.is_empty()),
                )
            }
        }
        let hidden = Account {
            name: "k".into(),
            secret: String::new(),
        };
        assert_eq!(to_string(&hidden).unwrap(), r#"{"name":"k"}"#);
        let shown = Account {
            name: "k".into(),
            secret: "s".into(),
        };
        assert_eq!(to_string(&shown).unwrap(), r#"{"name":"k","secret":"s"}"#);
    }

    #[test]
    fn extension_data_catches_and_replays_unknown_members() {
        #[derive(Debug, PartialEq, Default)]
        struct Extra {
            id: u32,
            rest: JsonMap,
        }
        impl JsonShape for Extra {
            fn shape<S: Sym>() -> Shape<Self, S> {
                Shape::Object(
                    ObjectShape::new(Extra::default)
                        .field("id", |e: &Extra| &e.id, |e: &mut Extra, v| e.id = v)
                        .extension(|e: &Extra| &e.rest, |e: &mut Extra| &mut e.rest),
                )
            }
        }
        let parsed: Extra = from_slice(br#"{"id":7,"x":true,"y":[1,2]}"#).unwrap();
        assert_eq!(parsed.id, 7);
        assert_eq!(parsed.rest.len(), 2);
        assert_eq!(parsed.rest["x"], JsonValue::Bool(true));
        assert_eq!(to_string(&parsed).unwrap(), r#"{"id":7,"x":true,"y":[1,2]}"#);
    }

    #[test]
    fn constructor_materialization() {
        #[derive(Debug, PartialEq)]
        struct Span {
            start: u32,
            len: u32,
        }
        impl JsonShape for Span {
            fn shape<S: Sym>() -> Shape<Self, S> {
                Shape::Object(
                    ObjectShape::with_ctor(2, |slots: &mut SlotArray| {
                        Ok(Span {
                            start: slots.take::<u32>(0)?,
                            len: slots.take::<u32>(1)?,
                        })
                    })
                    .ctor_param("start", 0, |s: &Span| &s.start)
                    .ctor_param("len", 1, |s: &Span| &s.len),
                )
            }
        }
        let parsed: Span = from_slice(br#"{"len":4,"start":10}"#).unwrap();
        assert_eq!(parsed, Span { start: 10, len: 4 });
        assert_eq!(to_string(&parsed).unwrap(), r#"{"start":10,"len":4}"#);

        let err = from_slice::<Span>(br#"{"start":10}"#).unwrap_err();
        assert_eq!(err.kind(), JsonErrorKind::MissingMember);
    }

    // ── recursive types ──────────────────────────────────────────────

    #[derive(Debug, PartialEq, Default)]
    struct Node {
        name: String,
        friend: Option<Box<Node>>,
    }

    impl JsonShape for Node {
        fn shape<S: Sym>() -> Shape<Self, S> {
            Shape::Object(
                ObjectShape::new(Node::default)
                    .field("name", |n: &Node| &n.name, |n: &mut Node, v| n.name = v)
                    .field(
                        "friend",
                        |n: &Node| &n.friend,
                        |n: &mut Node, v| n.friend = v,
                    ),
            )
        }
    }

    fn chain(depth: usize) -> Node {
        let mut node = Node {
            name: format!("n{depth}"),
            friend: None,
        };
        for i in (0..depth).rev() {
            node = Node {
                name: format!("n{i}"),
                friend: Some(Box::new(node)),
            };
        }
        node
    }

    #[test]
    fn nested_friends_ten_deep_roundtrip() {
        let root = chain(10);
        let bytes = to_vec(&root).unwrap();
        let parsed: Node = from_slice(&bytes).unwrap();
        assert_eq!(parsed, root);

        let mut depth = 0;
        let mut cursor = &parsed;
        while let Some(next) = &cursor.friend {
            cursor = next;
            depth += 1;
        }
        assert_eq!(depth, 10);
    }

    // ── untyped values ───────────────────────────────────────────────

    #[test]
    fn untyped_value_roundtrips() {
        let input = br#"{"a":1.5,"b":[true,null],"c":"x"}"#;
        let v: JsonValue = from_slice(input).unwrap();
        assert_eq!(v.get("a").and_then(JsonValue::as_f64), Some(1.5));
        assert_eq!(to_vec(&v).unwrap(), input);
    }

    #[test]
    fn untyped_number_modes() {
        let decimal = JsonResolver::new(ResolverConfig {
            numbers: NumberMode::Decimal,
            ..ResolverConfig::default()
        });
        let v: JsonValue = decimal.from_slice(b"1.50").unwrap();
        assert_eq!(
            v,
            JsonValue::Number(JsonNumber::Decimal(Decimal::from_parts(15, 1).unwrap()))
        );

        let literal = JsonResolver::new(ResolverConfig {
            numbers: NumberMode::Literal,
            ..ResolverConfig::default()
        });
        let v: JsonValue = literal.from_slice(b"1.50").unwrap();
        assert_eq!(v, JsonValue::Number(JsonNumber::Literal("1.50".into())));
    }

    // ── errors ───────────────────────────────────────────────────────

    #[test]
    fn reader_errors_carry_line_and_column() {
        let err = from_slice::<Doc>(b"{\n  \"a\": tru\n}").unwrap_err();
        assert_eq!(err.kind(), JsonErrorKind::InvalidNumber);
        assert_eq!(err.line(), Some(2));
    }

    #[test]
    fn abrupt_end_of_document() {
        let err = from_slice::<Doc>(br#"{"a":1,"#).unwrap_err();
        assert_eq!(err.kind(), JsonErrorKind::Eof);
    }
}
