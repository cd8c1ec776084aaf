use std::any::{Any, TypeId};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};

use dashmap::DashMap;

use crate::error::{JsonError, JsonErrorKind};
use crate::escape::EscapeMode;
use crate::reader::{CommentHandling, JsonReader, ReadOptions};
use crate::shape::{JsonShape, ReadFn, Shape, WriteFn};
use crate::symbol::Sym;
use crate::writer::{DEFAULT_MAX_DEPTH, JsonWriter};

/// How declared member names become JSON names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NamingConvention {
    #[default]
    AsDeclared,
    /// `first_name` → `firstName`
    CamelCase,
    /// `firstName` → `first_name`
    SnakeCase,
    /// `firstName` → `FIRST_NAME`
    AdaCase,
}

/// Split an identifier into words at underscores and case boundaries.
fn words(name: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut current = String::new();
    let mut prev_lower = false;
    let chars: Vec<char> = name.chars().collect();
    for (i, &c) in chars.iter().enumerate() {
        if c == '_' || c == '-' {
            if !current.is_empty() {
                out.push(core::mem::take(&mut current));
            }
            prev_lower = false;
            continue;
        }
        let boundary = c.is_uppercase()
            && (prev_lower || matches!(chars.get(i + 1), Some(n) if n.is_lowercase()));
        if boundary && !current.is_empty() {
            out.push(core::mem::take(&mut current));
        }
        current.push(c);
        prev_lower = c.is_lowercase() || c.is_ascii_digit();
    }
    if !current.is_empty() {
        out.push(current);
    }
    out
}

impl NamingConvention {
    pub fn apply(&self, name: &str) -> String {
        match self {
            NamingConvention::AsDeclared => name.to_owned(),
            NamingConvention::CamelCase => {
                let mut out = String::with_capacity(name.len());
                for (i, word) in words(name).iter().enumerate() {
                    let mut chars = word.chars();
                    match chars.next() {
                        Some(first) if i == 0 => {
                            out.extend(first.to_lowercase());
                            out.extend(chars.flat_map(char::to_lowercase));
                        }
                        Some(first) => {
                            out.extend(first.to_uppercase());
                            out.extend(chars.flat_map(char::to_lowercase));
                        }
                        None => {}
                    }
                }
                out
            }
            NamingConvention::SnakeCase => {
                let list = words(name);
                let mut out = String::with_capacity(name.len() + list.len());
                for (i, word) in list.iter().enumerate() {
                    if i > 0 {
                        out.push('_');
                    }
                    out.extend(word.chars().flat_map(char::to_lowercase));
                }
                out
            }
            NamingConvention::AdaCase => {
                let list = words(name);
                let mut out = String::with_capacity(name.len() + list.len());
                for (i, word) in list.iter().enumerate() {
                    if i > 0 {
                        out.push('_');
                    }
                    out.extend(word.chars().flat_map(char::to_uppercase));
                }
                out
            }
        }
    }
}

/// Representation picked for numbers landing in the untyped value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NumberMode {
    #[default]
    Double,
    Decimal,
    /// Keep the validated literal text.
    Literal,
}

/// Everything a resolver decides: naming, null handling, escaping, reader
/// options, and the untyped number representation.
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    pub naming: NamingConvention,
    pub exclude_nulls: bool,
    pub escape: EscapeMode,
    pub comments: CommentHandling,
    pub allow_trailing_commas: bool,
    pub max_depth: u32,
    pub numbers: NumberMode,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        ResolverConfig {
            naming: NamingConvention::AsDeclared,
            exclude_nulls: false,
            escape: EscapeMode::Default,
            comments: CommentHandling::Disallow,
            allow_trailing_commas: false,
            max_depth: DEFAULT_MAX_DEPTH,
            numbers: NumberMode::Double,
        }
    }
}

struct ResolverInner {
    id: u64,
    config: ResolverConfig,
}

/// Maps types to formatters under one policy. Cheap to clone; identity
/// (not configuration) keys the formatter cache, so two resolvers with
/// equal config still own separate formatter sets.
#[derive(Clone)]
pub struct JsonResolver {
    inner: Arc<ResolverInner>,
}

static NEXT_RESOLVER_ID: AtomicU64 = AtomicU64::new(1);

impl Default for JsonResolver {
    fn default() -> Self {
        JsonResolver::new(ResolverConfig::default())
    }
}

impl JsonResolver {
    pub fn new(config: ResolverConfig) -> Self {
        JsonResolver {
            inner: Arc::new(ResolverInner {
                id: NEXT_RESOLVER_ID.fetch_add(1, Ordering::Relaxed),
                config,
            }),
        }
    }

    /// The shared strict RFC 8259 resolver: declared names, nulls written,
    /// default escaping, no comments, no trailing commas.
    pub fn strict() -> &'static JsonResolver {
        static STRICT: OnceLock<JsonResolver> = OnceLock::new();
        STRICT.get_or_init(JsonResolver::default)
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.inner.config
    }

    pub fn naming(&self) -> NamingConvention {
        self.inner.config.naming
    }

    pub fn exclude_nulls(&self) -> bool {
        self.inner.config.exclude_nulls
    }

    pub fn escape_mode(&self) -> EscapeMode {
        self.inner.config.escape
    }

    pub fn number_mode(&self) -> NumberMode {
        self.inner.config.numbers
    }

    pub fn max_depth(&self) -> u32 {
        self.inner.config.max_depth
    }

    pub(crate) fn read_options(&self) -> ReadOptions {
        ReadOptions {
            comments: self.inner.config.comments,
            allow_trailing_commas: self.inner.config.allow_trailing_commas,
            max_depth: self.inner.config.max_depth,
        }
    }

    /// The formatter for `(T, lane, self)`, from the process-wide cache.
    ///
    /// The cache slot is reserved before the codec is generated; cyclic
    /// type graphs resolve to the same slot through that forwarding handle,
    /// and the closure pair is filled in on first use.
    pub fn formatter<T: JsonShape, S: Sym>(&self) -> Formatter<T, S> {
        let key = (TypeId::of::<T>(), TypeId::of::<S>(), self.inner.id);
        let map = formatter_cache();
        if let Some(entry) = map.get(&key) {
            return Formatter {
                inner: downcast_entry::<T, S>(entry.value().clone()),
            };
        }
        let entry = map
            .entry(key)
            .or_insert_with(|| Arc::new(FormatterInner::<T, S>::new()) as CacheEntry)
            .clone();
        Formatter {
            inner: downcast_entry::<T, S>(entry),
        }
    }

    // ── serialize ────────────────────────────────────────────────────

    fn write_units<T: JsonShape, S: Sym>(&self, value: &T) -> Result<JsonWriter<S>, JsonError> {
        let mut w = JsonWriter::<S>::new(self.max_depth());
        self.formatter::<T, S>().write(&mut w, value, self)?;
        Ok(w)
    }

    /// Serialize to UTF-8 bytes.
    pub fn to_vec<T: JsonShape>(&self, value: &T) -> Result<Vec<u8>, JsonError> {
        Ok(self.write_units::<T, u8>(value)?.finish())
    }

    /// Serialize to an owned string.
    pub fn to_string<T: JsonShape>(&self, value: &T) -> Result<String, JsonError> {
        self.write_units::<T, u8>(value)?.finish_string()
    }

    /// Serialize on the UTF-16 lane.
    pub fn to_utf16<T: JsonShape>(&self, value: &T) -> Result<Vec<u16>, JsonError> {
        Ok(self.write_units::<T, u16>(value)?.finish())
    }

    // ── deserialize ──────────────────────────────────────────────────

    /// Deserialize a whole document; only trailing trivia may follow.
    pub fn from_slice<T: JsonShape>(&self, input: &[u8]) -> Result<T, JsonError> {
        let mut rd = JsonReader::<u8>::new(input, self.read_options());
        let value = self.formatter::<T, u8>().read(&mut rd, self)?;
        rd.expect_end()?;
        Ok(value)
    }

    pub fn from_str<T: JsonShape>(&self, input: &str) -> Result<T, JsonError> {
        self.from_slice(input.as_bytes())
    }

    /// Deserialize from UTF-16 code units.
    pub fn from_utf16<T: JsonShape>(&self, input: &[u16]) -> Result<T, JsonError> {
        let mut rd = JsonReader::<u16>::new(input, self.read_options());
        let value = self.formatter::<T, u16>().read(&mut rd, self)?;
        rd.expect_end()?;
        Ok(value)
    }

    /// Deserialize one document from the front of `input` and report its
    /// length in bytes; trailing bytes are left untouched.
    pub fn from_slice_prefix<T: JsonShape>(&self, input: &[u8]) -> Result<(T, usize), JsonError> {
        let mut rd = JsonReader::<u8>::new(input, self.read_options());
        let value = self.formatter::<T, u8>().read(&mut rd, self)?;
        Ok((value, rd.position()))
    }
}

// ── formatter cache ──────────────────────────────────────────────────

type CacheKey = (TypeId, TypeId, u64);
type CacheEntry = Arc<dyn Any + Send + Sync>;

fn formatter_cache() -> &'static DashMap<CacheKey, CacheEntry> {
    static FORMATTERS: OnceLock<DashMap<CacheKey, CacheEntry>> = OnceLock::new();
    FORMATTERS.get_or_init(DashMap::new)
}

fn downcast_entry<T: JsonShape, S: Sym>(entry: CacheEntry) -> Arc<FormatterInner<T, S>> {
    entry
        .downcast::<FormatterInner<T, S>>()
        .expect("formatter cache entry does not match its key")
}

pub(crate) struct Vtable<T, S: Sym> {
    pub(crate) write: WriteFn<T, S>,
    pub(crate) read: ReadFn<T, S>,
}

pub(crate) struct FormatterInner<T, S: Sym> {
    vtable: OnceLock<Result<Vtable<T, S>, JsonError>>,
}

impl<T, S: Sym> FormatterInner<T, S> {
    fn new() -> Self {
        FormatterInner {
            vtable: OnceLock::new(),
        }
    }
}

/// The serializer/deserializer pair for one `(type, lane, resolver)`.
///
/// The pair is generated from the type's shape on first use; a generation
/// failure poisons the entry and resurfaces on every later request.
/// Entries are immutable once installed, so handles are free to share.
pub struct Formatter<T: JsonShape, S: Sym> {
    pub(crate) inner: Arc<FormatterInner<T, S>>,
}

impl<T: JsonShape, S: Sym> Clone for Formatter<T, S> {
    fn clone(&self) -> Self {
        Formatter {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: JsonShape, S: Sym> Formatter<T, S> {
    fn vtable(&self, resolver: &JsonResolver) -> Result<&Vtable<T, S>, JsonError> {
        match self.inner.vtable.get_or_init(|| generate::<T, S>(resolver)) {
            Ok(vtable) => Ok(vtable),
            Err(e) => Err(e.clone()),
        }
    }

    pub fn write(
        &self,
        w: &mut JsonWriter<S>,
        value: &T,
        resolver: &JsonResolver,
    ) -> Result<(), JsonError> {
        let vtable = self.vtable(resolver)?;
        (vtable.write)(w, value, resolver)
    }

    pub fn read<'de>(
        &self,
        rd: &mut JsonReader<'de, S>,
        resolver: &JsonResolver,
    ) -> Result<T, JsonError> {
        let vtable = self.vtable(resolver)?;
        (vtable.read)(rd, resolver)
    }
}

fn generate<T: JsonShape, S: Sym>(resolver: &JsonResolver) -> Result<Vtable<T, S>, JsonError> {
    match T::shape::<S>() {
        Shape::Codec { write, read } => Ok(Vtable { write, read }),
        Shape::Object(object) => crate::composite::assemble(object, resolver),
    }
}

// Formatter generation can fail without a reader in hand.
pub(crate) fn generation_error(kind: JsonErrorKind) -> JsonError {
    JsonError::new(kind, 0)
}
