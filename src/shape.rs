use std::any::Any;
use std::sync::{Arc, OnceLock};

use crate::error::{JsonError, JsonErrorKind};
use crate::reader::JsonReader;
use crate::resolver::{Formatter, JsonResolver};
use crate::symbol::Sym;
use crate::value::JsonMap;
use crate::writer::JsonWriter;

pub type WriteFn<T, S> =
    Arc<dyn Fn(&mut JsonWriter<S>, &T, &JsonResolver) -> Result<(), JsonError> + Send + Sync>;
pub type ReadFn<T, S> = Arc<
    dyn for<'de> Fn(&mut JsonReader<'de, S>, &JsonResolver) -> Result<T, JsonError> + Send + Sync,
>;
pub(crate) type MemberReadFn<T, S> = Arc<
    dyn for<'de> Fn(&mut JsonReader<'de, S>, &JsonResolver, &mut Partial<T>) -> Result<(), JsonError>
        + Send
        + Sync,
>;

/// The runtime description of a type, from which the resolver synthesizes
/// a serializer/deserializer pair on first use.
pub trait JsonShape: Sized + Send + Sync + 'static {
    fn shape<S: Sym>() -> Shape<Self, S>;

    /// Whether this value writes as JSON `null`; drives exclude-null
    /// member skipping. Only `Option` and the untyped value override it.
    fn is_null(&self) -> bool {
        false
    }
}

/// What the resolver learns about a type.
pub enum Shape<T, S: Sym> {
    /// A direct codec pair: primitives, collections, the untyped value.
    Codec {
        write: WriteFn<T, S>,
        read: ReadFn<T, S>,
    },
    /// A composite with member descriptors; goes through the generator.
    Object(ObjectShape<T, S>),
}

impl<T, S: Sym> Shape<T, S> {
    /// Build a `Codec` shape from plain closures.
    pub fn codec<W, R>(write: W, read: R) -> Self
    where
        W: Fn(&mut JsonWriter<S>, &T, &JsonResolver) -> Result<(), JsonError>
            + Send
            + Sync
            + 'static,
        R: for<'de> Fn(&mut JsonReader<'de, S>, &JsonResolver) -> Result<T, JsonError>
            + Send
            + Sync
            + 'static,
    {
        Shape::Codec {
            write: Arc::new(write),
            read: Arc::new(read),
        }
    }
}

/// How a deserialized composite comes into existence.
pub(crate) enum Materialize<T> {
    /// Default-construct, then assign members as they arrive.
    Fields(fn() -> T),
    /// Collect members into positional slots, then invoke the constructor.
    Ctor {
        arity: usize,
        build: Arc<dyn Fn(&mut SlotArray) -> Result<T, JsonError> + Send + Sync>,
    },
}

/// Positional argument slots for constructor materialization.
pub struct SlotArray {
    slots: Vec<Option<Box<dyn Any>>>,
}

impl SlotArray {
    pub(crate) fn new(arity: usize) -> Self {
        let mut slots = Vec::with_capacity(arity);
        slots.resize_with(arity, || None);
        SlotArray { slots }
    }

    pub(crate) fn put(&mut self, index: usize, value: Box<dyn Any>) {
        self.slots[index] = Some(value);
    }

    /// Take the slot value; a member missing from the document is an error.
    pub fn take<F: 'static>(&mut self, index: usize) -> Result<F, JsonError> {
        match self.slots[index].take() {
            Some(boxed) => boxed
                .downcast::<F>()
                .map(|b| *b)
                .map_err(|_| JsonError::new(JsonErrorKind::Unsupported, 0)),
            None => Err(JsonError::new(JsonErrorKind::MissingMember, 0)),
        }
    }

    /// Take the slot value, defaulting when the member was absent.
    pub fn take_or_default<F: Default + 'static>(&mut self, index: usize) -> Result<F, JsonError> {
        match self.slots[index].take() {
            Some(boxed) => boxed
                .downcast::<F>()
                .map(|b| *b)
                .map_err(|_| JsonError::new(JsonErrorKind::Unsupported, 0)),
            None => Ok(F::default()),
        }
    }
}

/// The value being assembled by a deserializer closure.
pub(crate) enum Partial<T> {
    Value(T),
    Slots(SlotArray),
}

/// Extension-data slot: a mapping member that absorbs properties no
/// declared member matched, and replays them on write.
pub(crate) struct ExtensionSlot<T> {
    pub(crate) get: fn(&T) -> &JsonMap,
    pub(crate) get_mut: fn(&mut T) -> &mut JsonMap,
}

/// One member of a composite: names, flags, and accessors.
///
/// The value codec is resolved through the formatter cache on first use and
/// memoized per member, so steady-state dispatch is a direct call.
pub struct Member<T, S: Sym> {
    pub(crate) name: &'static str,
    pub(crate) readable: bool,
    pub(crate) writable: bool,
    pub(crate) slot: Option<usize>,
    pub(crate) exclude_null: Option<bool>,
    pub(crate) serialize_if: Option<fn(&T) -> bool>,
    pub(crate) write_value: Option<WriteFn<T, S>>,
    pub(crate) read_value: Option<MemberReadFn<T, S>>,
    pub(crate) is_null: Option<Arc<dyn Fn(&T) -> bool + Send + Sync>>,
}

/// Composite description: ordered members, optional extension-data slot,
/// and the materialization strategy.
pub struct ObjectShape<T, S: Sym> {
    pub(crate) members: Vec<Member<T, S>>,
    pub(crate) extension: Option<ExtensionSlot<T>>,
    pub(crate) materialize: Materialize<T>,
}

impl<T: JsonShape, S: Sym> ObjectShape<T, S> {
    /// Property-based materialization: default-construct, assign members.
    pub fn new(default_fn: fn() -> T) -> Self {
        ObjectShape {
            members: Vec::new(),
            extension: None,
            materialize: Materialize::Fields(default_fn),
        }
    }

    /// Constructor-based materialization: members land in positional slots
    /// and `build` assembles the value. Declare members with `ctor_param`.
    pub fn with_ctor<B>(arity: usize, build: B) -> Self
    where
        B: Fn(&mut SlotArray) -> Result<T, JsonError> + Send + Sync + 'static,
    {
        ObjectShape {
            members: Vec::new(),
            extension: None,
            materialize: Materialize::Ctor {
                arity,
                build: Arc::new(build),
            },
        }
    }

    /// A readable and writable member backed by a getter/setter pair.
    pub fn field<F: JsonShape>(
        mut self,
        name: &'static str,
        get: fn(&T) -> &F,
        set: fn(&mut T, F),
    ) -> Self {
        let write_cell: OnceLock<Formatter<F, S>> = OnceLock::new();
        let write_value: WriteFn<T, S> = Arc::new(move |w, value, resolver: &JsonResolver| {
            let f = write_cell.get_or_init(|| resolver.formatter::<F, S>());
            f.write(w, get(value), resolver)
        });
        let read_cell: OnceLock<Formatter<F, S>> = OnceLock::new();
        let read_value: MemberReadFn<T, S> =
            Arc::new(move |r: &mut JsonReader<'_, S>, resolver, partial| {
                let f = read_cell.get_or_init(|| resolver.formatter::<F, S>());
                let v = f.read(r, resolver)?;
                match partial {
                    Partial::Value(t) => {
                        set(t, v);
                        Ok(())
                    }
                    Partial::Slots(_) => Err(r.err(JsonErrorKind::Unsupported)),
                }
            });
        self.members.push(Member {
            name,
            readable: true,
            writable: true,
            slot: None,
            exclude_null: None,
            serialize_if: None,
            write_value: Some(write_value),
            read_value: Some(read_value),
            is_null: Some(Arc::new(move |t: &T| get(t).is_null())),
        });
        self
    }

    /// A member mapped to a constructor parameter slot.
    pub fn ctor_param<F: JsonShape>(
        mut self,
        name: &'static str,
        slot: usize,
        get: fn(&T) -> &F,
    ) -> Self {
        let write_cell: OnceLock<Formatter<F, S>> = OnceLock::new();
        let write_value: WriteFn<T, S> = Arc::new(move |w, value, resolver: &JsonResolver| {
            let f = write_cell.get_or_init(|| resolver.formatter::<F, S>());
            f.write(w, get(value), resolver)
        });
        let read_cell: OnceLock<Formatter<F, S>> = OnceLock::new();
        let read_value: MemberReadFn<T, S> =
            Arc::new(move |r: &mut JsonReader<'_, S>, resolver, partial| {
                let f = read_cell.get_or_init(|| resolver.formatter::<F, S>());
                let v = f.read(r, resolver)?;
                match partial {
                    Partial::Slots(slots) => {
                        slots.put(slot, Box::new(v));
                        Ok(())
                    }
                    Partial::Value(_) => Err(r.err(JsonErrorKind::Unsupported)),
                }
            });
        self.members.push(Member {
            name,
            readable: true,
            writable: true,
            slot: Some(slot),
            exclude_null: None,
            serialize_if: None,
            write_value: Some(write_value),
            read_value: Some(read_value),
            is_null: Some(Arc::new(move |t: &T| get(t).is_null())),
        });
        self
    }

    /// A serialize-only member; incoming properties with this name are
    /// skipped like any unmatched name.
    pub fn get_only<F: JsonShape>(mut self, name: &'static str, get: fn(&T) -> &F) -> Self {
        let write_cell: OnceLock<Formatter<F, S>> = OnceLock::new();
        let write_value: WriteFn<T, S> = Arc::new(move |w, value, resolver: &JsonResolver| {
            let f = write_cell.get_or_init(|| resolver.formatter::<F, S>());
            f.write(w, get(value), resolver)
        });
        self.members.push(Member {
            name,
            readable: true,
            writable: false,
            slot: None,
            exclude_null: None,
            serialize_if: None,
            write_value: Some(write_value),
            read_value: None,
            is_null: Some(Arc::new(move |t: &T| get(t).is_null())),
        });
        self
    }

    /// Attach a should-serialize predicate to the last declared member.
    pub fn serialize_if(mut self, pred: fn(&T) -> bool) -> Self {
        let member = self
            .members
            .last_mut()
            .expect("serialize_if must follow a member");
        member.serialize_if = Some(pred);
        self
    }

    /// Override the resolver's exclude-null default for the last member.
    pub fn exclude_null(mut self, exclude: bool) -> Self {
        let member = self
            .members
            .last_mut()
            .expect("exclude_null must follow a member");
        member.exclude_null = Some(exclude);
        self
    }

    /// Declare the extension-data member receiving unmatched properties.
    pub fn extension(mut self, get: fn(&T) -> &JsonMap, get_mut: fn(&mut T) -> &mut JsonMap) -> Self {
        self.extension = Some(ExtensionSlot { get, get_mut });
        self
    }
}
