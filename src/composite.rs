//! Assembles the serializer/deserializer closure pair for a composite
//! type from its member descriptors.
//!
//! Serialization walks members in declaration order, emitting each
//! precomputed `"name":` plan verbatim. Deserialization routes incoming
//! names through the chunk-compare dispatch table; unmatched names feed
//! the extension-data member when one exists, and are skipped otherwise.

use std::sync::{Arc, OnceLock};

use crate::dispatch::NameTable;
use crate::error::{JsonError, JsonErrorKind};
use crate::escape::write_quoted;
use crate::reader::JsonReader;
use crate::resolver::{JsonResolver, Vtable, generation_error};
use crate::shape::{JsonShape, Materialize, Member, ObjectShape, Partial, ReadFn, SlotArray, WriteFn};
use crate::symbol::Sym;
use crate::value;
use crate::writer::JsonWriter;

/// Dump assembled formatters to stderr when `JOT_FORMATTER_DEBUG` is set.
/// Read once, then cached.
fn formatter_debug() -> bool {
    static ON: OnceLock<bool> = OnceLock::new();
    *ON.get_or_init(|| std::env::var_os("JOT_FORMATTER_DEBUG").is_some())
}

struct PreparedMember<T, S: Sym> {
    /// `"name":` in this lane, escaped once at generation time.
    plan: Box<[S]>,
    /// The JSON name after the naming convention, unescaped.
    json_name: Box<str>,
    member: Member<T, S>,
}

pub(crate) fn assemble<T: JsonShape, S: Sym>(
    object: ObjectShape<T, S>,
    resolver: &JsonResolver,
) -> Result<Vtable<T, S>, JsonError> {
    let ObjectShape {
        members,
        extension,
        materialize,
    } = object;

    if let Materialize::Ctor { arity, .. } = &materialize {
        // Constructor materialization has no value to assign into until
        // the end, so every writable member needs a slot and extension
        // data has nowhere to go.
        let slots_ok = members
            .iter()
            .all(|m| !m.writable || matches!(m.slot, Some(s) if s < *arity));
        if !slots_ok || extension.is_some() {
            return Err(generation_error(JsonErrorKind::Unsupported));
        }
    }

    let mut prepared: Vec<PreparedMember<T, S>> = Vec::with_capacity(members.len());
    for member in members {
        let json_name = resolver.naming().apply(member.name);
        if prepared.iter().any(|p| *p.json_name == *json_name) {
            return Err(generation_error(JsonErrorKind::DuplicateMemberName));
        }
        let mut w = JsonWriter::<S>::new(resolver.max_depth());
        write_quoted(&mut w, &json_name, resolver.escape_mode());
        w.name_separator();
        prepared.push(PreparedMember {
            plan: w.finish().into_boxed_slice(),
            json_name: json_name.into(),
            member,
        });
    }

    let table = NameTable::build(prepared.iter().enumerate().filter_map(|(i, p)| {
        p.member.writable.then_some((p.json_name.as_bytes(), i))
    }));

    if formatter_debug() {
        let names: Vec<&str> = prepared.iter().map(|p| &*p.json_name).collect();
        eprintln!(
            "jot: assembled formatter for {} ({} members: {:?})",
            core::any::type_name::<T>(),
            prepared.len(),
            names
        );
    }

    let prepared = Arc::new(prepared);
    let extension = extension.map(Arc::new);

    let ser_members = Arc::clone(&prepared);
    let ser_extension = extension.clone();
    let write: WriteFn<T, S> = Arc::new(move |w, value, resolver: &JsonResolver| {
        w.begin_object()?;
        let mut wrote = false;
        for p in ser_members.iter() {
            let member = &p.member;
            if !member.readable {
                continue;
            }
            let Some(write_value) = &member.write_value else {
                continue;
            };
            let exclude = member.exclude_null.unwrap_or(resolver.exclude_nulls());
            if exclude && member.is_null.as_ref().is_some_and(|is_null| is_null(value)) {
                continue;
            }
            if let Some(pred) = member.serialize_if {
                if !pred(value) {
                    continue;
                }
            }
            if wrote {
                w.value_separator();
            }
            wrote = true;
            w.raw(&p.plan);
            write_value(w, value, resolver)?;
        }
        if let Some(ext) = &ser_extension {
            for (key, item) in (ext.get)(value) {
                let json_key = resolver.naming().apply(key);
                if ser_members.iter().any(|p| *p.json_name == *json_key) {
                    continue;
                }
                if wrote {
                    w.value_separator();
                }
                wrote = true;
                write_quoted(w, &json_key, resolver.escape_mode());
                w.name_separator();
                value::write_value(w, item, resolver)?;
            }
        }
        w.end_object();
        Ok(())
    });

    let de_members = prepared;
    let de_extension = extension;
    let read: ReadFn<T, S> = Arc::new(move |rd: &mut JsonReader<'_, S>, resolver| {
        rd.expect_object_start()?;
        let mut partial = match &materialize {
            Materialize::Fields(default_fn) => Partial::Value(default_fn()),
            Materialize::Ctor { arity, .. } => Partial::Slots(SlotArray::new(*arity)),
        };
        if !rd.end_if_empty(true)? {
            let mut scratch: Vec<u8> = Vec::new();
            loop {
                let name = rd.read_property_name_units()?;
                let slot = {
                    let bytes =
                        S::name_bytes(&name, &mut scratch).map_err(|kind| rd.err(kind))?;
                    table.find(bytes)
                };
                rd.expect_colon()?;
                match slot {
                    Some(i) => {
                        let member = &de_members[i].member;
                        let read_value = member
                            .read_value
                            .as_ref()
                            .expect("dispatch table routed to a member without a read accessor");
                        read_value(rd, resolver, &mut partial)?;
                    }
                    None => match (&de_extension, &mut partial) {
                        (Some(ext), Partial::Value(target)) => {
                            let key = S::decode_owned(&name).map_err(|kind| rd.err(kind))?;
                            let item = value::read_value(rd, resolver)?;
                            (ext.get_mut)(target).insert(key, item);
                        }
                        _ => rd.skip_value()?,
                    },
                }
                if rd.comma_or_end_object()? {
                    break;
                }
            }
        }
        match partial {
            Partial::Value(value) => Ok(value),
            Partial::Slots(mut slots) => match &materialize {
                Materialize::Ctor { build, .. } => {
                    build(&mut slots).map_err(|e| rd.err(e.kind()))
                }
                Materialize::Fields(_) => Err(rd.err(JsonErrorKind::Unsupported)),
            },
        }
    });

    Ok(Vtable { write, read })
}
