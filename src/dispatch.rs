//! Property-name dispatch without hashing.
//!
//! Member names are partitioned by byte length. Tiny length classes use a
//! linear memcmp scan; larger ones get a decision tree that compares
//! word-aligned 8/4/2/1-byte little-endian chunks against packed
//! constants, short-circuiting on the first differing chunk.

use smallvec::SmallVec;

/// Classes of this size or smaller stay linear; a compare chain beats the
/// tree setup for them.
const LINEAR_LIMIT: usize = 3;

pub(crate) struct NameTable {
    classes: Vec<LengthClass>,
}

struct LengthClass {
    len: usize,
    entries: SmallVec<[Entry; 4]>,
    tree: Option<ChunkNode>,
}

struct Entry {
    name: Box<[u8]>,
    slot: usize,
}

enum ChunkNode {
    Leaf(usize),
    Branch {
        offset: usize,
        width: usize,
        arms: Vec<(u64, ChunkNode)>,
    },
}

/// The next chunk width at `offset` for a name of `len` bytes.
fn chunk_width(len: usize, offset: usize) -> usize {
    let remaining = len - offset;
    if remaining >= 8 {
        8
    } else if remaining >= 4 {
        4
    } else if remaining >= 2 {
        2
    } else {
        1
    }
}

/// Little-endian load of `width` bytes at `offset`.
fn read_chunk(bytes: &[u8], offset: usize, width: usize) -> u64 {
    let mut value = 0u64;
    for (i, &b) in bytes[offset..offset + width].iter().enumerate() {
        value |= (b as u64) << (i * 8);
    }
    value
}

fn build_tree(entries: &[Entry], indexes: Vec<usize>, len: usize, offset: usize) -> ChunkNode {
    if offset == len {
        // Names are unique within a class, so a fully-consumed chain holds
        // exactly one candidate.
        debug_assert_eq!(indexes.len(), 1);
        return ChunkNode::Leaf(entries[indexes[0]].slot);
    }
    let width = chunk_width(len, offset);
    let mut arms: Vec<(u64, Vec<usize>)> = Vec::new();
    for index in indexes {
        let chunk = read_chunk(&entries[index].name, offset, width);
        match arms.iter_mut().find(|(value, _)| *value == chunk) {
            Some((_, group)) => group.push(index),
            None => arms.push((chunk, vec![index])),
        }
    }
    ChunkNode::Branch {
        offset,
        width,
        arms: arms
            .into_iter()
            .map(|(value, group)| (value, build_tree(entries, group, len, offset + width)))
            .collect(),
    }
}

impl NameTable {
    pub(crate) fn build<'a>(names: impl Iterator<Item = (&'a [u8], usize)>) -> NameTable {
        let mut classes: Vec<LengthClass> = Vec::new();
        for (name, slot) in names {
            let entry = Entry {
                name: name.into(),
                slot,
            };
            match classes.iter_mut().find(|c| c.len == name.len()) {
                Some(class) => class.entries.push(entry),
                None => classes.push(LengthClass {
                    len: name.len(),
                    entries: SmallVec::from_iter([entry]),
                    tree: None,
                }),
            }
        }
        for class in &mut classes {
            if class.entries.len() > LINEAR_LIMIT {
                let indexes = (0..class.entries.len()).collect();
                class.tree = Some(build_tree(&class.entries, indexes, class.len, 0));
            }
        }
        NameTable { classes }
    }

    /// Route an incoming property name to its member slot.
    pub(crate) fn find(&self, name: &[u8]) -> Option<usize> {
        let class = self.classes.iter().find(|c| c.len == name.len())?;
        match &class.tree {
            None => class
                .entries
                .iter()
                .find(|e| &*e.name == name)
                .map(|e| e.slot),
            Some(tree) => {
                let mut node = tree;
                loop {
                    match node {
                        ChunkNode::Leaf(slot) => return Some(*slot),
                        ChunkNode::Branch {
                            offset,
                            width,
                            arms,
                        } => {
                            let chunk = read_chunk(name, *offset, *width);
                            node = &arms.iter().find(|(value, _)| *value == chunk)?.1;
                        }
                    }
                }
            }
        }
    }
}
