//! Value storage shared by the parser, the scanner and host-side builders.
//!
//! An [`Arena`] owns one growable text buffer and a store of value records.
//! Values are addressed by [`ValueId`] handles; every handle issued by an
//! arena is invalidated by [`Arena::reset`], which keeps the buffer and the
//! record store (including each record's child vectors) for reuse.
//!
//! Each arena stamps its handles with a generation drawn from a process-wide
//! counter and takes a new one on reset. A handle from an earlier generation,
//! or from another arena, reads as Null even after its slot is reused.

use std::sync::atomic::{AtomicU32, Ordering};

use crate::num::number::{write_f64_into, write_i64_into};
use crate::text::string::escape_string_into;
use crate::types::value::Value;

/// Handle to a value stored in an [`Arena`].
///
/// `Null`, `True` and `False` are shared constants that never occupy a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ValueId {
    index: u32,
    generation: u32,
}

const RESERVED: u32 = 3;

/// Generation 0 belongs to the shared constants.
static NEXT_GENERATION: AtomicU32 = AtomicU32::new(1);

fn next_generation() -> u32 {
    loop {
        let generation = NEXT_GENERATION.fetch_add(1, Ordering::Relaxed);
        if generation != 0 {
            return generation;
        }
    }
}

impl ValueId {
    pub const NULL: ValueId = ValueId::constant(0);
    pub const TRUE: ValueId = ValueId::constant(1);
    pub const FALSE: ValueId = ValueId::constant(2);

    const fn constant(index: u32) -> Self {
        ValueId {
            index,
            generation: 0,
        }
    }

    /// Record position, when the handle was issued by generation `generation`.
    fn record(self, generation: u32) -> Option<usize> {
        if self.generation != generation {
            return None;
        }
        self.index.checked_sub(RESERVED).map(|index| index as usize)
    }

    fn from_record(index: usize, generation: u32) -> Self {
        let id = u32::try_from(index)
            .ok()
            .and_then(|index| index.checked_add(RESERVED));
        match id {
            Some(index) => ValueId { index, generation },
            None => panic!("arena exhausted: more than {} values", u32::MAX - RESERVED),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) struct Span {
    pub start: usize,
    pub end: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum NodeKind {
    Number,
    /// Span holds the unescaped content.
    String,
    /// Span holds escaped content, as written by [`Arena::new_string`].
    EscapedString,
    Object,
    Array,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Pair {
    pub key: Span,
    pub value: ValueId,
}

#[derive(Debug)]
pub(crate) struct Node {
    pub kind: NodeKind,
    pub text: Span,
    pub pairs: Vec<Pair>,
    pub items: Vec<ValueId>,
}

/// # Panics
///
/// The value constructors panic once a single generation holds more than
/// `u32::MAX - 3` records.
#[derive(Debug)]
pub struct Arena {
    pub(crate) buf: String,
    pub(crate) nodes: Vec<Node>,
    live: usize,
    generation: u32,
}

impl Default for Arena {
    fn default() -> Self {
        Self {
            buf: String::new(),
            nodes: Vec::new(),
            live: 0,
            generation: next_generation(),
        }
    }
}

impl Arena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Invalidates every value issued so far. Capacity is retained.
    pub fn reset(&mut self) {
        self.buf.clear();
        self.live = 0;
        self.generation = next_generation();
    }

    /// Bytes of text currently held by the arena.
    pub fn buffer_len(&self) -> usize {
        self.buf.len()
    }

    /// Number of value records issued since the last reset.
    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    pub fn value(&self, id: ValueId) -> Value<'_> {
        Value::new(self, id)
    }

    fn alloc(&mut self, kind: NodeKind, text: Span) -> ValueId {
        let index = self.live;
        if let Some(node) = self.nodes.get_mut(index) {
            node.kind = kind;
            node.text = text;
            node.pairs.clear();
            node.items.clear();
        } else {
            self.nodes.push(Node {
                kind,
                text,
                pairs: Vec::new(),
                items: Vec::new(),
            });
        }
        self.live += 1;
        ValueId::from_record(index, self.generation)
    }

    pub(crate) fn node(&self, id: ValueId) -> Option<&Node> {
        let index = id.record(self.generation)?;
        if index >= self.live {
            return None;
        }
        self.nodes.get(index)
    }

    fn node_mut(&mut self, id: ValueId) -> Option<&mut Node> {
        let index = id.record(self.generation)?;
        if index >= self.live {
            return None;
        }
        self.nodes.get_mut(index)
    }

    pub(crate) fn text(&self, span: Span) -> &str {
        self.buf.get(span.start..span.end).unwrap_or("")
    }

    pub(crate) fn push_text(&mut self, text: &str) -> Span {
        let start = self.buf.len();
        self.buf.push_str(text);
        Span {
            start,
            end: self.buf.len(),
        }
    }

    /// Panics when the arena is exhausted.
    pub fn new_object(&mut self) -> ValueId {
        self.alloc(NodeKind::Object, Span::default())
    }

    /// Panics when the arena is exhausted.
    pub fn new_array(&mut self) -> ValueId {
        self.alloc(NodeKind::Array, Span::default())
    }

    /// Stores `value` escaped, between quotes, in the text buffer. The value's
    /// view excludes the quotes. Panics when the arena is exhausted.
    pub fn new_string(&mut self, value: &str) -> ValueId {
        let start = self.buf.len();
        escape_string_into(&mut self.buf, value);
        let span = Span {
            start: start + 1,
            end: self.buf.len() - 1,
        };
        self.alloc(NodeKind::EscapedString, span)
    }

    /// Like [`Arena::new_string`]; invalid UTF-8 sequences become U+FFFD.
    pub fn new_string_bytes(&mut self, value: &[u8]) -> ValueId {
        let text = String::from_utf8_lossy(value);
        self.new_string(&text)
    }

    /// Panics when the arena is exhausted.
    pub fn new_number_from_float(&mut self, value: f64) -> ValueId {
        let start = self.buf.len();
        write_f64_into(&mut self.buf, value);
        let span = Span {
            start,
            end: self.buf.len(),
        };
        self.alloc(NodeKind::Number, span)
    }

    /// Panics when the arena is exhausted.
    pub fn new_number_from_int(&mut self, value: i64) -> ValueId {
        let start = self.buf.len();
        write_i64_into(&mut self.buf, value);
        let span = Span {
            start,
            end: self.buf.len(),
        };
        self.alloc(NodeKind::Number, span)
    }

    /// Stores `text` verbatim as a numeric literal. It is not validated.
    /// Panics when the arena is exhausted.
    pub fn new_number_from_string(&mut self, text: &str) -> ValueId {
        let span = self.push_text(text);
        self.alloc(NodeKind::Number, span)
    }

    pub fn new_null(&self) -> ValueId {
        ValueId::NULL
    }

    pub fn new_true(&self) -> ValueId {
        ValueId::TRUE
    }

    pub fn new_false(&self) -> ValueId {
        ValueId::FALSE
    }

    pub(crate) fn new_parsed_string(&mut self, span: Span) -> ValueId {
        self.alloc(NodeKind::String, span)
    }

    pub(crate) fn new_parsed_number(&mut self, span: Span) -> ValueId {
        self.alloc(NodeKind::Number, span)
    }

    /// Sets `key` in `object`, overwriting an existing entry in place.
    /// Returns false when `object` is not an object of this arena.
    pub fn set(&mut self, object: ValueId, key: &str, value: ValueId) -> bool {
        let Some(index) = self.pair_index(object, key) else {
            return false;
        };
        if let Some(index) = index {
            if let Some(node) = self.node_mut(object) {
                node.pairs[index].value = value;
            }
            return true;
        }
        let key = self.push_text(key);
        self.push_pair(object, key, value)
    }

    /// `None` when `object` is not an object; otherwise the position of `key`.
    pub(crate) fn pair_index(&self, object: ValueId, key: &str) -> Option<Option<usize>> {
        let node = self.node(object)?;
        if node.kind != NodeKind::Object {
            return None;
        }
        Some(
            node.pairs
                .iter()
                .position(|pair| self.text(pair.key) == key),
        )
    }

    pub(crate) fn pair_value(&self, object: ValueId, index: usize) -> Option<ValueId> {
        self.node(object)?.pairs.get(index).map(|pair| pair.value)
    }

    pub(crate) fn replace_pair_value(&mut self, object: ValueId, index: usize, value: ValueId) {
        if let Some(pair) = self
            .node_mut(object)
            .and_then(|node| node.pairs.get_mut(index))
        {
            pair.value = value;
        }
    }

    pub(crate) fn push_pair(&mut self, object: ValueId, key: Span, value: ValueId) -> bool {
        match self.node_mut(object) {
            Some(node) if node.kind == NodeKind::Object => {
                node.pairs.push(Pair { key, value });
                true
            }
            _ => false,
        }
    }

    /// Copies the pairs of `source` whose keys `target` does not hold yet.
    pub(crate) fn merge_absent(&mut self, target: ValueId, source: ValueId) {
        let len = self.node(source).map_or(0, |node| node.pairs.len());
        for index in 0..len {
            let Some(pair) = self
                .node(source)
                .and_then(|node| node.pairs.get(index).copied())
            else {
                break;
            };
            if self.pair_index(target, self.text(pair.key)) == Some(None) {
                self.push_pair(target, pair.key, pair.value);
            }
        }
    }

    /// Appends `value` to `array`. Returns false when `array` is not an array.
    pub fn push(&mut self, array: ValueId, value: ValueId) -> bool {
        match self.node_mut(array) {
            Some(node) if node.kind == NodeKind::Array => {
                node.items.push(value);
                true
            }
            _ => false,
        }
    }

    /// Replaces the item at `index`, padding with nulls when `index` is past
    /// the end.
    pub fn set_item(&mut self, array: ValueId, index: usize, value: ValueId) -> bool {
        match self.node_mut(array) {
            Some(node) if node.kind == NodeKind::Array => {
                if index >= node.items.len() {
                    node.items.resize(index + 1, ValueId::NULL);
                }
                node.items[index] = value;
                true
            }
            _ => false,
        }
    }
}
