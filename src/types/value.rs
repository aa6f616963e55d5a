use std::borrow::Cow;
use std::fmt;

use memchr::memchr;
use num_bigint::BigInt;
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};

use crate::arena::{Arena, NodeKind, Pair, ValueId};
use crate::num::number::{LiteralKind, Number};
use crate::text::string::unescape_into;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Type {
    Null,
    True,
    False,
    Number,
    String,
    Object,
    Array,
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Type::Null => "null",
            Type::True => "true",
            Type::False => "false",
            Type::Number => "number",
            Type::String => "string",
            Type::Object => "object",
            Type::Array => "array",
        };
        f.write_str(name)
    }
}

/// Borrowed view of one node of a tree stored in an [`Arena`].
///
/// The borrow ties the view to the arena, so it cannot outlive a reset. A
/// [`ValueId`] kept across a reset, or taken from another arena, reads as
/// `Null`.
#[derive(Clone, Copy)]
pub struct Value<'a> {
    arena: &'a Arena,
    id: ValueId,
}

/// Tagged form of a [`Value`] for exhaustive matching.
#[derive(Debug, Clone)]
pub enum ValueRef<'a> {
    Null,
    Bool(bool),
    Number(Number<'a>),
    String(Cow<'a, str>),
    Object(Object<'a>),
    Array(Array<'a>),
}

impl<'a> Value<'a> {
    pub(crate) fn new(arena: &'a Arena, id: ValueId) -> Self {
        Self { arena, id }
    }

    pub fn id(&self) -> ValueId {
        self.id
    }

    pub fn value_type(&self) -> Type {
        match self.id {
            ValueId::TRUE => return Type::True,
            ValueId::FALSE => return Type::False,
            _ => {}
        }
        match self.arena.node(self.id).map(|node| node.kind) {
            None => Type::Null,
            Some(NodeKind::Number) => Type::Number,
            Some(NodeKind::String | NodeKind::EscapedString) => Type::String,
            Some(NodeKind::Object) => Type::Object,
            Some(NodeKind::Array) => Type::Array,
        }
    }

    pub fn view(&self) -> ValueRef<'a> {
        match self.value_type() {
            Type::Null => ValueRef::Null,
            Type::True => ValueRef::Bool(true),
            Type::False => ValueRef::Bool(false),
            Type::Number => self.number().map_or(ValueRef::Null, ValueRef::Number),
            Type::String => self.as_str().map_or(ValueRef::Null, ValueRef::String),
            Type::Object => self.object().map_or(ValueRef::Null, ValueRef::Object),
            Type::Array => self.array().map_or(ValueRef::Null, ValueRef::Array),
        }
    }

    pub fn is_null(&self) -> bool {
        self.value_type() == Type::Null
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self.value_type() {
            Type::True => Some(true),
            Type::False => Some(false),
            _ => None,
        }
    }

    /// String content with escapes resolved. Borrowed unless the value was
    /// built by [`Arena::new_string`] from text that needed escaping.
    pub fn as_str(&self) -> Option<Cow<'a, str>> {
        let node = self.arena.node(self.id)?;
        let text = self.arena.text(node.text);
        match node.kind {
            NodeKind::String => Some(Cow::Borrowed(text)),
            NodeKind::EscapedString => {
                if memchr(b'\\', text.as_bytes()).is_none() {
                    return Some(Cow::Borrowed(text));
                }
                let mut out = String::with_capacity(text.len());
                match unescape_into(&mut out, text) {
                    Ok(()) => Some(Cow::Owned(out)),
                    Err(_) => Some(Cow::Borrowed(text)),
                }
            }
            _ => None,
        }
    }

    pub fn number(&self) -> Option<Number<'a>> {
        let node = self.arena.node(self.id)?;
        if node.kind != NodeKind::Number {
            return None;
        }
        Some(Number::new(self.arena.text(node.text)))
    }

    pub fn as_i64(&self) -> Option<i64> {
        self.number()?.as_i64()
    }

    pub fn as_u64(&self) -> Option<u64> {
        self.number()?.as_u64()
    }

    pub fn as_f64(&self) -> Option<f64> {
        self.number()?.as_f64()
    }

    pub fn as_bigint(&self) -> Option<BigInt> {
        self.number()?.as_bigint()
    }

    pub fn to_hex(&self) -> Option<String> {
        self.number()?.to_hex()
    }

    pub fn object(&self) -> Option<Object<'a>> {
        let node = self.arena.node(self.id)?;
        if node.kind != NodeKind::Object {
            return None;
        }
        Some(Object {
            arena: self.arena,
            pairs: &node.pairs,
        })
    }

    pub fn array(&self) -> Option<Array<'a>> {
        let node = self.arena.node(self.id)?;
        if node.kind != NodeKind::Array {
            return None;
        }
        Some(Array {
            arena: self.arena,
            items: &node.items,
        })
    }

    /// Walks `path`: object segments match keys, array segments are decimal
    /// indexes. Returns `None` as soon as a segment does not apply.
    pub fn get(&self, path: &[&str]) -> Option<Value<'a>> {
        let mut current = *self;
        for segment in path {
            current = match current.value_type() {
                Type::Object => current.object()?.get(segment)?,
                Type::Array => {
                    let index = parse_index(segment)?;
                    current.array()?.get(index)?
                }
                _ => return None,
            };
        }
        Some(current)
    }

    pub fn exists(&self, path: &[&str]) -> bool {
        self.get(path).is_some()
    }

    pub fn get_string(&self, path: &[&str]) -> Cow<'a, str> {
        self.get(path)
            .and_then(|value| value.as_str())
            .unwrap_or(Cow::Borrowed(""))
    }

    pub fn get_int(&self, path: &[&str]) -> i64 {
        self.get(path)
            .and_then(|value| value.as_i64())
            .unwrap_or(0)
    }

    pub fn get_uint(&self, path: &[&str]) -> u64 {
        self.get(path)
            .and_then(|value| value.as_u64())
            .unwrap_or(0)
    }

    pub fn get_float64(&self, path: &[&str]) -> f64 {
        self.get(path)
            .and_then(|value| value.as_f64())
            .unwrap_or(0.0)
    }

    pub fn get_bool(&self, path: &[&str]) -> bool {
        self.get(path)
            .and_then(|value| value.as_bool())
            .unwrap_or(false)
    }

    pub fn get_bigint(&self, path: &[&str]) -> BigInt {
        self.get(path)
            .and_then(|value| value.as_bigint())
            .unwrap_or_default()
    }

    pub fn get_hex(&self, path: &[&str]) -> String {
        self.get(path)
            .and_then(|value| value.to_hex())
            .unwrap_or_default()
    }
}

fn parse_index(segment: &str) -> Option<usize> {
    if segment.is_empty() || !segment.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    segment.parse().ok()
}

impl fmt::Debug for Value<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.view() {
            ValueRef::Null => f.write_str("Null"),
            ValueRef::Bool(value) => write!(f, "{value:?}"),
            ValueRef::Number(number) => write!(f, "{number:?}"),
            ValueRef::String(text) => write!(f, "{text:?}"),
            ValueRef::Object(object) => object.fmt(f),
            ValueRef::Array(array) => array.fmt(f),
        }
    }
}

#[derive(Clone, Copy)]
pub struct Object<'a> {
    arena: &'a Arena,
    pairs: &'a [Pair],
}

impl<'a> Object<'a> {
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<Value<'a>> {
        self.pairs
            .iter()
            .find(|pair| self.arena.text(pair.key) == key)
            .map(|pair| Value::new(self.arena, pair.value))
    }

    /// Entries in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = (&'a str, Value<'a>)> + 'a {
        let arena = self.arena;
        self.pairs
            .iter()
            .map(move |pair| (arena.text(pair.key), Value::new(arena, pair.value)))
    }

    pub fn keys(&self) -> impl Iterator<Item = &'a str> + 'a {
        let arena = self.arena;
        self.pairs.iter().map(move |pair| arena.text(pair.key))
    }
}

impl fmt::Debug for Object<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

#[derive(Clone, Copy)]
pub struct Array<'a> {
    arena: &'a Arena,
    items: &'a [ValueId],
}

impl<'a> Array<'a> {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<Value<'a>> {
        self.items
            .get(index)
            .map(|&id| Value::new(self.arena, id))
    }

    pub fn iter(&self) -> impl Iterator<Item = Value<'a>> + 'a {
        let arena = self.arena;
        self.items.iter().map(move |&id| Value::new(arena, id))
    }
}

impl fmt::Debug for Array<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl Serialize for Value<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.view() {
            ValueRef::Null => serializer.serialize_unit(),
            ValueRef::Bool(value) => serializer.serialize_bool(value),
            ValueRef::Number(number) => serialize_number(number, serializer),
            ValueRef::String(text) => serializer.serialize_str(&text),
            ValueRef::Object(object) => {
                let mut map = serializer.serialize_map(Some(object.len()))?;
                for (key, value) in object.iter() {
                    map.serialize_entry(key, &value)?;
                }
                map.end()
            }
            ValueRef::Array(array) => {
                let mut seq = serializer.serialize_seq(Some(array.len()))?;
                for value in array.iter() {
                    seq.serialize_element(&value)?;
                }
                seq.end()
            }
        }
    }
}

fn serialize_number<S: Serializer>(number: Number<'_>, serializer: S) -> Result<S::Ok, S::Error> {
    match number.kind() {
        LiteralKind::Float => match number.as_f64() {
            Some(value) => serializer.serialize_f64(value),
            None => serializer.serialize_str(number.as_str()),
        },
        LiteralKind::Decimal => {
            if let Some(value) = number.as_i64() {
                serializer.serialize_i64(value)
            } else if let Some(value) = number.as_u64() {
                serializer.serialize_u64(value)
            } else {
                serializer.serialize_str(number.as_str())
            }
        }
        LiteralKind::Hex => {
            if let Some(value) = number.as_u64() {
                serializer.serialize_u64(value)
            } else if let Some(value) = number.as_i64() {
                serializer.serialize_i64(value)
            } else {
                serializer.serialize_str(number.as_str())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn sample(arena: &mut Arena) -> ValueId {
        let root = arena.new_object();
        let window = arena.new_object();
        let title = arena.new_string("My \"App\"");
        arena.set(window, "title", title);
        let width = arena.new_number_from_int(640);
        arena.set(window, "w", width);
        arena.set(root, "window", window);

        let list = arena.new_array();
        let pi = arena.new_number_from_float(3.5);
        arena.push(list, pi);
        arena.push(list, ValueId::TRUE);
        let mask = arena.new_number_from_string("0x1FC3");
        arena.push(list, mask);
        arena.set(root, "list", list);
        root
    }

    #[rstest]
    #[case(&["window", "title"], true)]
    #[case(&["window", "w"], true)]
    #[case(&["list", "0"], true)]
    #[case(&["list", "2"], true)]
    #[case(&["list", "3"], false)]
    #[case(&["list", "-1"], false)]
    #[case(&["list", "x"], false)]
    #[case(&["window", "missing"], false)]
    #[case(&["window", "w", "deeper"], false)]
    #[case(&[], true)]
    fn test_exists(#[case] path: &[&str], #[case] expected: bool) {
        let mut arena = Arena::new();
        let root = sample(&mut arena);
        assert_eq!(arena.value(root).exists(path), expected);
    }

    #[rstest]
    fn test_typed_getters() {
        let mut arena = Arena::new();
        let root = sample(&mut arena);
        let value = arena.value(root);
        assert_eq!(value.get_string(&["window", "title"]), "My \"App\"");
        assert_eq!(value.get_int(&["window", "w"]), 640);
        assert_eq!(value.get_float64(&["window", "w"]), 640.0);
        assert_eq!(value.get_float64(&["list", "0"]), 3.5);
        assert!(value.get_bool(&["list", "1"]));
        assert_eq!(value.get_int(&["list", "2"]), 8131);
        assert_eq!(value.get_hex(&["list", "2"]), "0x1FC3");
        assert_eq!(value.get_bigint(&["list", "2"]), BigInt::from(8131));
    }

    #[rstest]
    #[case(&["window"])]
    #[case(&["window", "nope"])]
    #[case(&["list", "9"])]
    #[case(&["list", "1"])]
    fn test_zero_values_on_miss_or_mismatch(#[case] path: &[&str]) {
        let mut arena = Arena::new();
        let root = sample(&mut arena);
        let value = arena.value(root);
        assert_eq!(value.get_string(path), "");
        assert_eq!(value.get_int(path), 0);
        assert_eq!(value.get_uint(path), 0);
        assert_eq!(value.get_float64(path), 0.0);
        assert_eq!(value.get_bigint(path), BigInt::default());
        assert_eq!(value.get_hex(path), "");
    }

    #[rstest]
    fn test_string_from_number_is_empty() {
        let mut arena = Arena::new();
        let root = sample(&mut arena);
        assert_eq!(arena.value(root).get_string(&["window", "w"]), "");
        assert!(!arena.value(root).get_bool(&["window", "w"]));
    }

    #[rstest]
    fn test_view_is_exhaustive() {
        let mut arena = Arena::new();
        let root = sample(&mut arena);
        let list = arena.value(root).get(&["list"]).unwrap();
        let kinds: Vec<&str> = list
            .array()
            .unwrap()
            .iter()
            .map(|item| match item.view() {
                ValueRef::Null => "null",
                ValueRef::Bool(_) => "bool",
                ValueRef::Number(_) => "number",
                ValueRef::String(_) => "string",
                ValueRef::Object(_) => "object",
                ValueRef::Array(_) => "array",
            })
            .collect();
        assert_eq!(kinds, vec!["number", "bool", "number"]);
    }

    #[rstest]
    fn test_debug_output() {
        let mut arena = Arena::new();
        let root = arena.new_object();
        let item = arena.new_number_from_int(1);
        arena.set(root, "a", item);
        assert_eq!(format!("{:?}", arena.value(root)), "{\"a\": Number(\"1\")}");
    }
}
