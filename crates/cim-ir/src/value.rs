//! Value tree for decoded documents
//!
//! Every element closes into one [`Value`]. An element without children or
//! attributes becomes [`Value::Text`]; anything carrying attributes or child
//! elements becomes a [`Value::Map`], with attributes stored under
//! `@prefix:name` keys and text (when attributes are present) under `_`.
//!
//! When a second sibling with the same tag arrives the existing entry is
//! promoted in place to a list. Lists are kept homogeneous: once a
//! structured sibling joins, scalar siblings are lifted to `{"_": text}` maps.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

/// Prefix of keys holding attributes of the element's start tag
pub const ATTRIBUTE_PREFIX: char = '@';

/// Key holding element text when the element also carries attributes
pub const TEXT_KEY: &str = "_";

/// Ordered mapping from logical tag (or `@attribute`) to value
pub type Map = BTreeMap<String, Value>;

/// A decoded value node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// Text content of an element without attributes
    Text(String),

    /// Attributes and/or nested elements
    Map(Map),

    /// Repeated scalar siblings
    TextList(Vec<String>),

    /// Repeated structured siblings
    MapList(Vec<Map>),
}

/// Borrowed view of one item in a value, regardless of list shape
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Item<'a> {
    Text(&'a str),
    Map(&'a Map),
}

impl Default for Value {
    fn default() -> Self {
        Value::Map(Map::new())
    }
}

fn lift(text: String) -> Map {
    let mut map = Map::new();
    map.insert(TEXT_KEY.to_string(), Value::Text(text));
    map
}

impl Value {
    /// Combine an existing value with a newly closed sibling of the same tag.
    ///
    /// The result always holds `self.len() + incoming.len()` items in document order.
    #[must_use]
    pub fn promote(self, incoming: Value) -> Value {
        match (self, incoming) {
            (Value::Text(a), Value::Text(b)) => Value::TextList(vec![a, b]),
            (Value::Text(a), Value::Map(b)) => Value::MapList(vec![lift(a), b]),
            (Value::Map(a), Value::Text(b)) => Value::MapList(vec![a, lift(b)]),
            (Value::Map(a), Value::Map(b)) => Value::MapList(vec![a, b]),
            (Value::TextList(mut list), Value::Text(b)) => {
                list.push(b);
                Value::TextList(list)
            }
            (Value::TextList(list), Value::Map(b)) => {
                let mut maps: Vec<Map> = list.into_iter().map(lift).collect();
                maps.push(b);
                Value::MapList(maps)
            }
            (Value::MapList(mut maps), Value::Text(b)) => {
                maps.push(lift(b));
                Value::MapList(maps)
            }
            (Value::MapList(mut maps), Value::Map(b)) => {
                maps.push(b);
                Value::MapList(maps)
            }
            (existing, incoming @ (Value::TextList(_) | Value::MapList(_))) => incoming
                .into_singles()
                .into_iter()
                .fold(existing, Value::promote),
        }
    }

    /// Split a value into one single value per item.
    fn into_singles(self) -> Vec<Value> {
        match self {
            Value::Text(_) | Value::Map(_) => vec![self],
            Value::TextList(list) => list.into_iter().map(Value::Text).collect(),
            Value::MapList(maps) => maps.into_iter().map(Value::Map).collect(),
        }
    }

    /// Number of sibling occurrences this value represents
    pub fn len(&self) -> usize {
        match self {
            Value::Text(_) | Value::Map(_) => 1,
            Value::TextList(list) => list.len(),
            Value::MapList(maps) => maps.len(),
        }
    }

    /// True for a list holding no items
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// True if the value was promoted to a list
    pub fn is_list(&self) -> bool {
        matches!(self, Value::TextList(_) | Value::MapList(_))
    }

    /// Iterate items in document order
    pub fn items(&self) -> Vec<Item<'_>> {
        match self {
            Value::Text(text) => vec![Item::Text(text)],
            Value::Map(map) => vec![Item::Map(map)],
            Value::TextList(list) => list.iter().map(|t| Item::Text(t)).collect(),
            Value::MapList(maps) => maps.iter().map(Item::Map).collect(),
        }
    }

    /// All structured items, skipping scalars
    pub fn maps(&self) -> Vec<&Map> {
        self.items()
            .into_iter()
            .filter_map(|item| match item {
                Item::Map(map) => Some(map),
                Item::Text(_) => None,
            })
            .collect()
    }

    /// Borrow the map of a singular structured value
    pub fn as_map(&self) -> Option<&Map> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Text of a singular value: the scalar itself or the `_` entry of a map
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(text) => Some(text),
            Value::Map(map) => map.get(TEXT_KEY).and_then(Value::as_text),
            _ => None,
        }
    }

    /// Look up a child of a singular structured value
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_map().and_then(|map| map.get(key))
    }

    /// Look up a start-tag attribute (`name` without the `@` prefix)
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.as_map().and_then(|map| attribute(map, name))
    }
}

impl<'a> Item<'a> {
    /// Text of the item: the scalar itself or the `_` entry of a map
    pub fn text(&self) -> Option<&'a str> {
        match *self {
            Item::Text(text) => Some(text),
            Item::Map(map) => map.get(TEXT_KEY).and_then(Value::as_text),
        }
    }
}

/// Look up an attribute in a decoded map (`name` without the `@` prefix)
pub fn attribute<'a>(map: &'a Map, name: &str) -> Option<&'a str> {
    map.get(&format!("{ATTRIBUTE_PREFIX}{name}"))
        .and_then(Value::as_text)
}

/// Insert a child under `key`, promoting an existing entry to a list.
pub fn insert_child(map: &mut Map, key: String, value: Value) {
    match map.entry(key) {
        Entry::Vacant(slot) => {
            slot.insert(value);
        }
        Entry::Occupied(mut slot) => {
            let existing = std::mem::take(slot.get_mut());
            *slot.get_mut() = existing.promote(value);
        }
    }
}
