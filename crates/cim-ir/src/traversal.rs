//! Cursor API for navigating decoded value trees

use crate::value::{Item, Map, Value};
use crate::{Error, Result};

/// What a cursor currently points at
#[derive(Debug, Clone, Copy)]
enum Focus<'a> {
    /// A whole entry, possibly a list
    Value(&'a Value),

    /// One item selected out of an entry
    Item(Item<'a>),
}

/// A cursor for navigating a decoded value tree
#[derive(Debug, Clone)]
pub struct Cursor<'a> {
    /// Current node
    focus: Focus<'a>,

    /// Path to current node (for error reporting)
    path: Vec<String>,
}

impl<'a> Cursor<'a> {
    /// Create a new cursor at the given value
    pub fn new(value: &'a Value) -> Self {
        Self {
            focus: Focus::Value(value),
            path: Vec::new(),
        }
    }

    /// Get the current path
    pub fn path(&self) -> &[String] {
        &self.path
    }

    /// The whole entry under the cursor, if it was not narrowed to a list item
    pub fn value(&self) -> Option<&'a Value> {
        match self.focus {
            Focus::Value(value) => Some(value),
            Focus::Item(_) => None,
        }
    }

    /// The map under the cursor, if it is a singular structured node
    pub fn map(&self) -> Option<&'a Map> {
        match self.focus {
            Focus::Value(value) => value.as_map(),
            Focus::Item(Item::Map(map)) => Some(map),
            Focus::Item(Item::Text(_)) => None,
        }
    }

    /// The text under the cursor (scalar or `_` entry)
    pub fn text(&self) -> Option<&'a str> {
        match self.focus {
            Focus::Value(value) => value.as_text(),
            Focus::Item(item) => item.text(),
        }
    }

    /// Items under the cursor in document order
    pub fn items(&self) -> Vec<Item<'a>> {
        match self.focus {
            Focus::Value(value) => value.items(),
            Focus::Item(item) => vec![item],
        }
    }

    fn display(&self, segment: &str) -> String {
        if self.path.is_empty() {
            segment.to_string()
        } else {
            format!("{}/{}", self.path.join("/"), segment)
        }
    }

    fn descend(&self, focus: Focus<'a>, segment: String) -> Cursor<'a> {
        let mut path = self.path.clone();
        path.push(segment);
        Cursor { focus, path }
    }

    /// Navigate to a child entry by key
    pub fn child(&self, key: &str) -> Result<Cursor<'a>> {
        match self.map().and_then(|map| map.get(key)) {
            Some(child) => Ok(self.descend(Focus::Value(child), key.to_string())),
            None => Err(Error::node_not_found(self.display(key))),
        }
    }

    /// Navigate to the item at `index`. A singular value is a one-item list.
    pub fn item(&self, index: usize) -> Result<Cursor<'a>> {
        let segment = format!("[{index}]");
        match self.items().get(index) {
            Some(item) => Ok(self.descend(Focus::Item(*item), segment)),
            None => Err(Error::node_not_found(self.display(&segment))),
        }
    }

    /// Navigate using a path (e.g., `rdf:RDF/rdf:Description[3]/rdfs:label`)
    pub fn navigate(&self, path: &str) -> Result<Cursor<'a>> {
        let mut cursor = self.clone();

        for segment in path.split('/') {
            if segment.is_empty() {
                continue;
            }

            // Handle list indexing like "rdf:Description[0]"
            if let Some(open_bracket) = segment.find('[') {
                let key = &segment[..open_bracket];
                let close_bracket = segment[open_bracket..]
                    .find(']')
                    .map(|offset| open_bracket + offset)
                    .ok_or_else(|| {
                        Error::invalid_path(path, format!("unclosed bracket in '{segment}'"))
                    })?;
                if close_bracket + 1 != segment.len() || key.contains(']') {
                    return Err(Error::invalid_path(
                        path,
                        format!("unexpected text around index in '{segment}'"),
                    ));
                }
                let index: usize = segment[open_bracket + 1..close_bracket].parse().map_err(|_| {
                    Error::invalid_path(path, format!("invalid index in '{segment}'"))
                })?;

                if !key.is_empty() {
                    cursor = cursor.child(key)?;
                }
                cursor = cursor.item(index)?;
            } else {
                cursor = cursor.child(segment)?;
            }
        }

        Ok(cursor)
    }
}
