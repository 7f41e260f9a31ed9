//! Path-tracking navigation over an embedded JSON state blob.
//!
//! A value of the wrong type reports [`CrawlError::ShapeChanged`]; an absent or
//! null value reports [`CrawlError::MissingField`]. The two point at different
//! problems: the site changed its schema, or this one page lacks a value.

use serde_json::Value;

use crate::error::{CrawlError, Result};
use crate::markup::{Document, text_of};

/// Reads and parses the JSON carried by `<script id="{script_id}">`.
pub fn read_script_json(doc: &Document, script_id: &str) -> Result<Value> {
    let script = doc
        .by_id(script_id)
        .ok_or_else(|| CrawlError::missing(format!("script#{}", script_id)))?;
    let raw = text_of(script);
    if raw.trim().is_empty() {
        return Err(CrawlError::missing(format!("script#{} text", script_id)));
    }
    serde_json::from_str(&raw)
        .map_err(|e| CrawlError::Parse(format!("script#{} is not valid JSON: {}", script_id, e)))
}

/// A position inside the blob plus the dotted path that led there.
#[derive(Debug, Clone)]
pub struct Cursor<'a> {
    value: &'a Value,
    path: String,
}

impl<'a> Cursor<'a> {
    pub fn root(value: &'a Value, name: &str) -> Self {
        Self {
            value,
            path: name.to_string(),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn value(&self) -> &'a Value {
        self.value
    }

    pub fn field(&self, key: &str) -> Result<Cursor<'a>> {
        let path = format!("{}.{}", self.path, key);
        let object = self.value.as_object().ok_or_else(|| CrawlError::ShapeChanged {
            path: self.path.clone(),
            expected: "object",
        })?;
        match object.get(key) {
            None | Some(Value::Null) => Err(CrawlError::MissingField(path)),
            Some(value) => Ok(Cursor { value, path }),
        }
    }

    /// Walks a dotted path such as `"state.data.items"`.
    pub fn walk(&self, dotted: &str) -> Result<Cursor<'a>> {
        let mut cursor = Cursor {
            value: self.value,
            path: self.path.clone(),
        };
        for key in dotted.split('.') {
            cursor = cursor.field(key)?;
        }
        Ok(cursor)
    }

    pub fn items(&self) -> Result<Vec<Cursor<'a>>> {
        let array = self.value.as_array().ok_or_else(|| CrawlError::ShapeChanged {
            path: self.path.clone(),
            expected: "array",
        })?;
        Ok(array
            .iter()
            .enumerate()
            .map(|(i, value)| Cursor {
                value,
                path: format!("{}[{}]", self.path, i),
            })
            .collect())
    }

    pub fn index(&self, i: usize) -> Result<Cursor<'a>> {
        self.items()?
            .into_iter()
            .nth(i)
            .ok_or_else(|| CrawlError::MissingField(format!("{}[{}]", self.path, i)))
    }

    pub fn str(&self) -> Result<&'a str> {
        self.value.as_str().ok_or_else(|| CrawlError::ShapeChanged {
            path: self.path.clone(),
            expected: "string",
        })
    }

    /// A string that must also be non-empty.
    pub fn text(&self) -> Result<&'a str> {
        let s = self.str()?;
        if s.trim().is_empty() {
            return Err(CrawlError::MissingField(self.path.clone()));
        }
        Ok(s)
    }

    pub fn u64(&self) -> Result<u64> {
        self.value.as_u64().ok_or_else(|| CrawlError::ShapeChanged {
            path: self.path.clone(),
            expected: "unsigned integer",
        })
    }

    /// Identifiers show up both as JSON numbers and as numeric strings.
    pub fn id(&self) -> Result<u64> {
        match self.value {
            Value::Number(_) => self.u64(),
            Value::String(s) => s.trim().parse().map_err(|_| CrawlError::ShapeChanged {
                path: self.path.clone(),
                expected: "numeric id",
            }),
            _ => Err(CrawlError::ShapeChanged {
                path: self.path.clone(),
                expected: "numeric id",
            }),
        }
    }
}
