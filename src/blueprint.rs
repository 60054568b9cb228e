//! Declarative blueprints: trees of named properties with value lists and
//! nested blocks.
//!
//! A blueprint is parsed from a JSON object. String values are terminals or
//! references, nested objects become child blueprints, and arrays flatten
//! (recursively) into value lists. Lookups fall back to the parent scope, so
//! a block can reference properties defined anywhere above it.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use fxhash::FxHashMap;
use serde_json::Value;

use crate::error::{Error, Result};

/// A node of the blueprint tree, cheap to clone.
///
/// Children hold weak references to their parents, mirroring the ownership
/// direction of the tree itself: a blueprint keeps its children alive, never
/// the other way around.
#[derive(Debug, Clone)]
pub struct Blueprint(Rc<Inner>);

#[derive(Debug)]
struct Inner {
    parent: Weak<Inner>,
    values: FxHashMap<String, Vec<String>>,
    children: RefCell<FxHashMap<String, Blueprint>>,
}

impl Blueprint {
    /// Parse a blueprint from JSON bytes.
    ///
    /// The top level must be an object. Numeric, boolean and null property
    /// values are rejected with [`Error::InvalidBlueprint`].
    pub fn parse(data: &[u8]) -> Result<Blueprint> {
        let raw: Value = serde_json::from_slice(data)?;
        let Value::Object(object) = raw else {
            return Err(Error::InvalidBlueprint(
                "top level must be a JSON object".into(),
            ));
        };
        parse_object(&object, Weak::new())
    }

    /// The values of a property, falling back to the parent scope when the
    /// property is not defined locally. Unknown properties yield an empty
    /// slice.
    pub fn values(&self, property: &str) -> Vec<String> {
        if let Some(values) = self.0.values.get(property) {
            return values.clone();
        }
        match self.0.parent.upgrade() {
            Some(parent) => Blueprint(parent).values(property),
            None => Vec::new(),
        }
    }

    /// The child blueprint stored under `property`, with the same parent
    /// scope fallback as [`Blueprint::values`].
    pub fn child(&self, property: &str) -> Option<Blueprint> {
        if let Some(child) = self.0.children.borrow().get(property) {
            return Some(child.clone());
        }
        self.0
            .parent
            .upgrade()
            .and_then(|parent| Blueprint(parent).child(property))
    }
}

fn parse_object(object: &serde_json::Map<String, Value>, parent: Weak<Inner>) -> Result<Blueprint> {
    let node = Blueprint(Rc::new(Inner {
        parent,
        values: object
            .iter()
            .map(|(key, value)| {
                let mut counter = 0;
                Ok((key.clone(), value_names(value, key, &mut counter)?))
            })
            .collect::<Result<_>>()?,
        children: RefCell::new(FxHashMap::default()),
    }));

    for (key, value) in object {
        let mut counter = 0;
        attach_children(value, key, &mut counter, &node)?;
    }
    Ok(node)
}

/// The value list a JSON value flattens into. Nested objects are replaced by
/// synthesised `*key<counter>` references; those are the only names starting
/// with `*`.
fn value_names(value: &Value, key: &str, counter: &mut usize) -> Result<Vec<String>> {
    match value {
        Value::String(s) => Ok(vec![s.clone()]),
        Value::Object(_) => {
            let name = format!("*{key}{counter}");
            *counter += 1;
            Ok(vec![name])
        }
        Value::Array(elements) => {
            let mut values = Vec::new();
            for element in elements {
                values.extend(value_names(element, key, counter)?);
            }
            Ok(values)
        }
        other => Err(Error::InvalidBlueprint(format!(
            "'{other}' is not a valid type for a property"
        ))),
    }
}

/// Parse the nested objects below a JSON value, registering them as children
/// under the same synthesised names produced by [`value_names`].
fn attach_children(value: &Value, key: &str, counter: &mut usize, node: &Blueprint) -> Result<()> {
    match value {
        Value::Object(object) => {
            let name = format!("*{key}{counter}");
            *counter += 1;
            let child = parse_object(object, Rc::downgrade(&node.0))?;
            node.0.children.borrow_mut().insert(name, child);
            Ok(())
        }
        Value::Array(elements) => {
            for element in elements {
                attach_children(element, key, counter, node)?;
            }
            Ok(())
        }
        _ => Ok(()),
    }
}
