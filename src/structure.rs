//! Structural operations provider.
//!
//! The reducer and the conditional engine never touch a concrete container
//! type; they are generic over [`Structure`], a capability interface for
//! path-oriented reads and writes on an immutable value tree. The crate
//! ships [`Plain`], a backend over `serde_json::Value`. A persistent
//! (structurally shared) backend is a drop-in alternative implementation.

use crate::path::{Path, Seg};
use serde_json::Value;
use std::fmt;

/// Path-oriented operations over an immutable value tree.
///
/// Every write returns a new tree; implementations must never mutate the
/// input in place. `deep_equal` is structural, with numeric tolerance
/// (`42` equals `42.0`).
pub trait Structure: Clone {
    type Value: Clone + fmt::Debug + PartialEq;

    fn empty_map(&self) -> Self::Value;
    fn empty_list(&self) -> Self::Value;

    /// The absent-value placeholder used to fill vacated list slots.
    fn null(&self) -> Self::Value;

    /// Resolve a path, or `None` if any segment fails to resolve.
    fn get_in(&self, root: &Self::Value, path: &Path) -> Option<Self::Value>;

    /// Set the value at a path, creating intermediate containers as needed.
    /// A key segment creates a map, an index segment creates a list padded
    /// with nulls up to the index.
    fn set_in(&self, root: &Self::Value, path: &Path, value: Self::Value) -> Self::Value;

    /// Remove the value at a path. A missing path returns the tree unchanged.
    fn delete_in(&self, root: &Self::Value, path: &Path) -> Self::Value;

    /// List splice: remove `remove` elements at `index`, then insert
    /// `insert` there when present. An absent or non-list `seq` starts from
    /// an empty list; an out-of-range index pads with nulls.
    fn splice(
        &self,
        seq: Option<&Self::Value>,
        index: usize,
        remove: usize,
        insert: Option<Self::Value>,
    ) -> Self::Value;

    fn deep_equal(&self, a: &Self::Value, b: &Self::Value) -> bool;

    /// Deep merge: map entries of `overlay` merge recursively into `base`;
    /// anything else in `overlay` replaces the `base` value.
    fn merge(&self, base: &Self::Value, overlay: &Self::Value) -> Self::Value;

    /// Entry count of a container; 0 for scalars.
    fn size(&self, v: &Self::Value) -> usize;

    /// True for a map or list with no entries.
    fn is_empty(&self, v: &Self::Value) -> bool;

    /// Truthiness for the string-shorthand conditional: null, `false`, `0`,
    /// and `""` are falsy; everything else (including empty containers) is
    /// truthy.
    fn truthy(&self, v: &Self::Value) -> bool;

    /// True when the value is the empty string.
    fn is_blank_string(&self, v: &Self::Value) -> bool;

    fn from_bool(&self, b: bool) -> Self::Value;
    fn from_str(&self, s: &str) -> Self::Value;

    /// Remove a path and any ancestor containers left empty by the removal.
    /// The tree root itself is never removed, only emptied.
    fn delete_in_with_cleanup(&self, root: &Self::Value, path: &Path) -> Self::Value {
        let mut result = self.delete_in(root, path);
        let mut current = path.clone();
        while let Some(parent) = current.parent() {
            match self.get_in(&result, &parent) {
                Some(container) if self.is_empty(&container) => {
                    result = self.delete_in(&result, &parent);
                }
                _ => break,
            }
            current = parent;
        }
        result
    }
}

/// The plain backend: value trees are `serde_json::Value`, writes rebuild
/// the spine of the affected path.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Plain;

impl Structure for Plain {
    type Value = Value;

    fn empty_map(&self) -> Value {
        Value::Object(serde_json::Map::new())
    }

    fn empty_list(&self) -> Value {
        Value::Array(Vec::new())
    }

    fn null(&self) -> Value {
        Value::Null
    }

    fn get_in(&self, root: &Value, path: &Path) -> Option<Value> {
        let mut current = root;
        for seg in path {
            current = match seg {
                Seg::Key(k) => current.as_object()?.get(k)?,
                Seg::Index(i) => current.as_array()?.get(*i)?,
            };
        }
        Some(current.clone())
    }

    fn set_in(&self, root: &Value, path: &Path, value: Value) -> Value {
        set_in_segs(root, path.segments(), value)
    }

    fn delete_in(&self, root: &Value, path: &Path) -> Value {
        delete_in_segs(root, path.segments())
    }

    fn splice(
        &self,
        seq: Option<&Value>,
        index: usize,
        remove: usize,
        insert: Option<Value>,
    ) -> Value {
        let mut items: Vec<Value> = match seq.and_then(Value::as_array) {
            Some(arr) => arr.clone(),
            None => Vec::new(),
        };
        if index > items.len() {
            items.resize(index, Value::Null);
        }
        let end = (index + remove).min(items.len());
        items.drain(index..end);
        if let Some(value) = insert {
            items.insert(index, value);
        }
        Value::Array(items)
    }

    fn deep_equal(&self, a: &Value, b: &Value) -> bool {
        values_deep_equal(a, b)
    }

    fn merge(&self, base: &Value, overlay: &Value) -> Value {
        match (base, overlay) {
            (Value::Object(a), Value::Object(b)) => {
                let mut out = a.clone();
                for (k, v) in b {
                    let merged = match out.get(k) {
                        Some(existing) => self.merge(existing, v),
                        None => v.clone(),
                    };
                    out.insert(k.clone(), merged);
                }
                Value::Object(out)
            }
            _ => overlay.clone(),
        }
    }

    fn size(&self, v: &Value) -> usize {
        match v {
            Value::Array(a) => a.len(),
            Value::Object(o) => o.len(),
            _ => 0,
        }
    }

    fn is_empty(&self, v: &Value) -> bool {
        match v {
            Value::Array(a) => a.is_empty(),
            Value::Object(o) => o.is_empty(),
            _ => false,
        }
    }

    fn truthy(&self, v: &Value) -> bool {
        match v {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
            Value::String(s) => !s.is_empty(),
            Value::Array(_) | Value::Object(_) => true,
        }
    }

    fn is_blank_string(&self, v: &Value) -> bool {
        v.as_str() == Some("")
    }

    fn from_bool(&self, b: bool) -> Value {
        Value::Bool(b)
    }

    fn from_str(&self, s: &str) -> Value {
        Value::String(s.to_string())
    }
}

fn set_in_segs(root: &Value, segs: &[Seg], value: Value) -> Value {
    let Some((head, rest)) = segs.split_first() else {
        return value;
    };
    match head {
        Seg::Key(k) => {
            let mut map = match root.as_object() {
                Some(obj) => obj.clone(),
                None => serde_json::Map::new(),
            };
            let child = map.get(k).cloned().unwrap_or(Value::Null);
            map.insert(k.clone(), set_in_segs(&child, rest, value));
            Value::Object(map)
        }
        Seg::Index(i) => {
            let mut items = match root.as_array() {
                Some(arr) => arr.clone(),
                None => Vec::new(),
            };
            if *i >= items.len() {
                items.resize(i + 1, Value::Null);
            }
            let child = items[*i].clone();
            items[*i] = set_in_segs(&child, rest, value);
            Value::Array(items)
        }
    }
}

fn delete_in_segs(root: &Value, segs: &[Seg]) -> Value {
    let Some((head, rest)) = segs.split_first() else {
        return root.clone();
    };
    match (head, root) {
        (Seg::Key(k), Value::Object(map)) => {
            let Some(child) = map.get(k) else {
                return root.clone();
            };
            let mut map = map.clone();
            if rest.is_empty() {
                map.shift_remove(k);
            } else {
                map.insert(k.clone(), delete_in_segs(child, rest));
            }
            Value::Object(map)
        }
        (Seg::Index(i), Value::Array(items)) => {
            if *i >= items.len() {
                return root.clone();
            }
            let mut items = items.clone();
            if rest.is_empty() {
                items.remove(*i);
            } else {
                let child = items[*i].clone();
                items[*i] = delete_in_segs(&child, rest);
            }
            Value::Array(items)
        }
        _ => root.clone(),
    }
}

/// Structural deep equality with numeric tolerance: integer 42 equals
/// float 42.0; object key order is irrelevant; lists compare element-wise.
fn values_deep_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Null, Value::Null) => true,
        (Value::Bool(a), Value::Bool(b)) => a == b,
        (Value::Number(a), Value::Number(b)) => match (a.as_f64(), b.as_f64()) {
            (Some(fa), Some(fb)) => fa == fb,
            _ => a == b,
        },
        (Value::String(a), Value::String(b)) => a == b,
        (Value::Array(a), Value::Array(b)) => {
            a.len() == b.len() && a.iter().zip(b.iter()).all(|(a, b)| values_deep_equal(a, b))
        }
        (Value::Object(a), Value::Object(b)) => {
            a.len() == b.len()
                && a.iter()
                    .all(|(k, v)| b.get(k).is_some_and(|bv| values_deep_equal(v, bv)))
        }
        _ => false,
    }
}
