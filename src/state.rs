//! Per-form state and derived selectors.

use crate::conditional::ConditionRecord;
use crate::path::{Path, encode_name};
use crate::structure::Structure;
use crate::validators::FieldValidator;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One entry of the registered-fields sequence: insertion order is mount
/// order, unique by name.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisteredField {
    pub name: String,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub field_type: Option<String>,
}

impl RegisteredField {
    pub fn new(name: impl Into<String>, field_type: Option<String>) -> Self {
        RegisteredField {
            name: name.into(),
            field_type,
        }
    }
}

/// Async validation progress: not running, running for the whole form, or
/// running for one field.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AsyncValidating {
    #[default]
    Inactive,
    Form,
    Field(String),
}

impl AsyncValidating {
    pub fn is_active(&self) -> bool {
        !matches!(self, AsyncValidating::Inactive)
    }
}

/// A small insertion-ordered map keyed by encoded field name.
///
/// The conditions table relies on insertion order for deterministic sibling
/// traversal during propagation; tables are small, so lookups scan.
#[derive(Clone, Debug, PartialEq)]
pub struct OrderedMap<T>(Vec<(String, T)>);

impl<T> Default for OrderedMap<T> {
    fn default() -> Self {
        OrderedMap(Vec::new())
    }
}

impl<T> OrderedMap<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&T> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut T> {
        self.0.iter_mut().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Insert or replace; replacing keeps the key's original position.
    pub fn insert(&mut self, key: String, value: T) {
        match self.0.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => *slot = value,
            None => self.0.push((key, value)),
        }
    }

    /// Mutable access to the key's value, inserting a default at the end
    /// first when the key is absent.
    pub fn get_or_insert_with(&mut self, key: &str, default: impl FnOnce() -> T) -> &mut T {
        let pos = match self.0.iter().position(|(k, _)| k == key) {
            Some(pos) => pos,
            None => {
                self.0.push((key.to_string(), default()));
                self.0.len() - 1
            }
        };
        &mut self.0[pos].1
    }

    pub fn remove(&mut self, key: &str) -> Option<T> {
        let pos = self.0.iter().position(|(k, _)| k == key)?;
        Some(self.0.remove(pos).1)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &T)> {
        self.0.iter().map(|(k, v)| (k, v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Conditions table: encoded field name → condition record.
pub type ConditionMap<V> = OrderedMap<ConditionRecord<V>>;

/// Validations table: encoded field name → ordered validator list.
pub type ValidationMap<V> = OrderedMap<Vec<FieldValidator<V>>>;

/// The complete state of one form.
///
/// Value-shaped branches (`values`, `initial`, `fields`, the error trees)
/// are containers of the structural backend; the bookkeeping tables carry
/// typed records. Every reducer transition produces a new `FormState`.
#[derive(Clone, Debug, PartialEq)]
pub struct FormState<V> {
    /// Path-keyed current field values.
    pub values: V,
    /// Snapshot of `values` at the last initialize/reset.
    pub initial: V,
    /// Per-field UI metadata: touched, visited, active, autofilled.
    pub fields: V,
    /// Mounted fields in mount order.
    pub registered_fields: Vec<RegisteredField>,
    /// Encoded name → condition record.
    pub conditions: ConditionMap<V>,
    /// Encoded name → normalized validator list.
    pub validations: ValidationMap<V>,
    /// Errors from registered field validators.
    pub sync_errors: V,
    /// Errors supplied by the external async validation collaborator.
    pub async_errors: V,
    /// Errors supplied by a rejected submit handler.
    pub submit_errors: V,
    /// Name of the field currently holding focus.
    pub active: Option<String>,
    pub any_touched: bool,
    pub submitting: bool,
    pub submit_failed: bool,
    pub submit_succeeded: bool,
    pub async_validating: AsyncValidating,
    /// Form-level error, split out of error payloads under the `_error` key.
    pub error: Option<V>,
}

impl<V: Clone + fmt::Debug + PartialEq> FormState<V> {
    pub fn empty<S: Structure<Value = V>>(structure: &S) -> Self {
        FormState {
            values: structure.empty_map(),
            initial: structure.empty_map(),
            fields: structure.empty_map(),
            registered_fields: Vec::new(),
            conditions: ConditionMap::new(),
            validations: ValidationMap::new(),
            sync_errors: structure.empty_map(),
            async_errors: structure.empty_map(),
            submit_errors: structure.empty_map(),
            active: None,
            any_touched: false,
            submitting: false,
            submit_failed: false,
            submit_succeeded: false,
            async_validating: AsyncValidating::default(),
            error: None,
        }
    }

    /// Current value of a field, if present and resolvable.
    pub fn value<S: Structure<Value = V>>(&self, structure: &S, name: &str) -> Option<V> {
        structure.get_in(&self.values, &Path::parse_lenient(name))
    }

    /// Current values structurally equal to the last-initialized values.
    pub fn pristine<S: Structure<Value = V>>(&self, structure: &S) -> bool {
        structure.deep_equal(&self.initial, &self.values)
    }

    pub fn dirty<S: Structure<Value = V>>(&self, structure: &S) -> bool {
        !self.pristine(structure)
    }

    /// No sync, async, or submit errors.
    pub fn valid<S: Structure<Value = V>>(&self, structure: &S) -> bool {
        structure.is_empty(&self.sync_errors)
            && structure.is_empty(&self.async_errors)
            && structure.is_empty(&self.submit_errors)
    }

    pub fn invalid<S: Structure<Value = V>>(&self, structure: &S) -> bool {
        !self.valid(structure)
    }

    /// Visibility of a field. A field with no condition record is visible.
    pub fn is_visible(&self, name: &str) -> bool {
        match self.conditions.get(&encode_name(name)) {
            Some(record) => record.visible,
            None => true,
        }
    }

    /// Sync error for a field, if any.
    pub fn sync_error<S: Structure<Value = V>>(&self, structure: &S, name: &str) -> Option<V> {
        structure.get_in(&self.sync_errors, &Path::parse_lenient(name))
    }
}
