//! Conditional field visibility.
//!
//! A field may declare that its visibility depends on another field's value.
//! Each declaration is normalized into a [`ConditionSpec`] and stored as a
//! [`ConditionRecord`] in the form's conditions table, keyed by encoded
//! field name. Records form a DAG via `depend_on` edges: a node is visible
//! iff its dependency is visible and the dependency's value satisfies the
//! declared condition. A hidden field's value is removed from the value
//! tree and cached on the record for restoration when it reappears.

use crate::path::{Path, decode_name, encode_name};
use crate::state::FormState;
use crate::structure::Structure;
use crate::validators::{clear_sync_error, run_field_validation};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

/// Predicate over the dependency's value and the full form state.
pub type Predicate<V> = Arc<dyn Fn(Option<&V>, &FormState<V>) -> bool + Send + Sync>;

/// What the dependency's value is tested against.
pub enum DependValue<V> {
    /// Deep equality against a literal.
    Literal(V),
    /// Any truthy value (string-shorthand declarations).
    Truthy,
    /// Arbitrary predicate.
    Predicate(Predicate<V>),
}

impl<V: Clone> Clone for DependValue<V> {
    fn clone(&self) -> Self {
        match self {
            DependValue::Literal(v) => DependValue::Literal(v.clone()),
            DependValue::Truthy => DependValue::Truthy,
            DependValue::Predicate(f) => DependValue::Predicate(Arc::clone(f)),
        }
    }
}

impl<V: fmt::Debug> fmt::Debug for DependValue<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DependValue::Literal(v) => f.debug_tuple("Literal").field(v).finish(),
            DependValue::Truthy => f.write_str("Truthy"),
            DependValue::Predicate(_) => f.write_str("Predicate(<fn>)"),
        }
    }
}

impl<V: PartialEq> PartialEq for DependValue<V> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (DependValue::Literal(a), DependValue::Literal(b)) => a == b,
            (DependValue::Truthy, DependValue::Truthy) => true,
            (DependValue::Predicate(a), DependValue::Predicate(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

/// Normalized condition: which field this one depends on, and how its value
/// is tested.
#[derive(Clone, Debug, PartialEq)]
pub struct ConditionSpec<V> {
    pub depend_on: String,
    pub depend_value: DependValue<V>,
}

/// A conditional declaration as written at a field.
#[derive(Clone)]
pub enum Conditional<V> {
    /// Visible iff the named field's value is truthy.
    Truthy(String),
    /// Visible iff the named field's value deep-equals the literal.
    Equals(String, V),
    /// Visible iff the predicate holds for the named field's value.
    When(String, Predicate<V>),
}

impl<V> Conditional<V> {
    pub fn truthy(name: impl Into<String>) -> Self {
        Conditional::Truthy(name.into())
    }

    pub fn equals(name: impl Into<String>, value: V) -> Self {
        Conditional::Equals(name.into(), value)
    }

    pub fn when(
        name: impl Into<String>,
        predicate: impl Fn(Option<&V>, &FormState<V>) -> bool + Send + Sync + 'static,
    ) -> Self {
        Conditional::When(name.into(), Arc::new(predicate))
    }
}

impl<V: fmt::Debug> fmt::Debug for Conditional<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Conditional::Truthy(name) => f.debug_tuple("Truthy").field(name).finish(),
            Conditional::Equals(name, v) => f.debug_tuple("Equals").field(name).field(v).finish(),
            Conditional::When(name, _) => f.debug_tuple("When").field(name).field(&"<fn>").finish(),
        }
    }
}

/// Normalize a declaration into its spec form.
pub fn parse_conditional<V>(conditional: Conditional<V>) -> ConditionSpec<V> {
    match conditional {
        Conditional::Truthy(name) => ConditionSpec {
            depend_on: name,
            depend_value: DependValue::Truthy,
        },
        Conditional::Equals(name, value) => ConditionSpec {
            depend_on: name,
            depend_value: DependValue::Literal(value),
        },
        Conditional::When(name, predicate) => ConditionSpec {
            depend_on: name,
            depend_value: DependValue::Predicate(predicate),
        },
    }
}

/// One node of the visibility graph.
///
/// `condition == None` marks an unconditional field, which is always
/// visible. `cached_value` holds the last value assigned while visible (or
/// last observed via a change) and is restored into the value tree when the
/// field reappears.
#[derive(Clone, Debug, PartialEq)]
pub struct ConditionRecord<V> {
    pub condition: Option<ConditionSpec<V>>,
    pub visible: bool,
    pub cached_value: Option<V>,
}

impl<V> ConditionRecord<V> {
    /// The implicit record created for a field with no declared condition.
    pub fn unconditional(cached_value: Option<V>) -> Self {
        ConditionRecord {
            condition: None,
            visible: true,
            cached_value,
        }
    }
}

/// Evaluate a depend-value against the dependency's current value.
pub(crate) fn eval_depend_value<S: Structure>(
    structure: &S,
    depend_value: &DependValue<S::Value>,
    value: Option<&S::Value>,
    state: &FormState<S::Value>,
) -> bool {
    match depend_value {
        DependValue::Literal(expected) => match value {
            Some(actual) => structure.deep_equal(expected, actual),
            None => false,
        },
        DependValue::Truthy => value.is_some_and(|v| structure.truthy(v)),
        DependValue::Predicate(predicate) => predicate(value, state),
    }
}

fn specs_equal<S: Structure>(
    structure: &S,
    a: &ConditionSpec<S::Value>,
    b: &ConditionSpec<S::Value>,
) -> bool {
    if a.depend_on != b.depend_on {
        return false;
    }
    match (&a.depend_value, &b.depend_value) {
        (DependValue::Literal(x), DependValue::Literal(y)) => structure.deep_equal(x, y),
        (DependValue::Truthy, DependValue::Truthy) => true,
        (DependValue::Predicate(x), DependValue::Predicate(y)) => Arc::ptr_eq(x, y),
        _ => false,
    }
}

/// Register a condition record for `name`, computing its initial
/// visibility and applying the hide/reveal consequences.
///
/// Re-registering an equal condition returns the state unchanged. A
/// condition whose dependency has no record yet is not resolvable and
/// registers hidden (fail-closed); it resolves the next time the
/// dependency changes, which propagates through the dependent. Registering
/// the dependency alone does not re-evaluate existing dependents.
pub(crate) fn register_spec<S: Structure>(
    structure: &S,
    mut state: FormState<S::Value>,
    name: &str,
    spec: Option<ConditionSpec<S::Value>>,
    cached_value: Option<S::Value>,
) -> FormState<S::Value> {
    let encoded = encode_name(name);

    if let Some(new_spec) = &spec
        && let Some(existing) = state.conditions.get(&encoded)
        && let Some(existing_spec) = &existing.condition
        && specs_equal(structure, existing_spec, new_spec)
    {
        return state;
    }

    let visible = match &spec {
        None => true,
        Some(spec) => match state.conditions.get(&encode_name(&spec.depend_on)) {
            Some(dep_record) if dep_record.visible => {
                let dep_value =
                    structure.get_in(&state.values, &Path::parse_lenient(&spec.depend_on));
                eval_depend_value(structure, &spec.depend_value, dep_value.as_ref(), &state)
            }
            _ => false,
        },
    };

    state.conditions.insert(
        encoded,
        ConditionRecord {
            condition: spec,
            visible,
            cached_value,
        },
    );

    let path = Path::parse_lenient(name);
    if visible {
        run_field_validation(structure, &mut state, name);
    } else {
        state.values = structure.delete_in_with_cleanup(&state.values, &path);
        clear_sync_error(structure, &mut state, name);
    }
    state
}

/// Re-evaluate every field whose visibility (transitively) depends on
/// `changed_field`.
///
/// An adjacency index (`depend_on` → dependents, in conditions-table
/// insertion order) is built once per pass, then walked depth-first from
/// the changed field using its own visibility as the root parent
/// visibility. A dependent turning hidden loses its value and sync error;
/// one turning (or staying) visible gets its cached value restored and is
/// re-validated. Sibling evaluation order is the table's insertion order
/// and never affects the outcome: each dependent reads only its ancestors.
pub(crate) fn propagate<S: Structure>(
    structure: &S,
    mut state: FormState<S::Value>,
    changed_field: &str,
) -> FormState<S::Value> {
    let mut dependents: HashMap<String, Vec<String>> = HashMap::new();
    for (encoded, record) in state.conditions.iter() {
        if let Some(spec) = &record.condition {
            dependents
                .entry(spec.depend_on.clone())
                .or_default()
                .push(encoded.clone());
        }
    }
    if dependents.is_empty() {
        return state;
    }

    let root_visible = state
        .conditions
        .get(&encode_name(changed_field))
        .map(|record| record.visible)
        .unwrap_or(true);

    // The table is a DAG by construction; the visited set stops a
    // misdeclared cycle from recursing forever.
    let mut visited = HashSet::new();
    visit(
        structure,
        &mut state,
        &dependents,
        changed_field,
        root_visible,
        &mut visited,
    );
    state
}

fn visit<S: Structure>(
    structure: &S,
    state: &mut FormState<S::Value>,
    dependents: &HashMap<String, Vec<String>>,
    parent: &str,
    parent_visible: bool,
    visited: &mut HashSet<String>,
) {
    let Some(children) = dependents.get(parent) else {
        return;
    };
    let parent_path = Path::parse_lenient(parent);

    for encoded_child in children {
        if !visited.insert(encoded_child.clone()) {
            continue;
        }
        let Some(record) = state.conditions.get(encoded_child) else {
            continue;
        };
        let Some(spec) = record.condition.clone() else {
            continue;
        };
        let cached = record.cached_value.clone();

        let parent_value = structure.get_in(&state.values, &parent_path);
        let visible = parent_visible
            && eval_depend_value(structure, &spec.depend_value, parent_value.as_ref(), state);

        if let Some(record) = state.conditions.get_mut(encoded_child) {
            record.visible = visible;
        }

        let child_name = decode_name(encoded_child);
        let child_path = Path::parse_lenient(&child_name);
        if visible {
            match cached {
                Some(value) => {
                    state.values = structure.set_in(&state.values, &child_path, value);
                }
                None => {
                    state.values = structure.delete_in_with_cleanup(&state.values, &child_path);
                }
            }
            run_field_validation(structure, state, &child_name);
        } else {
            state.values = structure.delete_in_with_cleanup(&state.values, &child_path);
            clear_sync_error(structure, state, &child_name);
        }

        visit(structure, state, dependents, &child_name, visible, visited);
    }
}
