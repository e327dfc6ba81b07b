//! The per-form reducer.
//!
//! [`FormReducer`] owns a structural backend and a validator registry and
//! applies one [`ActionKind`] to one [`FormState`] at a time. Every handler
//! is a pure transition: it consumes the state, returns the next state, and
//! touches nothing else. The multi-form dispatch layer lives in
//! [`crate::router`].

use crate::action::ActionKind;
use crate::conditional::{ConditionRecord, parse_conditional, propagate, register_spec};
use crate::path::{Path, decode_name, encode_name};
use crate::state::{AsyncValidating, FormState, RegisteredField};
use crate::structure::Structure;
use crate::validators::{ValidatorRegistry, run_field_validation};

/// Applies actions to a single form's state.
///
/// The registry is consulted when a validation declaration is registered;
/// validators resolved at that point stay attached to the form until the
/// declaration is replaced or removed.
pub struct FormReducer<S: Structure> {
    structure: S,
    registry: ValidatorRegistry<S::Value>,
}

impl<S: Structure> FormReducer<S>
where
    S::Value: 'static,
{
    pub fn new(structure: S, registry: ValidatorRegistry<S::Value>) -> Self {
        FormReducer {
            structure,
            registry,
        }
    }

    pub fn structure(&self) -> &S {
        &self.structure
    }

    pub fn registry(&self) -> &ValidatorRegistry<S::Value> {
        &self.registry
    }

    pub fn empty_form(&self) -> FormState<S::Value> {
        FormState::empty(&self.structure)
    }

    /// Apply one action to one form. Unhandled combinations return the
    /// state unchanged; the reducer is total over its inputs.
    pub fn reduce_form(
        &self,
        state: FormState<S::Value>,
        kind: &ActionKind<S::Value>,
    ) -> FormState<S::Value> {
        match kind {
            ActionKind::ArrayInsert {
                field,
                index,
                payload,
            } => self.array_splice(state, field, *index, 0, payload.clone()),
            ActionKind::ArrayMove { field, from, to } => self.array_move(state, field, *from, *to),
            ActionKind::ArrayPop { field } => {
                let len = self.list_len(&state, field);
                if len > 0 {
                    self.array_splice(state, field, len - 1, 1, None)
                } else {
                    state
                }
            }
            ActionKind::ArrayPush { field, payload } => {
                let len = self.list_len(&state, field);
                self.array_splice(state, field, len, 0, payload.clone())
            }
            ActionKind::ArrayRemove { field, index } => {
                self.array_splice(state, field, *index, 1, None)
            }
            ActionKind::ArrayRemoveAll { field } => {
                let len = self.list_len(&state, field);
                if len > 0 {
                    self.array_splice(state, field, 0, len, None)
                } else {
                    state
                }
            }
            ActionKind::ArrayShift { field } => self.array_splice(state, field, 0, 1, None),
            ActionKind::ArraySplice {
                field,
                index,
                remove_num,
                payload,
            } => self.array_splice(state, field, *index, *remove_num, payload.clone()),
            ActionKind::ArraySwap {
                field,
                index_a,
                index_b,
            } => self.array_swap(state, field, *index_a, *index_b),
            ActionKind::ArrayUnshift { field, payload } => {
                self.array_splice(state, field, 0, 0, payload.clone())
            }
            ActionKind::Autofill { field, payload } => self.autofill(state, field, payload),
            ActionKind::Blur {
                field,
                payload,
                touch,
            } => self.blur(state, field, payload.as_ref(), *touch),
            ActionKind::Change {
                field,
                payload,
                touch,
            } => self.change(state, field, payload.as_ref(), *touch),
            // Destroy removes the whole form; the router handles it.
            ActionKind::Destroy => state,
            ActionKind::Focus { field } => self.focus(state, field),
            ActionKind::Initialize {
                payload,
                keep_dirty,
            } => self.initialize(state, payload, *keep_dirty),
            ActionKind::RegisterConditional { name, conditional } => {
                let cached = self
                    .structure
                    .get_in(&state.values, &Path::parse_lenient(name));
                let spec = conditional.clone().map(parse_conditional);
                register_spec(&self.structure, state, name, spec, cached)
            }
            ActionKind::RegisterField { name, field_type } => {
                self.register_field(state, name, field_type.clone())
            }
            ActionKind::RegisterValidation { name, validation } => {
                self.register_validation(state, name, validation.as_deref())
            }
            ActionKind::Reset => self.reset(state),
            ActionKind::SetSubmitFailed { fields } => self.set_submit_failed(state, fields),
            ActionKind::SetSubmitSucceeded => {
                let mut state = state;
                state.submit_failed = false;
                state.submit_succeeded = true;
                state.submitting = false;
                state
            }
            ActionKind::StartAsyncValidation { field } => {
                let mut state = state;
                state.async_validating = match field {
                    Some(name) => AsyncValidating::Field(name.clone()),
                    None => AsyncValidating::Form,
                };
                state
            }
            ActionKind::StartSubmit => {
                let mut state = state;
                state.submitting = true;
                state
            }
            ActionKind::StopAsyncValidation { payload } => {
                self.stop_async_validation(state, payload.as_ref())
            }
            ActionKind::StopSubmit { payload } => self.stop_submit(state, payload.as_ref()),
            ActionKind::Touch { fields } => {
                let mut state = state;
                for field in fields {
                    self.touch_field(&mut state, field);
                }
                state.any_touched = true;
                state
            }
            ActionKind::UnregisterField { name } => self.unregister_field(state, name),
            ActionKind::Untouch { fields } => {
                let mut state = state;
                for field in fields {
                    let path = Path::parse_lenient(field).key("touched");
                    state.fields = self.structure.delete_in(&state.fields, &path);
                }
                state
            }
            ActionKind::UpdateSyncErrors { sync_errors, error } => {
                self.update_sync_errors(state, sync_errors.as_ref(), error.as_ref())
            }
        }
    }

    // ─── Value edits ────────────────────────────────────────────────────────

    /// The shared value-assignment rule for change and blur: an empty string
    /// on a field with no initial value removes the value instead of storing
    /// it, so untyped-then-cleared fields leave no residue.
    fn assign_value(
        &self,
        state: &mut FormState<S::Value>,
        path: &Path,
        payload: Option<&S::Value>,
    ) {
        let s = &self.structure;
        let initial = s.get_in(&state.initial, path);
        match payload {
            Some(p) if initial.is_none() && s.is_blank_string(p) => {
                state.values = s.delete_in_with_cleanup(&state.values, path);
            }
            Some(p) => {
                state.values = s.set_in(&state.values, path, p.clone());
            }
            None => {}
        }
    }

    fn change(
        &self,
        mut state: FormState<S::Value>,
        field: &str,
        payload: Option<&S::Value>,
        touch: bool,
    ) -> FormState<S::Value> {
        let s = &self.structure;
        let path = Path::parse_lenient(field);
        let encoded = encode_name(field);

        self.assign_value(&mut state, &path, payload);

        // Record the value on the field's condition record so a later
        // hide/reveal cycle can restore it. A field changed before any
        // conditional registration gets an implicit unconditional record.
        state
            .conditions
            .get_or_insert_with(&encoded, || ConditionRecord::unconditional(None))
            .cached_value = payload.cloned();

        state.async_errors = s.delete_in_with_cleanup(&state.async_errors, &path);
        state.submit_errors = s.delete_in_with_cleanup(&state.submit_errors, &path);
        state.fields =
            s.delete_in_with_cleanup(&state.fields, &path.clone().key("autofilled"));
        state.error = None;
        if touch {
            self.touch_field(&mut state, field);
            state.any_touched = true;
        }

        state = propagate(s, state, field);
        run_field_validation(s, &mut state, field);
        state
    }

    fn blur(
        &self,
        mut state: FormState<S::Value>,
        field: &str,
        payload: Option<&S::Value>,
        touch: bool,
    ) -> FormState<S::Value> {
        let s = &self.structure;
        let path = Path::parse_lenient(field);

        self.assign_value(&mut state, &path, payload);

        if state.active.as_deref() == Some(field) {
            state.active = None;
        }
        state.fields = s.delete_in(&state.fields, &path.clone().key("active"));
        if touch {
            self.touch_field(&mut state, field);
            state.any_touched = true;
        }
        state
    }

    fn focus(&self, mut state: FormState<S::Value>, field: &str) -> FormState<S::Value> {
        let s = &self.structure;
        if let Some(previous) = state.active.take() {
            let path = Path::parse_lenient(&previous).key("active");
            state.fields = s.delete_in(&state.fields, &path);
        }
        let path = Path::parse_lenient(field);
        state.fields = s.set_in(
            &state.fields,
            &path.clone().key("visited"),
            s.from_bool(true),
        );
        state.fields = s.set_in(&state.fields, &path.key("active"), s.from_bool(true));
        state.active = Some(field.to_string());
        state
    }

    fn autofill(
        &self,
        mut state: FormState<S::Value>,
        field: &str,
        payload: &S::Value,
    ) -> FormState<S::Value> {
        let s = &self.structure;
        let path = Path::parse_lenient(field);
        state.async_errors = s.delete_in_with_cleanup(&state.async_errors, &path);
        state.submit_errors = s.delete_in_with_cleanup(&state.submit_errors, &path);
        state.fields = s.set_in(
            &state.fields,
            &path.clone().key("autofilled"),
            s.from_bool(true),
        );
        state.values = s.set_in(&state.values, &path, payload.clone());
        state
    }

    fn touch_field(&self, state: &mut FormState<S::Value>, field: &str) {
        let s = &self.structure;
        let path = Path::parse_lenient(field).key("touched");
        state.fields = s.set_in(&state.fields, &path, s.from_bool(true));
    }

    // ─── Array operations ───────────────────────────────────────────────────

    fn list_len(&self, state: &FormState<S::Value>, field: &str) -> usize {
        let path = Path::parse_lenient(field);
        self.structure
            .get_in(&state.values, &path)
            .map(|list| self.structure.size(&list))
            .unwrap_or(0)
    }

    /// The array primitive. The values branch is always spliced, creating
    /// the list if absent; the auxiliary branches (field metadata, submit
    /// and async errors) are spliced only where they already track the
    /// field, inserting an empty-map placeholder to keep element alignment.
    fn array_splice(
        &self,
        mut state: FormState<S::Value>,
        field: &str,
        index: usize,
        remove: usize,
        payload: Option<S::Value>,
    ) -> FormState<S::Value> {
        let s = &self.structure;
        let path = Path::parse_lenient(field);
        let aux_insert = payload.as_ref().map(|_| s.empty_map());

        let existing = s.get_in(&state.values, &path);
        state.values = s.set_in(
            &state.values,
            &path,
            s.splice(existing.as_ref(), index, remove, payload),
        );

        for branch in [
            &mut state.fields,
            &mut state.submit_errors,
            &mut state.async_errors,
        ] {
            if let Some(existing) = s.get_in(branch, &path) {
                let next = s.set_in(
                    branch,
                    &path,
                    s.splice(Some(&existing), index, remove, aux_insert.clone()),
                );
                *branch = next;
            }
        }
        state
    }

    fn array_move(
        &self,
        mut state: FormState<S::Value>,
        field: &str,
        from: usize,
        to: usize,
    ) -> FormState<S::Value> {
        let s = &self.structure;
        if self.list_len(&state, field) == 0 {
            return state;
        }
        let path = Path::parse_lenient(field);

        for branch in [
            &mut state.values,
            &mut state.fields,
            &mut state.submit_errors,
            &mut state.async_errors,
        ] {
            if let Some(list) = s.get_in(branch, &path) {
                let moved = s
                    .get_in(branch, &path.clone().index(from))
                    .unwrap_or_else(|| s.null());
                let removed = s.splice(Some(&list), from, 1, None);
                let inserted = s.splice(Some(&removed), to, 0, Some(moved));
                let next = s.set_in(branch, &path, inserted);
                *branch = next;
            }
        }
        state
    }

    fn array_swap(
        &self,
        mut state: FormState<S::Value>,
        field: &str,
        index_a: usize,
        index_b: usize,
    ) -> FormState<S::Value> {
        let s = &self.structure;
        let path = Path::parse_lenient(field);
        let path_a = path.clone().index(index_a);
        let path_b = path.index(index_b);

        for branch in [
            &mut state.values,
            &mut state.fields,
            &mut state.submit_errors,
            &mut state.async_errors,
        ] {
            let value_a = s.get_in(branch, &path_a);
            let value_b = s.get_in(branch, &path_b);
            if value_a.is_some() || value_b.is_some() {
                let mut next = s.set_in(branch, &path_a, value_b.unwrap_or_else(|| s.null()));
                next = s.set_in(&next, &path_b, value_a.unwrap_or_else(|| s.null()));
                *branch = next;
            }
        }
        state
    }

    // ─── Lifecycle ──────────────────────────────────────────────────────────

    fn initialize(
        &self,
        state: FormState<S::Value>,
        payload: &S::Value,
        keep_dirty: bool,
    ) -> FormState<S::Value> {
        let s = &self.structure;
        let mut result = self.empty_form();
        result.registered_fields = state.registered_fields;
        result.conditions = state.conditions;
        result.validations = state.validations;

        let mut new_values = payload.clone();
        if keep_dirty {
            // Keep the value of dirty fields while updating pristine ones,
            // so reinitializing never stomps on user edits. The initial
            // snapshot is replaced regardless; a dirty field whose value
            // matches the new initial value becomes pristine again.
            for field in &result.registered_fields {
                let path = Path::parse_lenient(&field.name);
                let previous_initial = s.get_in(&state.initial, &path);
                let previous_value = s.get_in(&state.values, &path);
                let dirty = match (&previous_value, &previous_initial) {
                    (Some(a), Some(b)) => !s.deep_equal(a, b),
                    (None, None) => false,
                    _ => true,
                };
                if dirty {
                    new_values = match previous_value {
                        Some(value) => s.set_in(&new_values, &path, value),
                        None => s.delete_in_with_cleanup(&new_values, &path),
                    };
                }
            }
        }
        result.values = new_values;
        result.initial = payload.clone();
        result
    }

    /// Restore values from the initial snapshot and re-derive the whole
    /// visibility graph against them. Registered fields survive; validation
    /// declarations do not, fields re-register them on remount.
    fn reset(&self, state: FormState<S::Value>) -> FormState<S::Value> {
        let s = &self.structure;
        let mut result = self.empty_form();
        result.registered_fields = state.registered_fields;
        result.values = state.initial.clone();
        result.initial = state.initial;

        for (encoded, record) in state.conditions.iter() {
            let name = decode_name(encoded);
            let restored = s.get_in(&result.values, &Path::parse_lenient(&name));
            match &record.condition {
                None => {
                    result
                        .conditions
                        .insert(encoded.clone(), ConditionRecord::unconditional(restored));
                }
                Some(spec) => {
                    result = register_spec(s, result, &name, Some(spec.clone()), restored);
                }
            }
        }
        result
    }

    // ─── Registration ───────────────────────────────────────────────────────

    fn register_field(
        &self,
        mut state: FormState<S::Value>,
        name: &str,
        field_type: Option<String>,
    ) -> FormState<S::Value> {
        if state.registered_fields.iter().any(|f| f.name == name) {
            return state;
        }
        state
            .registered_fields
            .push(RegisteredField::new(name, field_type));
        state
    }

    fn unregister_field(
        &self,
        mut state: FormState<S::Value>,
        name: &str,
    ) -> FormState<S::Value> {
        let Some(index) = state
            .registered_fields
            .iter()
            .position(|f| f.name == name)
        else {
            return state;
        };
        if state.registered_fields.len() <= 1 {
            state.registered_fields.clear();
        } else {
            state.registered_fields.remove(index);
        }
        state
    }

    fn register_validation(
        &self,
        mut state: FormState<S::Value>,
        name: &str,
        validation: Option<&[crate::validators::ValidationRule<S::Value>]>,
    ) -> FormState<S::Value> {
        let encoded = encode_name(name);
        match validation {
            Some(rules) => {
                state.validations.insert(encoded, self.registry.normalize(rules));
            }
            None => {
                state.validations.remove(&encoded);
            }
        }
        state
    }

    // ─── Submission and async validation ────────────────────────────────────

    /// Split an error payload into the form-level `_error` entry and the
    /// per-field remainder.
    fn split_error_payload(&self, payload: &S::Value) -> (Option<S::Value>, S::Value) {
        let s = &self.structure;
        let error_path = Path::single_key("_error");
        let form_error = s
            .get_in(payload, &error_path)
            .filter(|e| s.truthy(e));
        let field_errors = s.delete_in(payload, &error_path);
        (form_error, field_errors)
    }

    fn stop_async_validation(
        &self,
        mut state: FormState<S::Value>,
        payload: Option<&S::Value>,
    ) -> FormState<S::Value> {
        let s = &self.structure;
        state.async_validating = AsyncValidating::Inactive;
        match payload {
            Some(p) if s.size(p) > 0 => {
                let (form_error, field_errors) = self.split_error_payload(p);
                if let Some(error) = form_error {
                    state.error = Some(error);
                }
                state.async_errors = if s.size(&field_errors) > 0 {
                    field_errors
                } else {
                    s.empty_map()
                };
            }
            _ => {
                state.error = None;
                state.async_errors = s.empty_map();
            }
        }
        state
    }

    fn stop_submit(
        &self,
        mut state: FormState<S::Value>,
        payload: Option<&S::Value>,
    ) -> FormState<S::Value> {
        let s = &self.structure;
        state.submitting = false;
        state.submit_failed = false;
        state.submit_succeeded = false;
        match payload {
            Some(p) if s.size(p) > 0 => {
                let (form_error, field_errors) = self.split_error_payload(p);
                if let Some(error) = form_error {
                    state.error = Some(error);
                }
                state.submit_errors = if s.size(&field_errors) > 0 {
                    field_errors
                } else {
                    s.empty_map()
                };
                state.submit_failed = true;
            }
            _ => {
                state.submit_succeeded = true;
                state.error = None;
                state.submit_errors = s.empty_map();
            }
        }
        state
    }

    fn set_submit_failed(
        &self,
        mut state: FormState<S::Value>,
        fields: &[String],
    ) -> FormState<S::Value> {
        state.submit_failed = true;
        state.submit_succeeded = false;
        state.submitting = false;
        for field in fields {
            self.touch_field(&mut state, field);
        }
        if !fields.is_empty() {
            state.any_touched = true;
        }
        state
    }

    fn update_sync_errors(
        &self,
        mut state: FormState<S::Value>,
        sync_errors: Option<&S::Value>,
        error: Option<&S::Value>,
    ) -> FormState<S::Value> {
        let s = &self.structure;
        state.error = match error {
            Some(e) if s.truthy(e) => Some(e.clone()),
            _ => None,
        };
        match sync_errors {
            Some(errors) if s.size(errors) > 0 => {
                state.sync_errors = s.merge(&state.sync_errors, errors);
            }
            _ => {
                state.sync_errors = s.empty_map();
            }
        }
        state
    }
}
