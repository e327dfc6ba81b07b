//! The action vocabulary.
//!
//! Every state transition enters the library as an [`Action`]: a target
//! form identifier plus one [`ActionKind`]. Actions are plain values; the
//! UI binding layer builds them from change/blur/focus handlers and field
//! lifecycle events, and the router applies them in dispatch order.

use crate::conditional::Conditional;
use crate::validators::ValidationRule;

/// One dispatched action, addressed to a form by identifier.
#[derive(Clone, Debug)]
pub struct Action<V> {
    pub form: String,
    pub kind: ActionKind<V>,
}

/// The enumerated action kinds handled by the form reducer.
#[derive(Clone, Debug)]
pub enum ActionKind<V> {
    /// Insert `payload` at `index` of an array field.
    ArrayInsert {
        field: String,
        index: usize,
        payload: Option<V>,
    },
    /// Move the element at `from` to position `to`, carrying its auxiliary
    /// state along.
    ArrayMove {
        field: String,
        from: usize,
        to: usize,
    },
    /// Remove the last element.
    ArrayPop { field: String },
    /// Append `payload`.
    ArrayPush {
        field: String,
        payload: Option<V>,
    },
    /// Remove the element at `index`.
    ArrayRemove { field: String, index: usize },
    /// Remove every element.
    ArrayRemoveAll { field: String },
    /// Remove the first element.
    ArrayShift { field: String },
    /// The array primitive: remove `remove_num` elements at `index`, then
    /// insert `payload` there when present.
    ArraySplice {
        field: String,
        index: usize,
        remove_num: usize,
        payload: Option<V>,
    },
    /// Swap the elements at `index_a` and `index_b`.
    ArraySwap {
        field: String,
        index_a: usize,
        index_b: usize,
    },
    /// Prepend `payload`.
    ArrayUnshift {
        field: String,
        payload: Option<V>,
    },
    /// Programmatic value fill, flagged on the field's metadata.
    Autofill { field: String, payload: V },
    /// Field lost focus, optionally committing a value and touching.
    Blur {
        field: String,
        payload: Option<V>,
        touch: bool,
    },
    /// Field value edited. Triggers dependency propagation and
    /// re-validation.
    Change {
        field: String,
        payload: Option<V>,
        touch: bool,
    },
    /// Drop the whole form (handled by the router).
    Destroy,
    /// Field gained focus.
    Focus { field: String },
    /// Wholesale replacement of values and the initial snapshot.
    Initialize { payload: V, keep_dirty: bool },
    /// Declare (or re-declare) a field's visibility condition.
    RegisterConditional {
        name: String,
        conditional: Option<Conditional<V>>,
    },
    /// A field mounted.
    RegisterField {
        name: String,
        field_type: Option<String>,
    },
    /// Declare a field's validator list; `None` removes the declaration.
    RegisterValidation {
        name: String,
        validation: Option<Vec<ValidationRule<V>>>,
    },
    /// Restore values from the initial snapshot and re-derive all
    /// visibility from scratch.
    Reset,
    /// Submit handler rejected; touch the named fields.
    SetSubmitFailed { fields: Vec<String> },
    SetSubmitSucceeded,
    /// Async validation started, for one field or the whole form.
    StartAsyncValidation { field: Option<String> },
    StartSubmit,
    /// Async validation finished; payload splits `_error` from per-field
    /// errors.
    StopAsyncValidation { payload: Option<V> },
    /// Submit finished; payload splits `_error` from per-field errors, an
    /// empty payload means success.
    StopSubmit { payload: Option<V> },
    Touch { fields: Vec<String> },
    /// A field unmounted.
    UnregisterField { name: String },
    Untouch { fields: Vec<String> },
    /// Replace the form-level error and merge externally computed sync
    /// errors.
    UpdateSyncErrors {
        sync_errors: Option<V>,
        error: Option<V>,
    },
}

impl<V> Action<V> {
    pub fn new(form: impl Into<String>, kind: ActionKind<V>) -> Self {
        Action {
            form: form.into(),
            kind,
        }
    }

    pub fn change(form: impl Into<String>, field: impl Into<String>, payload: V) -> Self {
        Action::new(
            form,
            ActionKind::Change {
                field: field.into(),
                payload: Some(payload),
                touch: false,
            },
        )
    }

    pub fn blur(form: impl Into<String>, field: impl Into<String>, payload: Option<V>) -> Self {
        Action::new(
            form,
            ActionKind::Blur {
                field: field.into(),
                payload,
                touch: false,
            },
        )
    }

    pub fn focus(form: impl Into<String>, field: impl Into<String>) -> Self {
        Action::new(
            form,
            ActionKind::Focus {
                field: field.into(),
            },
        )
    }

    pub fn register_field(form: impl Into<String>, name: impl Into<String>) -> Self {
        Action::new(
            form,
            ActionKind::RegisterField {
                name: name.into(),
                field_type: None,
            },
        )
    }

    pub fn register_conditional(
        form: impl Into<String>,
        name: impl Into<String>,
        conditional: Conditional<V>,
    ) -> Self {
        Action::new(
            form,
            ActionKind::RegisterConditional {
                name: name.into(),
                conditional: Some(conditional),
            },
        )
    }

    pub fn initialize(form: impl Into<String>, payload: V) -> Self {
        Action::new(
            form,
            ActionKind::Initialize {
                payload,
                keep_dirty: false,
            },
        )
    }

    pub fn reset(form: impl Into<String>) -> Self {
        Action::new(form, ActionKind::Reset)
    }

    pub fn destroy(form: impl Into<String>) -> Self {
        Action::new(form, ActionKind::Destroy)
    }
}
