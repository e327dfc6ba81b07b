//! Multi-form dispatch.
//!
//! A [`FormRouter`] holds one [`FormReducer`] and routes each action to the
//! form named by its `form` field, creating form state on first touch and
//! dropping it on destroy. Plugin reducers can be stacked per form to run
//! after the built-in behavior.

use crate::action::{Action, ActionKind};
use crate::reducer::FormReducer;
use crate::state::FormState;
use crate::structure::Structure;
use std::collections::HashMap;
use std::sync::Arc;

/// A per-form plugin: sees the form's state after the built-in reducer ran
/// (or `None` when the form does not exist) and returns the replacement
/// state, `None` removing the form.
pub type PluginReducer<V> =
    Arc<dyn Fn(Option<&FormState<V>>, &Action<V>) -> Option<FormState<V>> + Send + Sync>;

/// State for every live form, keyed by form identifier.
#[derive(Clone, Debug, PartialEq)]
pub struct FormsState<V> {
    forms: HashMap<String, FormState<V>>,
}

impl<V> Default for FormsState<V> {
    fn default() -> Self {
        FormsState {
            forms: HashMap::new(),
        }
    }
}

impl<V> FormsState<V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn form(&self, name: &str) -> Option<&FormState<V>> {
        self.forms.get(name)
    }

    pub fn contains_form(&self, name: &str) -> bool {
        self.forms.contains_key(name)
    }

    /// Seed or replace a form's state wholesale, outside of dispatch.
    pub fn insert_form(&mut self, name: impl Into<String>, state: FormState<V>) {
        self.forms.insert(name.into(), state);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &FormState<V>)> {
        self.forms.iter()
    }

    pub fn len(&self) -> usize {
        self.forms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.forms.is_empty()
    }
}

/// Routes actions across forms.
pub struct FormRouter<S: Structure> {
    reducer: FormReducer<S>,
    plugins: Vec<(String, PluginReducer<S::Value>)>,
}

impl<S: Structure> FormRouter<S>
where
    S::Value: 'static,
{
    pub fn new(structure: S, registry: crate::validators::ValidatorRegistry<S::Value>) -> Self {
        Self::from_reducer(FormReducer::new(structure, registry))
    }

    pub fn from_reducer(reducer: FormReducer<S>) -> Self {
        FormRouter {
            reducer,
            plugins: Vec::new(),
        }
    }

    pub fn reducer(&self) -> &FormReducer<S> {
        &self.reducer
    }

    pub fn structure(&self) -> &S {
        self.reducer.structure()
    }

    /// Stack a plugin reducer for one form. Plugins run after the built-in
    /// reducer, in the order they were added.
    pub fn plugin(
        mut self,
        form: impl Into<String>,
        f: impl Fn(Option<&FormState<S::Value>>, &Action<S::Value>) -> Option<FormState<S::Value>>
        + Send
        + Sync
        + 'static,
    ) -> Self {
        self.plugins.push((form.into(), Arc::new(f)));
        self
    }

    /// Apply one action. An action with an empty form identifier is a no-op;
    /// destroy drops the form entry; anything else reduces the named form,
    /// creating it empty on first touch.
    pub fn reduce(
        &self,
        mut state: FormsState<S::Value>,
        action: &Action<S::Value>,
    ) -> FormsState<S::Value> {
        if action.form.is_empty() {
            return state;
        }

        match &action.kind {
            ActionKind::Destroy => {
                state.forms.remove(&action.form);
            }
            kind => {
                let current = state
                    .forms
                    .remove(&action.form)
                    .unwrap_or_else(|| self.reducer.empty_form());
                let next = self.reducer.reduce_form(current, kind);
                state.forms.insert(action.form.clone(), next);
            }
        }

        for (form, plugin) in &self.plugins {
            let next = plugin(state.forms.get(form), action);
            match next {
                Some(next) => {
                    state.forms.insert(form.clone(), next);
                }
                None => {
                    state.forms.remove(form);
                }
            }
        }
        state
    }
}
