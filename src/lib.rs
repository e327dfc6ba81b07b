//! Form state management with conditional field visibility.
//!
//! State lives in a single [`FormsState`] tree and changes only through
//! dispatched [`Action`]s applied by a pure reducer:
//!
//! ```text
//! Action → FormRouter::reduce(FormsState) → FormsState
//! ```
//!
//! Fields may declare that their visibility depends on another field's
//! value. The reducer maintains the resulting dependency graph: changing a
//! field re-evaluates every transitive dependent, hidden fields lose their
//! values (cached for restoration on reveal), and per-field validators run
//! against whatever is currently visible.
//!
//! # Quick Start
//!
//! ```rust
//! use condform::{Action, Conditional, FormsState};
//! use serde_json::json;
//!
//! let router = condform::plain_router();
//! let mut state = FormsState::new();
//!
//! state = router.reduce(state, &Action::register_field("survey", "employed"));
//! state = router.reduce(state, &Action::register_field("survey", "employer"));
//! state = router.reduce(
//!     state,
//!     &Action::register_conditional("survey", "employer", Conditional::truthy("employed")),
//! );
//!
//! // "employer" only exists while "employed" is truthy.
//! state = router.reduce(state, &Action::change("survey", "employed", json!(true)));
//! state = router.reduce(state, &Action::change("survey", "employer", json!("ACME")));
//! assert_eq!(state.form("survey").unwrap().values, json!({"employed": true, "employer": "ACME"}));
//!
//! state = router.reduce(state, &Action::change("survey", "employed", json!(false)));
//! assert_eq!(state.form("survey").unwrap().values, json!({"employed": false}));
//! ```
//!
//! # Feature Flags
//!
//! | Feature              | Default | Description |
//! |----------------------|---------|-------------|
//! | `builtin-validators` | yes     | Named validators (`required`, `ipv4`, `ipv6`, `netmask`) for the plain backend, and the [`plain_router`] entry point. |

pub mod action;
pub mod conditional;
pub mod path;
pub mod reducer;
pub mod router;
pub mod state;
pub mod structure;
pub mod validators;

pub use action::{Action, ActionKind};
pub use conditional::{ConditionRecord, ConditionSpec, Conditional, DependValue, Predicate};
pub use path::{Path, PathParseError, Seg};
pub use reducer::FormReducer;
pub use router::{FormRouter, FormsState, PluginReducer};
pub use state::{AsyncValidating, FormState, RegisteredField};
pub use structure::{Plain, Structure};
pub use validators::{FieldValidator, ValidationRule, ValidatorRegistry};

/// Router over the plain `serde_json` backend, preloaded with the built-in
/// validators.
#[cfg(feature = "builtin-validators")]
pub fn plain_router() -> FormRouter<Plain> {
    FormRouter::new(Plain, validators::builtin::registry())
}
