use super::common::router;
use condform::{Action, ActionKind, FormsState};
use serde_json::json;

#[test]
fn forms_evolve_independently() {
    let r = router();
    let mut state = FormsState::new();
    state = r.reduce(state, &Action::change("login", "user", json!("ada")));
    state = r.reduce(state, &Action::change("signup", "user", json!("grace")));
    state = r.reduce(state, &Action::new("login", ActionKind::StartSubmit));

    assert!(state.form("login").unwrap().submitting);
    assert!(!state.form("signup").unwrap().submitting);
    assert_eq!(state.form("signup").unwrap().values, json!({"user": "grace"}));
}

#[test]
fn destroy_then_redispatch_starts_fresh() {
    let r = router();
    let mut state = FormsState::new();
    state = r.reduce(state, &Action::change("wizard", "step", json!(3)));
    state = r.reduce(state, &Action::destroy("wizard"));
    assert!(!state.contains_form("wizard"));

    state = r.reduce(state, &Action::change("wizard", "step", json!(1)));
    assert_eq!(state.form("wizard").unwrap().values, json!({"step": 1}));
}

#[test]
fn destroy_of_unknown_form_is_harmless() {
    let r = router();
    let state = r.reduce(FormsState::new(), &Action::destroy("ghost"));
    assert!(state.is_empty());
}

#[test]
fn plugin_sees_post_reducer_state() {
    let r = router().plugin("audited", |form, action| {
        let mut form = form.cloned()?;
        if let ActionKind::Change { .. } = action.kind {
            // The built-in reducer already applied the change.
            form.error = form
                .value(&condform::Plain, "flagged")
                .map(|_| json!("flagged value present"));
        }
        Some(form)
    });

    let mut state = FormsState::new();
    state = r.reduce(state, &Action::change("audited", "flagged", json!(1)));
    assert_eq!(
        state.form("audited").unwrap().error,
        Some(json!("flagged value present"))
    );

    // Clearing the field removes the value, and the plugin sees that too.
    state = r.reduce(state, &Action::change("audited", "flagged", json!("")));
    assert_eq!(state.form("audited").unwrap().error, None);
}
