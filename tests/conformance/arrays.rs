use super::common::{FORM, form_state, form_values, reduce_all, router, seeded};
use condform::{Action, ActionKind};
use serde_json::json;

fn push(field: &str, payload: serde_json::Value) -> Action<serde_json::Value> {
    Action::new(
        FORM,
        ActionKind::ArrayPush {
            field: field.into(),
            payload: Some(payload),
        },
    )
}

#[test]
fn push_creates_the_list() {
    let r = router();
    let state = reduce_all(&r, [push("xs", json!("a")), push("xs", json!("b"))]);
    assert_eq!(*form_values(&state), json!({"xs": ["a", "b"]}));
}

#[test]
fn insert_keeps_error_branches_aligned() {
    let r = router();
    let mut state = seeded(json!({"xs": ["a", "b", "c"]}));
    let mut form = state.form(FORM).unwrap().clone();
    form.submit_errors = json!({"xs": ["ea", "eb", "ec"]});
    form.fields = json!({"xs": [{"touched": true}, {}, {}]});
    state.insert_form(FORM, form);

    let state = r.reduce(
        state,
        &Action::new(
            FORM,
            ActionKind::ArrayInsert {
                field: "xs".into(),
                index: 1,
                payload: Some(json!("new")),
            },
        ),
    );
    let form = form_state(&state);
    assert_eq!(form.values, json!({"xs": ["a", "new", "b", "c"]}));
    // The inserted element has no errors yet; a placeholder keeps indices
    // aligned with the values list.
    assert_eq!(form.submit_errors, json!({"xs": ["ea", {}, "eb", "ec"]}));
    assert_eq!(form.fields, json!({"xs": [{"touched": true}, {}, {}, {}]}));
}

#[test]
fn remove_drops_the_aligned_error() {
    let r = router();
    let mut state = seeded(json!({"xs": ["a", "b", "c"]}));
    let mut form = state.form(FORM).unwrap().clone();
    form.async_errors = json!({"xs": ["ea", "eb", "ec"]});
    state.insert_form(FORM, form);

    let state = r.reduce(
        state,
        &Action::new(
            FORM,
            ActionKind::ArrayRemove {
                field: "xs".into(),
                index: 0,
            },
        ),
    );
    let form = form_state(&state);
    assert_eq!(form.values, json!({"xs": ["b", "c"]}));
    assert_eq!(form.async_errors, json!({"xs": ["eb", "ec"]}));
}

#[test]
fn splice_with_removal_and_insertion() {
    let r = router();
    let state = seeded(json!({"xs": [1, 2, 3, 4]}));
    let state = r.reduce(
        state,
        &Action::new(
            FORM,
            ActionKind::ArraySplice {
                field: "xs".into(),
                index: 1,
                remove_num: 2,
                payload: Some(json!(9)),
            },
        ),
    );
    assert_eq!(*form_values(&state), json!({"xs": [1, 9, 4]}));
}

#[test]
fn move_carries_metadata_with_the_element() {
    let r = router();
    let mut state = seeded(json!({"xs": ["a", "b", "c"]}));
    let mut form = state.form(FORM).unwrap().clone();
    form.fields = json!({"xs": [{"touched": true}, {}, {}]});
    state.insert_form(FORM, form);

    let state = r.reduce(
        state,
        &Action::new(
            FORM,
            ActionKind::ArrayMove {
                field: "xs".into(),
                from: 0,
                to: 2,
            },
        ),
    );
    let form = form_state(&state);
    assert_eq!(form.values, json!({"xs": ["b", "c", "a"]}));
    assert_eq!(form.fields, json!({"xs": [{}, {}, {"touched": true}]}));
}

#[test]
fn move_on_missing_list_is_a_no_op() {
    let r = router();
    let state = seeded(json!({}));
    let next = r.reduce(
        state.clone(),
        &Action::new(
            FORM,
            ActionKind::ArrayMove {
                field: "xs".into(),
                from: 0,
                to: 1,
            },
        ),
    );
    assert_eq!(next, state);
}

#[test]
fn swap_exchanges_across_all_branches() {
    let r = router();
    let mut state = seeded(json!({"xs": ["a", "b"]}));
    let mut form = state.form(FORM).unwrap().clone();
    form.submit_errors = json!({"xs": ["ea", "eb"]});
    state.insert_form(FORM, form);

    let state = r.reduce(
        state,
        &Action::new(
            FORM,
            ActionKind::ArraySwap {
                field: "xs".into(),
                index_a: 0,
                index_b: 1,
            },
        ),
    );
    let form = form_state(&state);
    assert_eq!(form.values, json!({"xs": ["b", "a"]}));
    assert_eq!(form.submit_errors, json!({"xs": ["eb", "ea"]}));
}

#[test]
fn pop_and_shift_on_empty_list_are_no_ops() {
    let r = router();
    let state = seeded(json!({"xs": []}));
    let popped = r.reduce(
        state.clone(),
        &Action::new(FORM, ActionKind::ArrayPop { field: "xs".into() }),
    );
    assert_eq!(*form_values(&popped), json!({"xs": []}));

    let shifted = r.reduce(
        state,
        &Action::new(FORM, ActionKind::ArrayShift { field: "xs".into() }),
    );
    assert_eq!(*form_values(&shifted), json!({"xs": []}));
}

#[test]
fn remove_all_then_push_restarts_the_list() {
    let r = router();
    let state = seeded(json!({"xs": [1, 2, 3]}));
    let state = r.reduce(
        state,
        &Action::new(FORM, ActionKind::ArrayRemoveAll { field: "xs".into() }),
    );
    assert_eq!(*form_values(&state), json!({"xs": []}));

    let state = r.reduce(state, &push("xs", json!(7)));
    assert_eq!(*form_values(&state), json!({"xs": [7]}));
}
