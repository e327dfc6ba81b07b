use super::common::{FORM, form_state, form_values, reduce_all, router, value, visible};
use condform::{Action, ActionKind, Conditional};
use serde_json::json;

fn unconditional(name: &str) -> Action<serde_json::Value> {
    Action::new(
        FORM,
        ActionKind::RegisterConditional {
            name: name.into(),
            conditional: None,
        },
    )
}

#[test]
fn truthy_dependent_follows_its_dependency() {
    let r = router();
    let mut state = reduce_all(
        &r,
        [
            unconditional("employed"),
            Action::register_conditional(FORM, "employer", Conditional::truthy("employed")),
        ],
    );
    assert!(!visible(&state, "employer"));

    state = r.reduce(state, &Action::change(FORM, "employed", json!(true)));
    assert!(visible(&state, "employer"));

    state = r.reduce(state, &Action::change(FORM, "employer", json!("ACME")));
    assert_eq!(
        *form_values(&state),
        json!({"employed": true, "employer": "ACME"})
    );

    state = r.reduce(state, &Action::change(FORM, "employed", json!(false)));
    assert!(!visible(&state, "employer"));
    assert_eq!(*form_values(&state), json!({"employed": false}));
}

#[test]
fn hidden_value_is_restored_on_reveal() {
    let r = router();
    let mut state = reduce_all(
        &r,
        [
            unconditional("employed"),
            Action::register_conditional(FORM, "employer", Conditional::truthy("employed")),
            Action::change(FORM, "employed", json!(true)),
            Action::change(FORM, "employer", json!("ACME")),
            Action::change(FORM, "employed", json!(false)),
        ],
    );
    assert_eq!(value(&state, "employer"), None);

    state = r.reduce(state, &Action::change(FORM, "employed", json!(true)));
    assert!(visible(&state, "employer"));
    assert_eq!(value(&state, "employer"), Some(json!("ACME")));
}

#[test]
fn equals_conditional_uses_deep_equality() {
    let r = router();
    let mut state = reduce_all(
        &r,
        [
            unconditional("kind"),
            Action::register_conditional(FORM, "detail", Conditional::equals("kind", json!("other"))),
            Action::change(FORM, "kind", json!("other")),
        ],
    );
    assert!(visible(&state, "detail"));

    state = r.reduce(state, &Action::change(FORM, "kind", json!("basic")));
    assert!(!visible(&state, "detail"));
}

#[test]
fn predicate_conditional_sees_value_and_state() {
    let r = router();
    let mut state = reduce_all(
        &r,
        [
            unconditional("money"),
            Action::register_conditional(
                FORM,
                "yacht",
                Conditional::when("money", |value, _state| {
                    value
                        .and_then(|v: &serde_json::Value| v.as_f64())
                        .is_some_and(|n| n > 1000.0)
                }),
            ),
            Action::change(FORM, "money", json!(5000)),
        ],
    );
    assert!(visible(&state, "yacht"));

    state = r.reduce(state, &Action::change(FORM, "money", json!(10)));
    assert!(!visible(&state, "yacht"));
}

#[test]
fn reregistering_an_equal_condition_is_identity() {
    let r = router();
    let register =
        || Action::register_conditional(FORM, "employer", Conditional::truthy("employed"));
    let state = reduce_all(
        &r,
        [
            unconditional("employed"),
            register(),
            Action::change(FORM, "employed", json!(true)),
        ],
    );

    let again = r.reduce(state.clone(), &register());
    assert_eq!(again, state);
}

#[test]
fn unresolvable_dependency_registers_hidden() {
    let r = router();
    // "ghost" has no condition record, so "haunted" cannot resolve.
    let state = reduce_all(
        &r,
        [Action::register_conditional(
            FORM,
            "haunted",
            Conditional::truthy("ghost"),
        )],
    );
    assert!(!visible(&state, "haunted"));
}

#[test]
fn cascade_hides_and_reveals_transitively() {
    let r = router();
    let mut state = reduce_all(
        &r,
        [
            unconditional("a"),
            Action::register_conditional(FORM, "b", Conditional::truthy("a")),
            Action::register_conditional(FORM, "c", Conditional::truthy("b")),
            Action::change(FORM, "a", json!(true)),
            Action::change(FORM, "b", json!("on")),
            Action::change(FORM, "c", json!("deep")),
        ],
    );
    assert!(visible(&state, "b"));
    assert!(visible(&state, "c"));

    // Hiding the root hides the whole chain and erases its values.
    state = r.reduce(state, &Action::change(FORM, "a", json!(false)));
    assert!(!visible(&state, "b"));
    assert!(!visible(&state, "c"));
    assert_eq!(*form_values(&state), json!({"a": false}));

    // Revealing the root restores the chain from the cached values.
    state = r.reduce(state, &Action::change(FORM, "a", json!(true)));
    assert!(visible(&state, "b"));
    assert!(visible(&state, "c"));
    assert_eq!(
        *form_values(&state),
        json!({"a": true, "b": "on", "c": "deep"})
    );
}

#[test]
fn cascading_hide_with_equals_chain() {
    let r = router();
    let mut state = reduce_all(
        &r,
        [
            unconditional("a"),
            Action::register_conditional(FORM, "b", Conditional::equals("a", json!(true))),
            Action::register_conditional(FORM, "c", Conditional::equals("b", json!(true))),
            Action::change(FORM, "a", json!(true)),
            Action::change(FORM, "b", json!(true)),
            Action::change(FORM, "a", json!(false)),
        ],
    );
    // One transition hid the whole chain.
    assert!(!visible(&state, "b"));
    assert!(!visible(&state, "c"));

    // Revealing "b" restores its cached value, which happens to satisfy
    // "c" as well; overwriting "b" with a non-matching value hides "c"
    // again while "b" stays visible.
    state = r.reduce(state, &Action::change(FORM, "a", json!(true)));
    assert!(visible(&state, "b"));
    assert!(visible(&state, "c"));

    state = r.reduce(state, &Action::change(FORM, "b", json!(false)));
    assert!(visible(&state, "b"));
    assert!(!visible(&state, "c"));

    state = r.reduce(state, &Action::change(FORM, "b", json!(true)));
    assert!(visible(&state, "c"));
}

#[test]
fn scenario_male_money_rich() {
    use super::common::seeded;
    let r = router();
    let mut state = seeded(json!({"male": true, "money": 1000, "rich": false}));
    for action in [
        unconditional("male"),
        Action::register_conditional(FORM, "money", Conditional::equals("male", json!(true))),
        Action::register_conditional(FORM, "rich", Conditional::equals("money", json!(1000))),
    ] {
        state = r.reduce(state, &action);
    }
    assert!(visible(&state, "male"));
    assert!(visible(&state, "money"));
    assert!(visible(&state, "rich"));

    state = r.reduce(state, &Action::change(FORM, "male", json!(false)));
    assert!(!visible(&state, "money"));
    assert!(!visible(&state, "rich"));
    assert_eq!(value(&state, "money"), None);
    assert_eq!(value(&state, "rich"), None);

    state = r.reduce(state, &Action::change(FORM, "male", json!(true)));
    state = r.reduce(state, &Action::change(FORM, "money", json!(1000)));
    assert!(visible(&state, "money"));
    assert!(visible(&state, "rich"));
}

#[test]
fn scenario_rich_survey() {
    // male -> money (truthy) -> rich (predicate over money).
    let r = router();
    let mut state = reduce_all(
        &r,
        [
            unconditional("male"),
            Action::register_conditional(FORM, "money", Conditional::truthy("male")),
            Action::register_conditional(
                FORM,
                "rich",
                Conditional::when("money", |value, _| {
                    value
                        .and_then(|v: &serde_json::Value| v.as_f64())
                        .is_some_and(|n| n >= 1_000_000.0)
                }),
            ),
            Action::change(FORM, "male", json!(true)),
            Action::change(FORM, "money", json!(2_000_000)),
            Action::change(FORM, "rich", json!("yes")),
        ],
    );
    assert_eq!(
        *form_values(&state),
        json!({"male": true, "money": 2_000_000, "rich": "yes"})
    );

    // Dropping money below the threshold hides only "rich".
    state = r.reduce(state, &Action::change(FORM, "money", json!(100)));
    assert!(visible(&state, "money"));
    assert!(!visible(&state, "rich"));
    assert_eq!(*form_values(&state), json!({"male": true, "money": 100}));

    // Unsetting male hides the rest of the chain.
    state = r.reduce(state, &Action::change(FORM, "male", json!(false)));
    assert_eq!(*form_values(&state), json!({"male": false}));
}

#[test]
fn hiding_clears_the_dependents_sync_error() {
    let r = router();
    let mut state = reduce_all(
        &r,
        [
            unconditional("a"),
            Action::register_conditional(FORM, "b", Conditional::truthy("a")),
            Action::new(
                FORM,
                ActionKind::RegisterValidation {
                    name: "b".into(),
                    validation: Some(vec![condform::ValidationRule::name("required")]),
                },
            ),
            Action::change(FORM, "a", json!(true)),
            Action::change(FORM, "b", json!("")),
        ],
    );
    assert!(form_state(&state).sync_error(&condform::Plain, "b").is_some());

    state = r.reduce(state, &Action::change(FORM, "a", json!(false)));
    assert_eq!(form_state(&state).sync_error(&condform::Plain, "b"), None);
    assert!(form_state(&state).valid(&condform::Plain));
}

#[test]
fn bracket_in_a_field_name_keeps_its_own_record() {
    // "a]b" and "ab" must land in distinct condition-table slots.
    let r = router();
    let mut state = reduce_all(
        &r,
        [
            unconditional("gate"),
            Action::register_conditional(FORM, "ab", Conditional::truthy("gate")),
            Action::register_conditional(FORM, "a]b", Conditional::truthy("gate")),
        ],
    );
    assert_eq!(form_state(&state).conditions.len(), 3);

    state = r.reduce(state, &Action::change(FORM, "gate", json!(true)));
    assert!(visible(&state, "ab"));
    assert!(visible(&state, "a]b"));

    state = r.reduce(state, &Action::change(FORM, "a]b", json!("x")));
    state = r.reduce(state, &Action::change(FORM, "gate", json!(false)));
    assert!(!visible(&state, "ab"));
    assert!(!visible(&state, "a]b"));
    assert_eq!(*form_values(&state), json!({"gate": false}));
}

#[test]
fn misdeclared_cycle_terminates() {
    let r = router();
    let mut state = reduce_all(
        &r,
        [
            Action::register_conditional(FORM, "a", Conditional::truthy("b")),
            Action::register_conditional(FORM, "b", Conditional::truthy("a")),
        ],
    );
    // Both fail closed; a change in either must settle, not recurse.
    state = r.reduce(state, &Action::change(FORM, "a", json!(true)));
    state = r.reduce(state, &Action::change(FORM, "b", json!(true)));
    assert!(state.contains_form(FORM));
}

#[test]
fn dependent_keyed_by_nested_name() {
    let r = router();
    let mut state = reduce_all(
        &r,
        [
            unconditional("opts.extra"),
            Action::register_conditional(FORM, "detail[0].note", Conditional::truthy("opts.extra")),
            Action::change(FORM, "opts.extra", json!(true)),
            Action::change(FORM, "detail[0].note", json!("n")),
        ],
    );
    assert_eq!(
        *form_values(&state),
        json!({"opts": {"extra": true}, "detail": [{"note": "n"}]})
    );

    state = r.reduce(state, &Action::change(FORM, "opts.extra", json!(false)));
    assert_eq!(*form_values(&state), json!({"opts": {"extra": false}}));
}
