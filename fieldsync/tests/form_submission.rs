use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex};

use fieldsync::prelude::*;

fn text_rules(list: Vec<Rule<FieldValue>>) -> Validator<FieldValue> {
    from_rules(list, Meta::new())
}

fn signup_validator() -> CombinedValidator<FormData> {
    combine_validators([
        (
            "email",
            text_rules(vec![
                rules::required("Email is required"),
                rules::email("Please enter a valid email"),
            ]),
        ),
        ("zip", text_rules(vec![rules::digits(5, "Zip must be 5 digits")])),
    ])
}

fn text_field(name: &str) -> Field<String> {
    Field::new(FieldConfig::new(name))
}

// ============================================================================
// Record ownership
// ============================================================================

#[test]
fn test_mounted_fields_report_into_record() {
    let form: Form = FormConfig::new("signup").combined(signup_validator()).build().unwrap();
    let email = text_field("email");
    email.mount(&form).unwrap();

    email.handle_change("ada@example.com".to_string()).unwrap();

    let data = form.field_values();
    assert_eq!(data.get("email"), Some(&FieldValue::from("ada@example.com")));
    assert_eq!(data.get("zip"), Some(&FieldValue::Null));
    assert_eq!(data.keys().collect::<Vec<_>>(), vec!["email", "zip"]);
}

#[test]
fn test_reset_is_reflected_in_record() {
    let form: Form = FormConfig::new("signup").combined(signup_validator()).build().unwrap();
    let zip = text_field("zip");
    zip.mount(&form).unwrap();
    zip.handle_change("123".to_string()).unwrap();

    zip.reset(None).unwrap();
    assert_eq!(form.field_values().get("zip"), Some(&FieldValue::from("")));
}

#[test]
fn test_record_serializes_in_declaration_order() {
    let form: Form = FormConfig::new("signup").combined(signup_validator()).build().unwrap();
    form.handle_value_change("zip", "12345");
    form.handle_value_change("email", "ada@example.com");

    let json = serde_json::to_string(&form.field_values()).unwrap();
    assert_eq!(json, r#"{"email":"ada@example.com","zip":"12345"}"#);

    let back: FormData = serde_json::from_str(&json).unwrap();
    assert_eq!(back, form.field_values());
}

// ============================================================================
// Submission
// ============================================================================

#[test]
fn test_submission_forces_visibility_on_pristine_field() {
    let form: Form = FormConfig::new("signup").combined(signup_validator()).build().unwrap();
    let email = text_field("email");
    let zip = text_field("zip");
    email.mount(&form).unwrap();
    zip.mount(&form).unwrap();
    assert!(!email.errors_visible());

    let failures = form.handle_submit(&mut SubmitEvent::new()).unwrap();

    assert_eq!(failures.len(), 2);
    assert!(!email.is_touched());
    assert!(email.errors_visible());
    assert_eq!(email.visible_errors()[0].reason, "Email is required");
    assert_eq!(zip.visible_errors()[0].reason, "Zip must be 5 digits");
}

#[test]
fn test_submission_clears_resolved_errors() {
    let form: Form = FormConfig::new("signup").combined(signup_validator()).build().unwrap();
    let email = text_field("email");
    let zip = text_field("zip");
    email.mount(&form).unwrap();
    zip.mount(&form).unwrap();

    zip.handle_change("123".to_string()).unwrap();
    form.handle_submit(&mut SubmitEvent::new()).unwrap();
    assert!(zip.has_visible_errors());

    zip.handle_change("12345".to_string()).unwrap();
    zip.set_errors(vec![ValidationFailure::new("stale".to_string(), Meta::new())])
        .unwrap();

    form.handle_submit(&mut SubmitEvent::new()).unwrap();
    assert!(zip.displayed_errors().is_empty());
    assert!(!zip.has_visible_errors());
    assert!(form.field_results()["zip"].is_empty());
    assert_eq!(form.field_results()["email"].len(), 1);
}

#[test]
fn test_data_submit_fires_whatever_the_validity() {
    let submitted = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&submitted);
    let form: Form = FormConfig::new("signup")
        .combined(signup_validator())
        .on_data_submit(move |failures: &[ValidationFailure], data: &FormData, event: &SubmitEvent| {
            assert!(!event.is_default_prevented());
            sink.lock().unwrap().push((failures.len(), data.clone()));
        })
        .build()
        .unwrap();

    form.handle_submit(&mut SubmitEvent::new()).unwrap();
    form.handle_value_change("email", "ada@example.com");
    form.handle_value_change("zip", "12345");
    let mut event = SubmitEvent::new();
    form.handle_submit(&mut event).unwrap();

    let submitted = submitted.lock().unwrap();
    assert_eq!(submitted.len(), 2);
    assert_eq!(submitted[0].0, 2);
    assert_eq!(submitted[1].0, 0);
    assert_eq!(submitted[1].1.get("zip"), Some(&FieldValue::from("12345")));
    assert!(event.is_default_prevented());
}

#[test]
fn test_form_validity_fires_only_on_submit_and_on_change() {
    let calls = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&calls);
    let form: Form = FormConfig::new("signup")
        .combined(signup_validator())
        .on_form_validity_change(move |failures: &[ValidationFailure]| {
            sink.lock().unwrap().push(failures.len());
        })
        .build()
        .unwrap();
    let zip = text_field("zip");
    zip.mount(&form).unwrap();

    zip.handle_change("1".to_string()).unwrap();
    assert!(calls.lock().unwrap().is_empty());

    form.handle_submit(&mut SubmitEvent::new()).unwrap();
    form.handle_submit(&mut SubmitEvent::new()).unwrap();
    assert_eq!(*calls.lock().unwrap(), vec![2]);

    zip.handle_change("12345".to_string()).unwrap();
    form.handle_submit(&mut SubmitEvent::new()).unwrap();
    assert_eq!(*calls.lock().unwrap(), vec![2, 1]);
}

#[test]
fn test_cross_field_failure_reaches_its_field() {
    let password: Validator<FieldValue> = text_rules(vec![rules::min_length(8, "Too short")]);
    let combined = combine_validators::<FormData, _, _, _, _>([("password", password), ("confirm", always_valid())]);
    let mismatch = Validator::new(|data: &FormData| {
        if data.get("password") == data.get("confirm") {
            Vec::new()
        } else {
            vec![ValidationFailure::new(
                "Passwords do not match".to_string(),
                Meta::new().with_field("confirm"),
            )]
        }
    });
    let form: Form = FormConfig::new("signup")
        .combined(combined)
        .validator(mismatch)
        .build()
        .unwrap();
    let password = text_field("password");
    let confirm = text_field("confirm");
    password.mount(&form).unwrap();
    confirm.mount(&form).unwrap();

    password.handle_change("correct horse".to_string()).unwrap();
    confirm.handle_change("battery staple".to_string()).unwrap();
    form.handle_submit(&mut SubmitEvent::new()).unwrap();

    assert!(password.visible_errors().is_empty());
    assert_eq!(confirm.visible_errors()[0].reason, "Passwords do not match");
    assert!(confirm.last_result().is_empty());
}

#[test]
fn test_focus_first_invalid_field() {
    let form: Form = FormConfig::new("signup")
        .combined(signup_validator())
        .focus_first_invalid()
        .build()
        .unwrap();
    let email = text_field("email");
    let zip = text_field("zip");
    email.mount(&form).unwrap();
    zip.mount(&form).unwrap();
    email.handle_change("ada@example.com".to_string()).unwrap();

    form.handle_submit(&mut SubmitEvent::new()).unwrap();
    assert!(!email.take_focus_request());
    assert!(zip.take_focus_request());
}

#[test]
fn test_field_mounted_after_submit_shows_errors() {
    let form: Form = FormConfig::new("signup").combined(signup_validator()).build().unwrap();
    form.handle_submit(&mut SubmitEvent::new()).unwrap();

    let zip: Field<String> = Field::new(
        FieldConfig::new("zip").validator(from_rules(vec![rules::digits(5, "Zip must be 5 digits")], Meta::new())),
    );
    zip.mount(&form).unwrap();
    assert!(zip.errors_visible());
    assert!(zip.has_visible_errors());
}

// ============================================================================
// Submission state
// ============================================================================

#[test]
fn test_duplicate_submit_rejected_until_completed() {
    let registry = FormRegistry::new();
    let submissions = Arc::new(Mutex::new(0));
    let counter = Arc::clone(&submissions);
    let form: Form = FormConfig::new("signup")
        .combined(signup_validator())
        .submit_mode(SubmitMode::AwaitCompletion)
        .on_data_submit(move |_: &[ValidationFailure], _: &FormData, _: &SubmitEvent| {
            *counter.lock().unwrap() += 1;
        })
        .build()
        .unwrap();
    form.mount(&registry).unwrap();

    form.handle_submit(&mut SubmitEvent::new()).unwrap();
    assert_eq!(
        form.handle_submit(&mut SubmitEvent::new()),
        Err(FormError::SubmitInProgress)
    );
    assert_eq!(*submissions.lock().unwrap(), 1);

    registry.get("signup").unwrap().submit_completed().unwrap();
    form.handle_submit(&mut SubmitEvent::new()).unwrap();
    assert_eq!(*submissions.lock().unwrap(), 2);
}

#[test]
fn test_immediate_mode_clears_submitting() {
    let form: Form = FormConfig::new("signup").build().unwrap();
    form.handle_submit(&mut SubmitEvent::new()).unwrap();
    form.handle_submit(&mut SubmitEvent::new()).unwrap();
    assert!(!form.is_submitting());
    assert!(form.was_submitted());
}

#[test]
fn test_panicking_cross_field_validator_does_not_leave_form_submitting() {
    for mode in [SubmitMode::Immediate, SubmitMode::AwaitCompletion] {
        let broken = Validator::new(|_: &FormData| -> Vec<ValidationFailure> { panic!("cross-field bug") });
        let form: Form = FormConfig::new("signup")
            .combined(signup_validator())
            .validator(broken)
            .submit_mode(mode)
            .build()
            .unwrap();

        let result = panic::catch_unwind(AssertUnwindSafe(|| form.handle_submit(&mut SubmitEvent::new())));
        assert!(result.is_err());
        assert!(!form.is_submitting());

        let again = panic::catch_unwind(AssertUnwindSafe(|| form.handle_submit(&mut SubmitEvent::new())));
        assert!(again.is_err());
        assert!(!form.is_submitting());
    }
}

#[test]
fn test_form_errors_through_handle() {
    let registry = FormRegistry::new();
    let form: Form = FormConfig::new("signup").build().unwrap();
    form.mount(&registry).unwrap();

    let handle = registry.get("signup").unwrap();
    handle
        .set_form_errors(vec![ValidationFailure::new("Server rejected".to_string(), Meta::new())])
        .unwrap();
    assert_eq!(form.form_errors()[0].reason, "Server rejected");
    assert_eq!(handle.form_errors(), form.form_errors());
}

// ============================================================================
// Render effect
// ============================================================================

#[test]
fn test_render_effect_reports_changes_with_first_flag() {
    let renders = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&renders);
    let form: Form = FormConfig::new("signup")
        .combined(signup_validator())
        .on_form_change(move |data: &FormData, first: bool| {
            sink.lock().unwrap().push((data.get("zip").cloned(), first));
        })
        .build()
        .unwrap();
    let zip = text_field("zip");
    zip.mount(&form).unwrap();

    form.on_render();
    form.on_render();
    zip.handle_change("1".to_string()).unwrap();
    form.on_render();
    zip.handle_blur().unwrap();
    form.on_render();

    assert_eq!(
        *renders.lock().unwrap(),
        vec![
            (Some(FieldValue::from("")), true),
            (Some(FieldValue::from("1")), false),
        ]
    );
}
