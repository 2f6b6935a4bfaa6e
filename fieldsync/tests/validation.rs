use std::sync::Arc;

use fieldsync::prelude::*;
use fieldsync::validation::FailureMeta;

fn reasons<T: ?Sized>(validator: &Validator<T>, value: &T) -> Vec<String> {
    validator.validate(value).into_iter().map(|f| f.reason).collect()
}

fn zip_rules() -> Validator<str> {
    from_rules(
        vec![rules::required("Zip is required"), rules::digits(5, "Zip must be 5 digits")],
        Meta::new(),
    )
}

// ============================================================================
// Rule evaluation
// ============================================================================

#[test]
fn test_validator_is_idempotent() {
    let zip = zip_rules();
    assert_eq!(zip.validate("12"), zip.validate("12"));
    assert_eq!(zip.validate(""), zip.validate(""));
}

#[test]
fn test_only_failing_rule_is_reported() {
    let validator: Validator<str> = from_rules(
        vec![
            Rule::new(|v: &str| v.starts_with('a'), "R1".to_string()),
            Rule::new(|_: &str| true, "R2".to_string()),
        ],
        Meta::new(),
    );
    assert_eq!(reasons(&validator, "bcd"), vec!["R1"]);
}

#[test]
fn test_no_short_circuit() {
    let validator: Validator<str> = from_rules(
        vec![
            Rule::new(|_: &str| false, "R1".to_string()),
            Rule::new(|_: &str| false, "R2".to_string()),
        ],
        Meta::new(),
    );
    assert_eq!(reasons(&validator, "x"), vec!["R1", "R2"]);
}

#[test]
fn test_empty_rule_list_accepts_everything() {
    let validator: Validator<str> = from_rules(Vec::new(), Meta::new());
    assert!(validator.validate("anything").is_empty());
}

#[test]
fn test_duplicate_reasons_are_kept() {
    let validator: Validator<str> = from_rules(
        vec![rules::min_length(3, "Too short"), rules::digits(3, "Too short")],
        Meta::new(),
    );
    assert_eq!(reasons(&validator, "a"), vec!["Too short", "Too short"]);
}

// ============================================================================
// Predicate faults
// ============================================================================

#[test]
fn test_panicking_predicate_becomes_faulted_failure() {
    let validator: Validator<str> = from_rules(
        vec![
            Rule::new(|_: &str| -> bool { panic!("boom") }, "Broken rule".to_string()),
            rules::required("Required"),
        ],
        Meta::new(),
    );

    let failures = validator.validate("");
    assert_eq!(failures.len(), 2);
    assert_eq!(failures[0].reason, "Broken rule");
    assert_eq!(failures[0].error, Some(RuleFault::Panic("boom".to_string())));
    assert!(!failures[1].is_fault());
}

#[test]
fn test_erroring_predicate_becomes_faulted_failure() {
    let validator: Validator<str> = from_rules(
        vec![Rule::fallible(
            |v: &str| v.parse::<u32>().map(|n| n > 10),
            "Must be above 10".to_string(),
        )],
        Meta::new(),
    );

    assert!(validator.validate("42").is_empty());
    assert_eq!(reasons(&validator, "3"), vec!["Must be above 10"]);

    let failures = validator.validate("abc");
    assert!(matches!(failures[0].error, Some(RuleFault::Error(_))));
}

// ============================================================================
// Composition
// ============================================================================

#[test]
fn test_compose_keeps_call_order() {
    let first: Validator<str> = from_rules(vec![Rule::new(|_: &str| false, "A".to_string())], Meta::new());
    let second: Validator<str> = from_rules(vec![Rule::new(|_: &str| false, "B".to_string())], Meta::new());

    let composed = compose_validators([second.clone(), first.clone()]);
    assert_eq!(reasons(&composed, ""), vec!["B", "A"]);
    assert_eq!(reasons(&first.and(&second), ""), vec!["A", "B"]);
}

#[test]
fn test_shared_meta_merges_with_rule_meta() {
    let validator: Validator<str> = from_rules(
        vec![
            rules::required("Required").with_meta(Meta::new().with_label("Zip code")),
            rules::digits(5, "Format"),
        ],
        Meta::new().with_label("Zip").with_extra("hint", "5 digits"),
    );

    let failures = validator.validate("");
    assert_eq!(failures[0].meta.label.as_deref(), Some("Zip code"));
    assert_eq!(failures[1].meta.label.as_deref(), Some("Zip"));
    assert_eq!(failures[0].meta.extra.get("hint").map(String::as_str), Some("5 digits"));
}

// ============================================================================
// Record validation
// ============================================================================

#[test]
fn test_combine_stamps_keys_and_stays_addressable() {
    let va: Validator<FieldValue> = from_rules(vec![rules::equals("ok", "a is wrong")], Meta::new());
    let vb: Validator<FieldValue> = from_rules(vec![rules::required("b is required")], Meta::new());
    let combined = combine_validators::<FormData, _, _, _, _>([("a", va), ("b", vb)]);

    let record = FormData::new().with("a", "x").with("b", "y");
    let failures = combined.validate(&record);
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].field(), Some("a"));

    let a_alone = combined.field("a").unwrap();
    let b_alone = combined.field("b").unwrap();
    assert_eq!(a_alone.validate(&FieldValue::from("x")).len(), 1);
    assert!(b_alone.validate(&FieldValue::from("y")).is_empty());
    assert_eq!(b_alone.validate(&FieldValue::Null).len(), 1);
}

#[test]
fn test_combine_validates_absent_keys() {
    let name: Validator<FieldValue> = from_rules(vec![rules::required("Name is required")], Meta::new());
    let combined = combine_validators::<FormData, _, _, _, _>([("name", name)]);

    let failures = combined.validate(&FormData::new());
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].meta.field.as_deref(), Some("name"));
}

#[test]
fn test_field_level_meta_wins() {
    let confirm: Validator<FieldValue> = from_rules(
        vec![rules::required("Confirm your password")],
        Meta::new().with_field("password_confirmation"),
    );
    let combined = combine_validators::<FormData, _, _, _, _>([("confirm", confirm)]);

    let failures = combined.validate(&FormData::new());
    assert_eq!(failures[0].field(), Some("password_confirmation"));
}

#[test]
fn test_cross_field_rule_after_per_key_failures() {
    let password: Validator<FieldValue> = from_rules(vec![rules::min_length(8, "Too short")], Meta::new());
    let confirm: Validator<FieldValue> = always_valid();
    let combined = combine_validators::<FormData, _, _, _, _>([("password", password), ("confirm", confirm)]);

    let mismatch = Validator::new(|data: &FormData| {
        if data.get("password") == data.get("confirm") {
            Vec::new()
        } else {
            vec![ValidationFailure::new(
                "Passwords do not match".to_string(),
                Meta::new().stamp_field("confirm"),
            )]
        }
    });
    let full = combined.with_cross_field(mismatch);

    let data = FormData::new().with("password", "short").with("confirm", "other");
    let fields: Vec<_> = full
        .validate(&data)
        .iter()
        .map(|f| f.field().map(str::to_string))
        .collect();
    assert_eq!(fields, vec![Some("password".into()), Some("confirm".into())]);
}

#[test]
fn test_combine_over_plain_maps() {
    use std::collections::BTreeMap;

    let age: Validator<String> = from_rules(vec![rules::digits(2, "Two digits")], Meta::new());
    let combined = combine_validators::<BTreeMap<String, String>, _, _, _, _>([("age", age)]);

    let mut record = BTreeMap::new();
    record.insert("age".to_string(), "7".to_string());
    assert_eq!(combined.validate(&record).len(), 1);

    record.insert("age".to_string(), "42".to_string());
    assert!(combined.validate(&record).is_empty());
}

#[test]
fn test_validators_are_shareable_across_threads() {
    let zip = Arc::new(zip_rules());
    let worker = Arc::clone(&zip);
    let result = std::thread::spawn(move || worker.validate("123").len())
        .join()
        .unwrap();
    assert_eq!(result, 1);
}
