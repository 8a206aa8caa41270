use super::*;
use serde_json::json;

fn fields(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        other => panic!("expected object, got {other}"),
    }
}

fn apply(config: &mut MowConfig, value: Value) -> DispatchReport {
    let mut report = DispatchReport::default();
    apply_mow_parameters(config, &fields(value), &mut report);
    report
}

#[test]
fn float_coercion_accepts_numbers_and_numeric_strings() {
    assert_eq!(coerce_float(&json!(0.5)), Ok(0.5));
    assert_eq!(coerce_float(&json!("0.25")), Ok(0.25));
    assert_eq!(coerce_float(&json!(1)), Ok(1.0));
    assert!(coerce_float(&json!("wide")).is_err());
    assert!(coerce_float(&json!(true)).is_err());
}

#[test]
fn int_coercion_truncates_numbers_but_not_strings() {
    assert_eq!(coerce_int(&json!(45)), Ok(45));
    assert_eq!(coerce_int(&json!(45.0)), Ok(45));
    assert_eq!(coerce_int(&json!(45.7)), Ok(45));
    assert_eq!(coerce_int(&json!(-2.9)), Ok(-2));
    assert_eq!(coerce_int(&json!(" 3 ")), Ok(3));
    assert!(coerce_int(&json!("2.5")).is_err());
    assert!(coerce_int(&json!(null)).is_err());
}

#[test]
fn fractional_integer_fields_commit_truncated() {
    let mut config = MowConfig::default();
    let report = apply(
        &mut config,
        json!({ "angle": 45.7, "mowborder": 2.9, "distancetoborder": 0.5 }),
    );
    assert_eq!(config.angle(), 45);
    assert_eq!(config.border_passes(), 2);
    assert_eq!(config.distance_to_border(), MowConfig::default().distance_to_border());

    let rejected: Vec<_> = report
        .rejections
        .iter()
        .filter_map(|rejection| rejection.field.as_deref())
        .collect();
    assert_eq!(rejected, vec!["distancetoborder"]);
    assert_eq!(report.applied, vec!["angle=45", "mowborder=2"]);
}

#[test]
fn bool_coercion_only_takes_booleans() {
    assert_eq!(coerce_bool(&json!(false)), Ok(false));
    assert!(coerce_bool(&json!("false")).is_err());
    assert!(coerce_bool(&json!("yes")).is_err());
    assert!(coerce_bool(&json!(1)).is_err());
}

#[test]
fn out_of_range_width_is_rejected_and_kept() {
    let mut config = MowConfig::default();
    let report = apply(&mut config, json!({ "width": 1.5 }));
    assert_eq!(config.width(), MowConfig::default().width());
    assert_eq!(report.rejections.len(), 1);
    assert_eq!(report.rejections[0].field.as_deref(), Some("width"));
    assert_eq!(report.rejections[0].kind, RejectionKind::InvalidField);
    assert!(report.applied.is_empty());
}

#[test]
fn valid_fields_commit_even_when_siblings_fail() {
    let mut config = MowConfig::default();
    let report = apply(
        &mut config,
        json!({
            "pattern": "spirals",
            "width": "0.3",
            "angle": 400,
            "distancetoborder": 2,
            "mowarea": "no",
            "mowborder": 3,
            "mowexclusion": false,
            "mowborderccw": true
        }),
    );

    assert_eq!(config.pattern(), MowPattern::Lines);
    assert_eq!(config.width(), 0.3);
    assert_eq!(config.angle(), MowConfig::default().angle());
    assert_eq!(config.distance_to_border(), 2);
    assert!(config.mow_area());
    assert_eq!(config.border_passes(), 3);
    assert!(!config.mow_exclusion());
    assert!(config.mow_border_ccw());

    let rejected: Vec<_> = report
        .rejections
        .iter()
        .filter_map(|rejection| rejection.field.as_deref())
        .collect();
    assert_eq!(rejected, vec!["pattern", "angle", "mowarea"]);
    assert_eq!(report.applied.len(), 5);
    assert_eq!(report.rejections[0].allowed, vec!["lines", "squares", "rings"]);
}

#[test]
fn unknown_and_absent_fields_are_left_alone() {
    let mut config = MowConfig::default();
    let report = apply(&mut config, json!({ "speed": 3, "Width": 0.5 }));
    assert_eq!(config, MowConfig::default());
    assert!(report.applied.is_empty());
    assert!(report.is_clean());
}

#[test]
fn applying_the_same_message_twice_is_idempotent() {
    let message = json!({ "pattern": "squares", "width": 0.4, "angle": 30, "mowexclusion": false });
    let mut once = MowConfig::default();
    apply(&mut once, message.clone());
    let mut twice = MowConfig::default();
    apply(&mut twice, message.clone());
    apply(&mut twice, message);
    assert_eq!(once, twice);
}
