mod common;

use common::{line_schema, point, point_schema, polygon, polygon_schema};
use recordkit_core::{
    fields, DiffOptions, IdentityRule, Record, RecordError, RecordSchema, TypeExpr, Value,
};
use serde_json::json;

// ===== SCHEMA DECLARATION TESTS =====

#[test]
fn test_declaration_rejects_optional_union() {
    let result = RecordSchema::builder("Broken")
        .field("id", TypeExpr::int())
        .field(
            "value",
            TypeExpr::optional(TypeExpr::union(vec![TypeExpr::int(), TypeExpr::str()])),
        )
        .identify_by_field("id")
        .build();

    assert!(matches!(
        result,
        Err(RecordError::Schema { ref field, .. }) if field == "value"
    ));
}

#[test]
fn test_declaration_rejects_list_of_lists() {
    let result = RecordSchema::builder("Matrix")
        .field("rows", TypeExpr::list(TypeExpr::list(TypeExpr::int())))
        .identify_by(IdentityRule::custom(|_| Value::Null))
        .build();

    let err = result.unwrap_err();
    assert!(matches!(err, RecordError::Schema { ref field, .. } if field == "rows"));
    assert!(err.to_string().contains("List[List[int]]"));
}

#[test]
fn test_declaration_accepts_union_with_none() {
    let schema = RecordSchema::builder("Named")
        .field("id", TypeExpr::int())
        .field(
            "name",
            TypeExpr::union(vec![TypeExpr::str(), TypeExpr::NoneType]),
        )
        .identify_by_field("id")
        .build()
        .unwrap();

    assert!(schema.field("name").unwrap().is_optional());
}

// ===== CONSTRUCTION TESTS =====

#[test]
fn test_create_point_from_flat_map() {
    let p = Record::create_from_flat(&point_schema(), fields! { "x" => 1, "y" => 2 }).unwrap();

    assert_eq!(p.type_name(), "Point");
    assert_eq!(p.get("x").unwrap(), Value::Int(1));
    assert_eq!(p.get("y").unwrap(), Value::Int(2));
    assert_eq!(p.unique_identification(), Value::Int(2));
}

#[test]
fn test_create_fails_on_missing_field() {
    let result = Record::create_from_flat(&point_schema(), fields! { "x" => 1 });

    assert!(matches!(
        result,
        Err(RecordError::MissingField { ref field, .. }) if field == "y"
    ));
}

#[test]
fn test_create_fails_on_unknown_field() {
    let result = Record::create_from_flat(
        &point_schema(),
        fields! { "x" => 1, "y" => 2, "z" => 3 },
    );

    assert!(matches!(result, Err(RecordError::UnknownField { .. })));
}

#[test]
fn test_create_fails_on_unknown_nested_field() {
    let result = Record::create_from_flat(
        &line_schema(),
        fields! { "a__x" => 1, "a__y" => 2, "a__z" => 0, "b__x" => 3, "b__y" => 4 },
    );

    assert!(matches!(
        result,
        Err(RecordError::UnknownField { ref record, ref field }) if record == "Point" && field == "z"
    ));
}

#[test]
fn test_line_flat_and_nested_construction_agree() {
    let schema = line_schema();
    let flat = Record::create_from_flat(
        &schema,
        fields! { "a__x" => 1, "a__y" => 2, "b__x" => 3, "b__y" => 4 },
    )
    .unwrap();

    let nested = Record::create_from_flat(
        &schema,
        fields! {
            "a" => fields! { "x" => 1, "y" => 2 },
            "b" => fields! { "x" => 3, "y" => 4 },
        },
    )
    .unwrap();

    assert_eq!(flat, nested);
    assert!(flat.diff(&nested, &DiffOptions::strict()).unwrap().is_empty());
}

#[test]
fn test_nested_value_may_be_a_record() {
    let a = point(1, 2);
    let line = Record::create_from_flat(
        &line_schema(),
        fields! { "a" => a.clone(), "b__x" => 3, "b__y" => 4 },
    )
    .unwrap();

    let stored = line.get("a").unwrap();
    assert!(stored.as_record().unwrap().ptr_eq(&a));
}

#[test]
fn test_nested_value_of_wrong_type_is_rejected() {
    let wrong = polygon(1, None, &[]);
    let result = Record::create_from_flat(
        &line_schema(),
        fields! { "a" => wrong, "b__x" => 3, "b__y" => 4 },
    );

    assert!(matches!(result, Err(RecordError::TypeMismatch { .. })));
}

#[test]
fn test_nested_value_of_same_named_foreign_type_is_rejected() {
    let foreign = RecordSchema::builder("Point")
        .field("label", TypeExpr::str())
        .identify_by_field("label")
        .build()
        .unwrap();
    let impostor = Record::create_from_flat(&foreign, fields! { "label" => "a" }).unwrap();

    let result = Record::create_from_flat(
        &line_schema(),
        fields! { "a" => impostor, "b__x" => 3, "b__y" => 4 },
    );

    assert!(matches!(result, Err(RecordError::TypeMismatch { .. })));
}

#[test]
fn test_create_from_json_input() {
    let input = recordkit_core::value::field_map_from_json(json!({
        "id": 7,
        "name": null,
        "corners": [{"x": 0, "y": 0}, {"x": 1, "y": 1}],
        "tags": ["closed"]
    }));

    let polygon = Record::create_from_flat(&polygon_schema(), input).unwrap();

    assert!(polygon.get("name").unwrap().is_null());
    let corners = polygon.get("corners").unwrap();
    assert_eq!(corners.as_list().unwrap().len(), 2);
    assert_eq!(
        polygon.get("tags").unwrap(),
        Value::List(vec![Value::from("closed")])
    );
}

#[test]
fn test_null_rejected_for_non_optional_field() {
    let result = Record::create_from_flat(
        &point_schema(),
        fields! { "x" => Value::Null, "y" => 2 },
    );

    assert!(matches!(
        result,
        Err(RecordError::TypeMismatch { ref field, .. }) if field == "x"
    ));
}

#[test]
fn test_list_of_scalars_checks_item_kind() {
    let result = Record::create_from_flat(
        &polygon_schema(),
        fields! {
            "id" => 1,
            "name" => Value::Null,
            "corners" => Vec::<Value>::new(),
            "tags" => vec![Value::from("a"), Value::from(3)],
        },
    );

    assert!(matches!(
        result,
        Err(RecordError::TypeMismatch { ref field, .. }) if field == "tags"
    ));
}

#[test]
fn test_undefined_whole_list_field_is_kept() {
    let polygon = Record::create_from_flat(
        &polygon_schema(),
        fields! {
            "id" => 1,
            "name" => Value::Undefined,
            "corners" => Value::Undefined,
            "tags" => Value::Undefined,
        },
    )
    .unwrap();

    assert!(polygon.get("corners").unwrap().is_undefined());
    assert!(!polygon.all_fields_sentinel());
}

// ===== ALL-SENTINEL TESTS =====

#[test]
fn test_all_sentinel_record_reports_all_fields_sentinel() {
    for nested in [true, false] {
        let line = Record::create_all_sentinel(&line_schema(), nested).unwrap();
        assert!(line.all_fields_sentinel());
    }
}

#[test]
fn test_all_sentinel_record_has_undefined_identity() {
    let line = Record::create_all_sentinel(&line_schema(), true).unwrap();

    assert_eq!(
        line.unique_identification(),
        Value::List(vec![Value::Undefined, Value::Undefined])
    );
}

#[test]
fn test_field_paths_cover_nested_records() {
    let schema = line_schema();

    assert_eq!(
        schema.field_paths(None, true, &[]).unwrap(),
        vec!["a__x", "a__y", "b__x", "b__y"]
    );
    assert_eq!(
        schema.field_paths(Some("b"), true, &["x"]).unwrap(),
        vec!["b__y"]
    );
}
