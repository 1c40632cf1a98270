use std::sync::Arc;

use recordkit_core::{fields, Record, RecordSchema, TypeExpr, Value};

/// `Point { x: int, y: int }`, identified by `y`
#[allow(dead_code)]
pub fn point_schema() -> Arc<RecordSchema> {
    RecordSchema::builder("Point")
        .field("x", TypeExpr::int())
        .field("y", TypeExpr::int())
        .identify_by_field("y")
        .build()
        .unwrap()
}

/// `Line { a: Point, b: Point }`, identified by both end points
#[allow(dead_code)]
pub fn line_schema() -> Arc<RecordSchema> {
    let point = point_schema();
    RecordSchema::builder("Line")
        .field("a", TypeExpr::record(&point))
        .field("b", TypeExpr::record(&point))
        .identify_by_fields(["a__y", "b__y"])
        .build()
        .unwrap()
}

/// `Polygon { id: int, name: Optional[str], corners: List[Point], tags: List[str] }`
#[allow(dead_code)]
pub fn polygon_schema() -> Arc<RecordSchema> {
    let point = point_schema();
    RecordSchema::builder("Polygon")
        .field("id", TypeExpr::int())
        .field("name", TypeExpr::optional(TypeExpr::str()))
        .field("corners", TypeExpr::list(TypeExpr::record(&point)))
        .field("tags", TypeExpr::list(TypeExpr::str()))
        .identify_by_field("id")
        .build()
        .unwrap()
}

#[allow(dead_code)]
pub fn point(x: i64, y: i64) -> Record {
    Record::create_from_flat(&point_schema(), fields! { "x" => x, "y" => y }).unwrap()
}

#[allow(dead_code)]
pub fn line(ax: i64, ay: i64, bx: i64, by: i64) -> Record {
    Record::create_from_flat(
        &line_schema(),
        fields! { "a__x" => ax, "a__y" => ay, "b__x" => bx, "b__y" => by },
    )
    .unwrap()
}

/// Polygon with the given corners as `(x, y)` pairs
#[allow(dead_code)]
pub fn polygon(id: i64, name: Option<&str>, corners: &[(i64, i64)]) -> Record {
    let corners: Vec<Value> = corners
        .iter()
        .map(|(x, y)| Value::Map(fields! { "x" => *x, "y" => *y }))
        .collect();
    Record::create_from_flat(
        &polygon_schema(),
        fields! {
            "id" => id,
            "name" => name,
            "corners" => corners,
            "tags" => Vec::<Value>::new(),
        },
    )
    .unwrap()
}
