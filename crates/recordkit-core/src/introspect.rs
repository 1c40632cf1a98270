//! Type introspection over declared field types.
//!
//! A record declaration states each field's type as a [`TypeExpr`], the
//! counterpart of a type annotation (`int`, `List[Point]`,
//! `Optional[str]`, `Union[str, None]`). [`classify`] resolves such an
//! expression into the [`FieldKind`] the record engine works with, plus an
//! optional flag. Only three shapes are supported, each over a *bare* type
//! (a scalar or a nested record):
//!
//! - `T`
//! - `List[T]`
//! - `Optional[T]` (equivalently `Union[T, None]`)
//!
//! Everything else is rejected with [`RecordError::UnsupportedShape`].

use crate::errors::{RecordError, Result};
use crate::schema::{ElementKind, FieldDescriptor, FieldKind, TypeExpr};

/// Resolve a declared type into its field kind and whether it may be `Null`.
pub fn classify(expr: &TypeExpr) -> Result<(FieldKind, bool)> {
    match expr {
        TypeExpr::Scalar(_) | TypeExpr::Record(_) => Ok((bare_kind(expr, expr)?, false)),
        TypeExpr::List(_) => {
            let inner = inner_type_of_list(expr)?;
            Ok((FieldKind::List(element_kind(inner, expr)?), false))
        }
        TypeExpr::Optional(inner) => Ok((bare_kind(inner, expr)?, true)),
        TypeExpr::Union(arms) => {
            let non_null: Vec<&TypeExpr> = arms
                .iter()
                .filter(|arm| !matches!(arm, TypeExpr::NoneType))
                .collect();
            let has_null = non_null.len() != arms.len();
            match (arms.len(), non_null.as_slice()) {
                (1, [only]) => Ok((bare_kind(only, expr)?, false)),
                (2, [only]) if has_null => Ok((bare_kind(only, expr)?, true)),
                _ => Err(unsupported(
                    expr,
                    "unions with more than one arm besides None are not supported",
                )),
            }
        }
        TypeExpr::NoneType => Err(unsupported(expr, "a field cannot be declared as None only")),
    }
}

/// The single element type of a list type.
pub fn inner_type_of_list(expr: &TypeExpr) -> Result<&TypeExpr> {
    match expr {
        TypeExpr::List(args) => match args.as_slice() {
            [inner] => Ok(inner),
            [] => Err(unsupported(
                expr,
                "list needs exactly one item type, none given",
            )),
            _ => Err(unsupported(
                expr,
                "list needs exactly one item type, multiple given",
            )),
        },
        _ => Err(unsupported(expr, "expected a list type")),
    }
}

/// True if the field holds one nested record (not a list of them).
pub fn is_nested_record_field(descriptor: &FieldDescriptor) -> bool {
    matches!(descriptor.kind(), FieldKind::Record(_))
}

fn bare_kind(expr: &TypeExpr, context: &TypeExpr) -> Result<FieldKind> {
    match expr {
        TypeExpr::Scalar(kind) => Ok(FieldKind::Scalar(*kind)),
        TypeExpr::Record(schema) => Ok(FieldKind::Record(schema.clone())),
        _ => Err(unsupported(
            context,
            format!("nested type `{}` is not allowed here", expr),
        )),
    }
}

fn element_kind(expr: &TypeExpr, context: &TypeExpr) -> Result<ElementKind> {
    match bare_kind(expr, context)? {
        FieldKind::Scalar(kind) => Ok(ElementKind::Scalar(kind)),
        FieldKind::Record(schema) => Ok(ElementKind::Record(schema)),
        FieldKind::List(_) => Err(unsupported(context, "lists of lists are not supported")),
    }
}

fn unsupported(expr: &TypeExpr, reason: impl Into<String>) -> RecordError {
    RecordError::UnsupportedShape {
        shape: expr.to_string(),
        reason: reason.into(),
    }
}
