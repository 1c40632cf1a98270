//! Record type declarations.
//!
//! A [`RecordSchema`] is declared once through [`RecordSchema::builder`],
//! validated at `build()` time and shared as `Arc<RecordSchema>` by every
//! record of that type. Nested record fields hold the `Arc` of their own
//! schema, so a schema tree is built bottom-up and can never be cyclic.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use crate::errors::{RecordError, Result};
use crate::field_path::{self, SEPARATOR};
use crate::introspect;
use crate::record::Record;
use crate::value::Value;

/// Scalar field types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarKind {
    Bool,
    Int,
    Float,
    Str,
    /// Any scalar value
    Any,
}

impl ScalarKind {
    pub fn name(&self) -> &'static str {
        match self {
            ScalarKind::Bool => "bool",
            ScalarKind::Int => "int",
            ScalarKind::Float => "float",
            ScalarKind::Str => "str",
            ScalarKind::Any => "any",
        }
    }

    /// Exact runtime type match (an int is not a float).
    pub fn accepts(&self, value: &Value) -> bool {
        match self {
            ScalarKind::Bool => matches!(value, Value::Bool(_)),
            ScalarKind::Int => matches!(value, Value::Int(_)),
            ScalarKind::Float => matches!(value, Value::Float(_)),
            ScalarKind::Str => matches!(value, Value::Str(_)),
            ScalarKind::Any => value.is_scalar(),
        }
    }
}

/// A declared field type, as written in the record declaration.
#[derive(Debug, Clone)]
pub enum TypeExpr {
    Scalar(ScalarKind),
    Record(Arc<RecordSchema>),
    /// `List[...]`; well-formed lists carry exactly one argument
    List(Vec<TypeExpr>),
    Optional(Box<TypeExpr>),
    Union(Vec<TypeExpr>),
    NoneType,
}

impl TypeExpr {
    pub fn bool() -> Self {
        TypeExpr::Scalar(ScalarKind::Bool)
    }

    pub fn int() -> Self {
        TypeExpr::Scalar(ScalarKind::Int)
    }

    pub fn float() -> Self {
        TypeExpr::Scalar(ScalarKind::Float)
    }

    pub fn str() -> Self {
        TypeExpr::Scalar(ScalarKind::Str)
    }

    pub fn any() -> Self {
        TypeExpr::Scalar(ScalarKind::Any)
    }

    pub fn record(schema: &Arc<RecordSchema>) -> Self {
        TypeExpr::Record(Arc::clone(schema))
    }

    pub fn list(inner: TypeExpr) -> Self {
        TypeExpr::List(vec![inner])
    }

    pub fn optional(inner: TypeExpr) -> Self {
        TypeExpr::Optional(Box::new(inner))
    }

    pub fn union(arms: Vec<TypeExpr>) -> Self {
        TypeExpr::Union(arms)
    }
}

impl fmt::Display for TypeExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn write_args(f: &mut fmt::Formatter<'_>, args: &[TypeExpr]) -> fmt::Result {
            for (idx, arg) in args.iter().enumerate() {
                if idx > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}", arg)?;
            }
            Ok(())
        }

        match self {
            TypeExpr::Scalar(kind) => write!(f, "{}", kind.name()),
            TypeExpr::Record(schema) => write!(f, "{}", schema.name()),
            TypeExpr::List(args) => {
                write!(f, "List[")?;
                write_args(f, args)?;
                write!(f, "]")
            }
            TypeExpr::Optional(inner) => write!(f, "Optional[{}]", inner),
            TypeExpr::Union(arms) => {
                write!(f, "Union[")?;
                write_args(f, arms)?;
                write!(f, "]")
            }
            TypeExpr::NoneType => write!(f, "None"),
        }
    }
}

/// Element type of a list field.
#[derive(Debug, Clone)]
pub enum ElementKind {
    Scalar(ScalarKind),
    Record(Arc<RecordSchema>),
}

/// Resolved kind of a field.
#[derive(Debug, Clone)]
pub enum FieldKind {
    Scalar(ScalarKind),
    Record(Arc<RecordSchema>),
    List(ElementKind),
}

/// One field of a record schema.
#[derive(Debug, Clone)]
pub struct FieldDescriptor {
    name: String,
    declared: TypeExpr,
    kind: FieldKind,
    optional: bool,
}

impl FieldDescriptor {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The type as it was declared
    pub fn declared_type(&self) -> &TypeExpr {
        &self.declared
    }

    pub fn kind(&self) -> &FieldKind {
        &self.kind
    }

    pub fn is_optional(&self) -> bool {
        self.optional
    }

    pub fn is_list(&self) -> bool {
        matches!(self.kind, FieldKind::List(_))
    }

    /// Schema of a nested-record field (not of a list element)
    pub fn nested_schema(&self) -> Option<&Arc<RecordSchema>> {
        match &self.kind {
            FieldKind::Record(schema) => Some(schema),
            _ => None,
        }
    }

    fn same_shape(&self, other: &FieldDescriptor) -> bool {
        self.name == other.name
            && self.optional == other.optional
            && match (&self.kind, &other.kind) {
                (FieldKind::Scalar(a), FieldKind::Scalar(b)) => a == b,
                (FieldKind::Record(a), FieldKind::Record(b)) => a.is_same_type(b),
                (FieldKind::List(a), FieldKind::List(b)) => a.same_shape(b),
                _ => false,
            }
    }
}

impl ElementKind {
    fn same_shape(&self, other: &ElementKind) -> bool {
        match (self, other) {
            (ElementKind::Scalar(a), ElementKind::Scalar(b)) => a == b,
            (ElementKind::Record(a), ElementKind::Record(b)) => a.is_same_type(b),
            _ => false,
        }
    }
}

/// How a record type derives its unique identification.
#[derive(Clone)]
pub enum IdentityRule {
    /// Value of one field path
    Field(String),
    /// List of the values of several field paths
    Fields(Vec<String>),
    /// Caller-defined accessor
    Custom(Arc<dyn Fn(&Record) -> Value + Send + Sync>),
}

impl IdentityRule {
    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(&Record) -> Value + Send + Sync + 'static,
    {
        IdentityRule::Custom(Arc::new(f))
    }

    fn paths(&self) -> &[String] {
        match self {
            IdentityRule::Field(path) => std::slice::from_ref(path),
            IdentityRule::Fields(paths) => paths,
            IdentityRule::Custom(_) => &[],
        }
    }
}

impl fmt::Debug for IdentityRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdentityRule::Field(path) => f.debug_tuple("Field").field(path).finish(),
            IdentityRule::Fields(paths) => f.debug_tuple("Fields").field(paths).finish(),
            IdentityRule::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// Declaration options of a record type.
///
/// `frozen` makes every mutation fail, `repr` controls whether `Display`
/// lists field values, and `eq` switches record equality between value
/// comparison and handle identity. The other flags are kept as declaration
/// metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordOptions {
    pub init: bool,
    pub repr: bool,
    pub eq: bool,
    pub order: bool,
    pub hash: bool,
    pub frozen: bool,
    pub kw_only: bool,
    pub slots: bool,
}

impl Default for RecordOptions {
    fn default() -> Self {
        Self {
            init: true,
            repr: true,
            eq: true,
            order: false,
            hash: false,
            frozen: false,
            kw_only: false,
            slots: false,
        }
    }
}

/// A field as written in a declaration, before validation.
#[derive(Debug, Clone)]
pub struct FieldDecl {
    name: String,
    ty: TypeExpr,
    default: Option<Value>,
}

impl FieldDecl {
    pub fn new(name: impl Into<String>, ty: TypeExpr) -> Self {
        Self {
            name: name.into(),
            ty,
            default: None,
        }
    }

    /// Attach a default value. Declarations reject defaults; this exists so
    /// that the rejection is reported with the field name.
    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }
}

/// The schema of a record type.
pub struct RecordSchema {
    name: String,
    fields: Vec<FieldDescriptor>,
    identity: IdentityRule,
    options: RecordOptions,
}

impl fmt::Debug for RecordSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fields: Vec<String> = self
            .fields
            .iter()
            .map(|d| format!("{}: {}", d.name, d.declared))
            .collect();
        f.debug_struct("RecordSchema")
            .field("name", &self.name)
            .field("fields", &fields)
            .field("identity", &self.identity)
            .field("options", &self.options)
            .finish()
    }
}

impl RecordSchema {
    /// Start declaring a record type
    pub fn builder(name: impl Into<String>) -> RecordSchemaBuilder {
        RecordSchemaBuilder {
            name: name.into(),
            fields: Vec::new(),
            identity: None,
            options: RecordOptions::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Fields in declaration order
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.name.as_str()).collect()
    }

    pub fn identity(&self) -> &IdentityRule {
        &self.identity
    }

    pub fn options(&self) -> &RecordOptions {
        &self.options
    }

    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    /// Direct field by name
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Two schemas describe the same record type if they are the same
    /// declaration, or carry the same type name and declare the same fields
    /// (name, kind and optionality) in the same order.
    pub fn is_same_type(&self, other: &RecordSchema) -> bool {
        if std::ptr::eq(self, other) {
            return true;
        }
        self.name == other.name
            && self.fields.len() == other.fields.len()
            && self
                .fields
                .iter()
                .zip(other.fields.iter())
                .all(|(a, b)| a.same_shape(b))
    }

    /// Resolve a field path to its descriptor, walking nested record schemas.
    ///
    /// # Errors
    /// * `PathResolution` - a segment is absent, or a non-terminal segment is
    ///   not a nested-record field
    pub fn resolve_field(&self, path: &str) -> Result<&FieldDescriptor> {
        let (head, rest) = field_path::split_first(path);
        let field = self.field(head).ok_or_else(|| {
            RecordError::path_resolution(
                &self.name,
                path,
                format!("can not find a field `{}`", head),
            )
        })?;
        match (rest, field.kind()) {
            (None, _) => Ok(field),
            (Some(rest), FieldKind::Record(sub)) => sub.resolve_field(rest),
            (Some(_), _) => Err(RecordError::path_resolution(
                &self.name,
                path,
                format!("the field `{}` does not reference a nested record", head),
            )),
        }
    }

    /// List field paths of this schema.
    ///
    /// # Arguments
    /// * `subkey` - only paths below this field path are returned
    /// * `nested` - descend into nested-record fields instead of listing them
    ///   as one path
    /// * `except` - paths to leave out, relative to `subkey` when given
    ///
    /// # Errors
    /// * `PathResolution` - unknown subkey, or an `except` path that is not
    ///   part of the result
    pub fn field_paths(
        &self,
        subkey: Option<&str>,
        nested: bool,
        except: &[&str],
    ) -> Result<Vec<String>> {
        let (first, rest) = match subkey {
            Some(key) => {
                let (head, rest) = field_path::split_first(key);
                (Some(head), rest)
            }
            None => (None, None),
        };

        if let Some(first) = first {
            if self.field(first).is_none() {
                return Err(RecordError::path_resolution(
                    &self.name,
                    subkey.unwrap_or_default(),
                    format!("no field with subkey `{}` exists", first),
                ));
            }
        }

        let except_abs: Vec<String> = except
            .iter()
            .map(|e| match subkey {
                Some(key) => format!("{}{}{}", key, SEPARATOR, e),
                None => (*e).to_string(),
            })
            .collect();

        let mut all = Vec::new();
        for field in &self.fields {
            if first.is_some_and(|f| f != field.name) {
                continue;
            }
            match (nested, &field.kind) {
                (true, FieldKind::Record(sub)) => {
                    let sub_paths = sub.field_paths(rest, true, &[])?;
                    if sub_paths.is_empty() {
                        all.push(field.name.clone());
                    }
                    for sub_path in sub_paths {
                        all.push(format!("{}{}{}", field.name, SEPARATOR, sub_path));
                    }
                }
                _ => all.push(field.name.clone()),
            }
        }

        if let Some(missing) = except_abs.iter().find(|e| !all.contains(e)) {
            return Err(RecordError::path_resolution(
                &self.name,
                missing,
                format!("can not find except field among {:?}", all),
            ));
        }

        Ok(all
            .into_iter()
            .filter(|p| !except_abs.contains(p))
            .collect())
    }
}

/// Builder for a [`RecordSchema`]
pub struct RecordSchemaBuilder {
    name: String,
    fields: Vec<FieldDecl>,
    identity: Option<IdentityRule>,
    options: RecordOptions,
}

impl RecordSchemaBuilder {
    /// Declare a field
    pub fn field(mut self, name: impl Into<String>, ty: TypeExpr) -> Self {
        self.fields.push(FieldDecl::new(name, ty));
        self
    }

    /// Declare a field from a prepared declaration
    pub fn field_decl(mut self, decl: FieldDecl) -> Self {
        self.fields.push(decl);
        self
    }

    pub fn identify_by(mut self, rule: IdentityRule) -> Self {
        self.identity = Some(rule);
        self
    }

    /// Identify records by the value at one field path
    pub fn identify_by_field(self, path: impl Into<String>) -> Self {
        self.identify_by(IdentityRule::Field(path.into()))
    }

    /// Identify records by the values at several field paths
    pub fn identify_by_fields<S: Into<String>>(self, paths: impl IntoIterator<Item = S>) -> Self {
        self.identify_by(IdentityRule::Fields(
            paths.into_iter().map(Into::into).collect(),
        ))
    }

    pub fn options(mut self, options: RecordOptions) -> Self {
        self.options = options;
        self
    }

    /// Validate the declaration and freeze it into a shared schema.
    ///
    /// # Errors
    /// * `Schema` - empty, duplicate or separator-containing field name; a
    ///   default value; an unsupported type shape; a missing identity rule or
    ///   one whose paths do not resolve
    pub fn build(self) -> Result<Arc<RecordSchema>> {
        let record = self.name;
        let schema_error = |field: &str, reason: String| RecordError::Schema {
            record: record.clone(),
            field: field.to_string(),
            reason,
        };

        let mut fields: Vec<FieldDescriptor> = Vec::with_capacity(self.fields.len());
        for decl in self.fields {
            if decl.name.is_empty() {
                return Err(schema_error("", "field name is empty".to_string()));
            }
            if decl.name.contains(SEPARATOR) {
                return Err(schema_error(
                    &decl.name,
                    format!("field name contains the path separator `{}`", SEPARATOR),
                ));
            }
            if fields.iter().any(|f| f.name == decl.name) {
                return Err(schema_error(&decl.name, "field is declared twice".to_string()));
            }
            if decl.default.is_some() {
                return Err(schema_error(
                    &decl.name,
                    "default values are not allowed".to_string(),
                ));
            }
            let (kind, optional) = introspect::classify(&decl.ty).map_err(|e| match e {
                RecordError::UnsupportedShape { shape, reason } => {
                    schema_error(&decl.name, format!("type `{}`: {}", shape, reason))
                }
                other => schema_error(&decl.name, other.to_string()),
            })?;
            fields.push(FieldDescriptor {
                name: decl.name,
                declared: decl.ty,
                kind,
                optional,
            });
        }

        let identity = self.identity.ok_or_else(|| {
            schema_error(
                "unique_identification",
                "no identity rule declared".to_string(),
            )
        })?;

        let schema = RecordSchema {
            name: record.clone(),
            fields,
            identity,
            options: self.options,
        };
        for path in schema.identity.paths() {
            schema
                .resolve_field(path)
                .map_err(|e| schema_error(path, format!("identity path: {}", e)))?;
        }

        tracing::debug!(record = %schema.name, fields = schema.fields.len(), "record schema declared");
        Ok(Arc::new(schema))
    }
}
