use thiserror::Error;

/// Result type alias using RecordError
pub type Result<T> = std::result::Result<T, RecordError>;

// ========== Error Facility ==========

/// Canonical error kind taxonomy
///
/// Each kind maps to a stable error code that can be used for programmatic
/// error handling and test assertions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExErrorKind {
    // Declaration
    Schema,
    UnsupportedShape,

    // Construction
    MissingField,
    UnknownField,
    TypeMismatch,

    // Addressing
    PathResolution,
    Immutable,

    // Collection lookup
    NotFound,
    AmbiguousMatch,
}

impl ExErrorKind {
    /// Get the stable error code for this kind
    pub fn code(&self) -> &'static str {
        match self {
            ExErrorKind::Schema => "ERR_SCHEMA",
            ExErrorKind::UnsupportedShape => "ERR_UNSUPPORTED_SHAPE",
            ExErrorKind::MissingField => "ERR_MISSING_FIELD",
            ExErrorKind::UnknownField => "ERR_UNKNOWN_FIELD",
            ExErrorKind::TypeMismatch => "ERR_TYPE_MISMATCH",
            ExErrorKind::PathResolution => "ERR_PATH_RESOLUTION",
            ExErrorKind::Immutable => "ERR_IMMUTABLE_RECORD",
            ExErrorKind::NotFound => "ERR_NOT_FOUND",
            ExErrorKind::AmbiguousMatch => "ERR_AMBIGUOUS_MATCH",
        }
    }
}

/// Canonical structured error type
///
/// Carries a classification for programmatic handling plus the record type
/// and field path the failure refers to.
#[derive(Debug, Clone)]
pub struct ExError {
    kind: ExErrorKind,
    op: Option<String>,
    record: Option<String>,
    path: Option<String>,
    message: String,
}

impl ExError {
    /// Create a new error with the specified kind
    pub fn new(kind: ExErrorKind) -> Self {
        Self {
            kind,
            op: None,
            record: None,
            path: None,
            message: String::new(),
        }
    }

    /// Add operation context
    pub fn with_op(mut self, op: impl Into<String>) -> Self {
        self.op = Some(op.into());
        self
    }

    /// Add record type context
    pub fn with_record(mut self, record: impl Into<String>) -> Self {
        self.record = Some(record.into());
        self
    }

    /// Add field path context
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Add custom message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Get the error kind
    pub fn kind(&self) -> ExErrorKind {
        self.kind
    }

    /// Get the stable error code
    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    /// Get the operation context, if any
    pub fn op(&self) -> Option<&str> {
        self.op.as_deref()
    }

    /// Get the record type context, if any
    pub fn record(&self) -> Option<&str> {
        self.record.as_deref()
    }

    /// Get the field path context, if any
    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    /// Get the error message
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for ExError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.code())?;
        if let Some(op) = &self.op {
            write!(f, " in operation '{}'", op)?;
        }
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        if let Some(record) = &self.record {
            write!(f, " (record: {})", record)?;
        }
        if let Some(path) = &self.path {
            write!(f, " (path: {})", path)?;
        }
        Ok(())
    }
}

impl std::error::Error for ExError {}

// ========== End Error Facility ==========

/// Error taxonomy for record declaration, construction and lookup
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RecordError {
    // ===== Declaration Errors =====
    /// A record type declaration violates the schema contract
    #[error("Invalid declaration of field `{field}` in record `{record}`: {reason}")]
    Schema {
        record: String,
        field: String,
        reason: String,
    },

    /// A type expression has a shape the introspector cannot classify
    #[error("Unsupported type shape `{shape}`: {reason}")]
    UnsupportedShape { shape: String, reason: String },

    // ===== Construction Errors =====
    /// A construction map omits a schema field
    #[error("Field `{field}` of record `{record}` is not mentioned in the provided map")]
    MissingField { record: String, field: String },

    /// A construction map supplies a key that is not a schema field
    #[error("`{field}` is not a field of record `{record}`")]
    UnknownField { record: String, field: String },

    /// A value does not fit the kind declared for its field
    #[error("Field `{field}` of record `{record}` expects {expected}, got {found}")]
    TypeMismatch {
        record: String,
        field: String,
        expected: String,
        found: String,
    },

    // ===== Addressing Errors =====
    /// A field path cannot be resolved against the schema or the instance
    #[error("Cannot resolve path `{path}` in record `{record}`: {reason}")]
    PathResolution {
        record: String,
        path: String,
        reason: String,
    },

    /// A record declared as frozen was mutated
    #[error("Record `{record}` is frozen and cannot be modified")]
    ImmutableRecord { record: String },

    // ===== Collection Errors =====
    /// No item of a collection carries the requested identifier
    #[error("No item with identifier `{identifier}` exists")]
    NotFound { identifier: String },

    /// More than one item of a collection carries the requested identifier
    #[error("{count} items with identifier `{identifier}` exist")]
    AmbiguousMatch { identifier: String, count: usize },
}

impl RecordError {
    pub(crate) fn type_mismatch(
        record: &str,
        field: &str,
        expected: impl Into<String>,
        found: impl Into<String>,
    ) -> Self {
        RecordError::TypeMismatch {
            record: record.to_string(),
            field: field.to_string(),
            expected: expected.into(),
            found: found.into(),
        }
    }

    pub(crate) fn path_resolution(record: &str, path: &str, reason: impl Into<String>) -> Self {
        RecordError::PathResolution {
            record: record.to_string(),
            path: path.to_string(),
            reason: reason.into(),
        }
    }

    /// Canonical kind of this error
    pub fn kind(&self) -> ExErrorKind {
        match self {
            RecordError::Schema { .. } => ExErrorKind::Schema,
            RecordError::UnsupportedShape { .. } => ExErrorKind::UnsupportedShape,
            RecordError::MissingField { .. } => ExErrorKind::MissingField,
            RecordError::UnknownField { .. } => ExErrorKind::UnknownField,
            RecordError::TypeMismatch { .. } => ExErrorKind::TypeMismatch,
            RecordError::PathResolution { .. } => ExErrorKind::PathResolution,
            RecordError::ImmutableRecord { .. } => ExErrorKind::Immutable,
            RecordError::NotFound { .. } => ExErrorKind::NotFound,
            RecordError::AmbiguousMatch { .. } => ExErrorKind::AmbiguousMatch,
        }
    }
}

/// Conversion from the record error enum to the canonical ExError
impl From<RecordError> for ExError {
    fn from(err: RecordError) -> Self {
        let kind = err.kind();
        let message = err.to_string();
        match err {
            RecordError::Schema { record, field, .. } => ExError::new(kind)
                .with_record(record)
                .with_path(field)
                .with_message(message),

            RecordError::UnsupportedShape { .. } => ExError::new(kind).with_message(message),

            RecordError::MissingField { record, field }
            | RecordError::UnknownField { record, field }
            | RecordError::TypeMismatch { record, field, .. } => ExError::new(kind)
                .with_record(record)
                .with_path(field)
                .with_message(message),

            RecordError::PathResolution { record, path, .. } => ExError::new(kind)
                .with_record(record)
                .with_path(path)
                .with_message(message),

            RecordError::ImmutableRecord { record } => {
                ExError::new(kind).with_record(record).with_message(message)
            }

            RecordError::NotFound { .. } | RecordError::AmbiguousMatch { .. } => {
                ExError::new(kind).with_message(message)
            }
        }
    }
}
