//! Canonical logging macros
//!
//! Every boundary event carries `component`, `op` and `event`; callers append
//! their own fields (`record`, `path`, counts) after the canonical ones.

/// Emit one operation event at the given level. Not part of the public API.
#[doc(hidden)]
#[macro_export]
macro_rules! __log_op_event {
    ($level:ident, $op:expr, $event:expr $(, $($field:tt)*)?) => {
        tracing::$level!(
            component = module_path!(),
            op = $op,
            event = $event,
            $($($field)*)?
        )
    };
}

/// Log the start of an operation
///
/// # Example
///
/// ```
/// # use recordkit_core::log_op_start;
/// log_op_start!("record_create");
/// log_op_start!("record_create", record = "Point");
/// ```
#[macro_export]
macro_rules! log_op_start {
    ($op:expr $(, $($field:tt)*)?) => {
        $crate::__log_op_event!(
            info,
            $op,
            recordkit_core_types::schema::EVENT_START
            $(, $($field)*)?
        )
    };
}

/// Log the successful end of an operation; `duration_ms` is mandatory
///
/// # Example
///
/// ```
/// # use recordkit_core::log_op_end;
/// log_op_end!("record_diff", duration_ms = 3, diff_count = 1);
/// ```
#[macro_export]
macro_rules! log_op_end {
    ($op:expr, duration_ms = $duration:expr $(, $($field:tt)*)?) => {
        $crate::__log_op_event!(
            info,
            $op,
            recordkit_core_types::schema::EVENT_END,
            duration_ms = $duration
            $(, $($field)*)?
        )
    };
}

/// Log the failed end of an operation
///
/// The error is converted into an `ExError` so the event carries its kind and
/// stable code.
///
/// # Example
///
/// ```
/// # use recordkit_core::{log_op_error, errors::RecordError};
/// let err = RecordError::NotFound { identifier: "7".to_string() };
/// log_op_error!("collection_by_identifier", err, duration_ms = 0);
/// ```
#[macro_export]
macro_rules! log_op_error {
    ($op:expr, $err:expr, duration_ms = $duration:expr $(, $($field:tt)*)?) => {{
        let ex_err: $crate::errors::ExError = $err.into();
        $crate::__log_op_event!(
            error,
            $op,
            recordkit_core_types::schema::EVENT_END_ERROR,
            duration_ms = $duration,
            err.kind = ?ex_err.kind(),
            err.code = ex_err.code()
            $(, $($field)*)?
        )
    }};
}
