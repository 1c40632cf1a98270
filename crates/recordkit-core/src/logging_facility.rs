//! Structured logging for record operations
//!
//! Public record operations log exactly one `start` and one `end` (or
//! `end_error`) event per call:
//!
//! | op                           | extra fields                          |
//! |------------------------------|---------------------------------------|
//! | `record_create`              | `record`                              |
//! | `record_create_all_sentinel` | `record`, `nested`                    |
//! | `record_set`                 | `record`, `path`                      |
//! | `record_diff`                | `record`, `diff_count`                |
//! | `collection_diff`            | `left_len`, `right_len`, `diff_count` |
//!
//! Recursion below those boundaries only emits `tracing::debug!`, so a
//! collection diff never reports its per-item record diffs as operations.
//!
//! ```rust
//! use recordkit_core::logging_facility::{init, Profile};
//!
//! init(Profile::Development);
//! ```

pub mod init;
pub mod macros;
pub mod test_capture;

pub use init::{init, Profile};
pub use test_capture::{init_test_capture, BoundaryCounts, CapturedEvent, TestCapture};
