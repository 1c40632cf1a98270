//! Core types shared across RecordKit facilities
//!
//! This crate holds the canonical field keys and event names used by the
//! logging and error facilities, so that emitters and test assertions agree
//! on one vocabulary.

pub mod schema;
