//! Domain logic for dashboards, widgets and widget fields.
//!
//! This crate has no database or HTTP dependencies. Everything the
//! synchronizers need (submitted input, stored rows) is passed in by the
//! caller, and every function returns a plan or a [`error::CoreError`].

pub mod audit;
pub mod dashboard;
pub mod error;
pub mod field_sync;
pub mod grid;
pub mod merge_diff;
pub mod object_id;
pub mod references;
pub mod roles;
pub mod types;
pub mod widget_field;
pub mod widget_sync;
