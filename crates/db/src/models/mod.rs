//! Row structs and their conversions into core types.
//!
//! Monitoring ids are `NUMERIC(20,0)` columns; queries select them cast to
//! text and rows decode them through [`object_id::DbObjectId`].

pub mod audit;
pub mod dashboard;
pub mod object_id;
pub mod widget;
pub mod widget_field;
