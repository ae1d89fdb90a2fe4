//! HTTP handlers for instance CRUD and API documentation.

pub mod entity;
pub mod vocab;
