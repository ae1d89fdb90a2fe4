//! CrudService: validated CRUD over the instance graph.

mod crud;
mod validation;
pub(crate) use crud::{define_classes, define_properties};
pub use crud::{instance_iri, CrudService};
pub use validation::{reference_target, ObjectValidator, MAX_DEPTH};
