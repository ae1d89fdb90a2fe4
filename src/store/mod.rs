//! Schema store: the graph of classes, properties, instances and edges.
//!
//! Every CRUD operation runs inside one [`GraphTx`]. Dropping a transaction
//! without calling [`GraphTx::commit`] discards its writes.

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::{ensure_database_exists, PgStore};

use crate::error::CrudError;
use crate::model::{Edge, Instance, Property, PropertyKind, RdfClass, StoredDocument};
use async_trait::async_trait;
use serde_json::Value;

#[async_trait]
pub trait GraphStore: Send + Sync {
    async fn begin(&self) -> Result<Box<dyn GraphTx>, CrudError>;

    /// Cheap round trip used by readiness checks.
    async fn ping(&self) -> Result<(), CrudError>;

    fn backend(&self) -> &'static str;
}

#[async_trait]
pub trait GraphTx: Send {
    async fn find_class(&mut self, name: &str) -> Result<Option<RdfClass>, CrudError>;

    /// Returns false when a class with that name already exists.
    async fn insert_class(&mut self, class: &RdfClass) -> Result<bool, CrudError>;

    async fn classes(&mut self) -> Result<Vec<RdfClass>, CrudError>;

    async fn find_property(&mut self, name: &str) -> Result<Option<Property>, CrudError>;

    /// Returns false when a property with that name already exists.
    async fn insert_property(&mut self, property: &Property) -> Result<bool, CrudError>;

    async fn set_property_kind(&mut self, name: &str, kind: PropertyKind) -> Result<(), CrudError>;

    async fn properties(&mut self) -> Result<Vec<Property>, CrudError>;

    async fn find_instance(&mut self, id: &str) -> Result<Option<Instance>, CrudError>;

    /// Fails with [`CrudError::InstanceExists`] on a duplicate id.
    async fn insert_instance(&mut self, instance: &Instance) -> Result<(), CrudError>;

    /// Removes the instance, its outgoing edges and every edge pointing at it.
    async fn delete_instance(&mut self, id: &str) -> Result<bool, CrudError>;

    async fn instances_of(&mut self, class_name: &str) -> Result<Vec<Instance>, CrudError>;

    async fn insert_edge(&mut self, edge: &Edge) -> Result<(), CrudError>;

    /// Outgoing edges ordered by predicate then position.
    async fn edges_from(&mut self, subject: &str) -> Result<Vec<Edge>, CrudError>;

    /// Edges from other instances whose object is `object`.
    async fn edges_to(&mut self, object: &str) -> Result<Vec<Edge>, CrudError>;

    /// Whether any edge with this predicate holds a terminal value.
    async fn has_terminal_edges(&mut self, predicate: &str) -> Result<bool, CrudError>;

    async fn latest_document(&mut self) -> Result<Option<StoredDocument>, CrudError>;

    /// Stores a new version of the API documentation; returns the version.
    /// An identical payload keeps the current version.
    async fn save_document(&mut self, payload: &Value) -> Result<i64, CrudError>;

    async fn commit(self: Box<Self>) -> Result<(), CrudError>;
}
