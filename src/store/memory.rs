//! In-process backend. A transaction works on a copy of the graph and swaps it
//! in on commit; the mutex guard serializes transactions.

use crate::error::CrudError;
use crate::model::{Edge, EdgeValue, Instance, Property, PropertyKind, RdfClass, StoredDocument};
use crate::store::{GraphStore, GraphTx};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

#[derive(Clone, Debug, Default)]
struct Graph {
    classes: BTreeMap<String, RdfClass>,
    properties: BTreeMap<String, Property>,
    instances: BTreeMap<String, Instance>,
    /// Insertion sequence, used to list class members in creation order.
    order: BTreeMap<String, u64>,
    next_seq: u64,
    edges: Vec<Edge>,
    document: Option<StoredDocument>,
    history: Vec<StoredDocument>,
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    graph: Arc<Mutex<Graph>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl GraphStore for MemoryStore {
    async fn begin(&self) -> Result<Box<dyn GraphTx>, CrudError> {
        let guard = self.graph.clone().lock_owned().await;
        let work = guard.clone();
        Ok(Box::new(MemoryTx { guard, work }))
    }

    async fn ping(&self) -> Result<(), CrudError> {
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}

struct MemoryTx {
    guard: OwnedMutexGuard<Graph>,
    work: Graph,
}

fn missing(what: &str, name: &str) -> CrudError {
    CrudError::Backend(format!("foreign key: {} '{}' does not exist", what, name))
}

#[async_trait]
impl GraphTx for MemoryTx {
    async fn find_class(&mut self, name: &str) -> Result<Option<RdfClass>, CrudError> {
        Ok(self.work.classes.get(name).cloned())
    }

    async fn insert_class(&mut self, class: &RdfClass) -> Result<bool, CrudError> {
        if self.work.classes.contains_key(&class.name) {
            return Ok(false);
        }
        self.work.classes.insert(class.name.clone(), class.clone());
        Ok(true)
    }

    async fn classes(&mut self) -> Result<Vec<RdfClass>, CrudError> {
        Ok(self.work.classes.values().cloned().collect())
    }

    async fn find_property(&mut self, name: &str) -> Result<Option<Property>, CrudError> {
        Ok(self.work.properties.get(name).cloned())
    }

    async fn insert_property(&mut self, property: &Property) -> Result<bool, CrudError> {
        if self.work.properties.contains_key(&property.name) {
            return Ok(false);
        }
        self.work.properties.insert(property.name.clone(), property.clone());
        Ok(true)
    }

    async fn set_property_kind(&mut self, name: &str, kind: PropertyKind) -> Result<(), CrudError> {
        if let Some(p) = self.work.properties.get_mut(name) {
            p.kind = kind;
        }
        Ok(())
    }

    async fn properties(&mut self) -> Result<Vec<Property>, CrudError> {
        Ok(self.work.properties.values().cloned().collect())
    }

    async fn find_instance(&mut self, id: &str) -> Result<Option<Instance>, CrudError> {
        Ok(self.work.instances.get(id).cloned())
    }

    async fn insert_instance(&mut self, instance: &Instance) -> Result<(), CrudError> {
        if self.work.instances.contains_key(&instance.id) {
            return Err(CrudError::InstanceExists(instance.id.clone()));
        }
        if !self.work.classes.contains_key(&instance.class_name) {
            return Err(missing("class", &instance.class_name));
        }
        let seq = self.work.next_seq;
        self.work.next_seq += 1;
        self.work.order.insert(instance.id.clone(), seq);
        self.work.instances.insert(instance.id.clone(), instance.clone());
        Ok(())
    }

    async fn delete_instance(&mut self, id: &str) -> Result<bool, CrudError> {
        if self.work.instances.remove(id).is_none() {
            return Ok(false);
        }
        self.work.order.remove(id);
        self.work
            .edges
            .retain(|e| e.subject != id && e.object_instance() != Some(id));
        Ok(true)
    }

    async fn instances_of(&mut self, class_name: &str) -> Result<Vec<Instance>, CrudError> {
        let mut members: Vec<(u64, Instance)> = self
            .work
            .instances
            .values()
            .filter(|i| i.class_name == class_name)
            .map(|i| (self.work.order.get(&i.id).copied().unwrap_or(0), i.clone()))
            .collect();
        members.sort_by_key(|(seq, _)| *seq);
        Ok(members.into_iter().map(|(_, i)| i).collect())
    }

    async fn insert_edge(&mut self, edge: &Edge) -> Result<(), CrudError> {
        if !self.work.instances.contains_key(&edge.subject) {
            return Err(missing("instance", &edge.subject));
        }
        if !self.work.properties.contains_key(&edge.predicate) {
            return Err(missing("property", &edge.predicate));
        }
        match &edge.value {
            EdgeValue::Class(c) if !self.work.classes.contains_key(c) => return Err(missing("class", c)),
            EdgeValue::Instance(i) if !self.work.instances.contains_key(i) => {
                return Err(missing("instance", i))
            }
            _ => {}
        }
        self.work.edges.push(edge.clone());
        Ok(())
    }

    async fn edges_from(&mut self, subject: &str) -> Result<Vec<Edge>, CrudError> {
        let mut out: Vec<Edge> = self
            .work
            .edges
            .iter()
            .filter(|e| e.subject == subject)
            .cloned()
            .collect();
        // stable: equal keys keep insertion order
        out.sort_by(|a, b| (&a.predicate, a.position).cmp(&(&b.predicate, b.position)));
        Ok(out)
    }

    async fn edges_to(&mut self, object: &str) -> Result<Vec<Edge>, CrudError> {
        Ok(self
            .work
            .edges
            .iter()
            .filter(|e| e.object_instance() == Some(object) && e.subject != object)
            .cloned()
            .collect())
    }

    async fn has_terminal_edges(&mut self, predicate: &str) -> Result<bool, CrudError> {
        Ok(self
            .work
            .edges
            .iter()
            .any(|e| e.predicate == predicate && matches!(e.value, EdgeValue::Terminal(_))))
    }

    async fn latest_document(&mut self) -> Result<Option<StoredDocument>, CrudError> {
        Ok(self.work.document.clone())
    }

    async fn save_document(&mut self, payload: &Value) -> Result<i64, CrudError> {
        let new_version = match &self.work.document {
            Some(doc) if &doc.payload == payload => return Ok(doc.version),
            Some(doc) => doc.version + 1,
            None => 1,
        };
        if let Some(old) = self.work.document.take() {
            self.work.history.push(old);
        }
        self.work.document = Some(StoredDocument {
            payload: payload.clone(),
            version: new_version,
            updated_at: chrono::Utc::now(),
        });
        Ok(new_version)
    }

    async fn commit(self: Box<Self>) -> Result<(), CrudError> {
        let MemoryTx { mut guard, work } = *self;
        *guard = work;
        Ok(())
    }
}
