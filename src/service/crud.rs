//! CRUD engine over the instance graph. Each public operation is one store
//! transaction; a failure anywhere drops the transaction and nothing is written.

use crate::error::CrudError;
use crate::model::{Edge, EdgeValue, Instance, Property, PropertyKind, RdfClass};
use crate::service::validation::{reference_target, ObjectValidator, MAX_DEPTH};
use crate::store::{GraphStore, GraphTx};
use serde_json::{json, Map, Value};
use std::future::Future;
use std::pin::Pin;

type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, CrudError>> + Send + 'a>>;

/// `/{api}/{Class}/{id}`
pub fn instance_iri(api: &str, class_name: &str, id: &str) -> String {
    format!("/{}/{}/{}", api, class_name, id)
}

pub struct CrudService;

impl CrudService {
    /// Insert `object` under `id`, or a generated UUID. Returns the instance id.
    pub async fn insert(
        store: &dyn GraphStore,
        object: &Value,
        id: Option<&str>,
    ) -> Result<String, CrudError> {
        ObjectValidator::validate(object)?;
        if let Some(id) = id {
            ObjectValidator::validate_id(id)?;
        }
        let mut tx = store.begin().await?;
        let id = insert_object(tx.as_mut(), object, id.map(str::to_string)).await?;
        tx.commit().await?;
        tracing::info!(id = %id, "instance inserted");
        Ok(id)
    }

    /// Flattened view of one instance. `class_name`, when given, must match.
    pub async fn get(
        store: &dyn GraphStore,
        api: &str,
        id: &str,
        class_name: Option<&str>,
    ) -> Result<Value, CrudError> {
        let mut tx = store.begin().await?;
        let instance = find_typed(tx.as_mut(), id, class_name).await?;
        render(tx.as_mut(), api, instance, 0).await
    }

    /// Remove the instance, edges touching it, and the nested instances it owns.
    pub async fn delete(
        store: &dyn GraphStore,
        id: &str,
        class_name: Option<&str>,
    ) -> Result<(), CrudError> {
        let mut tx = store.begin().await?;
        find_typed(tx.as_mut(), id, class_name).await?;
        delete_tree(tx.as_mut(), id.to_string()).await?;
        tx.commit().await?;
        tracing::info!(id, "instance deleted");
        Ok(())
    }

    /// Delete then insert under the same id, atomically. References held by
    /// other instances survive the replacement.
    pub async fn update(
        store: &dyn GraphStore,
        id: &str,
        class_name: Option<&str>,
        object: &Value,
    ) -> Result<(), CrudError> {
        let mut tx = store.begin().await?;
        find_typed(tx.as_mut(), id, class_name).await?;
        ObjectValidator::validate(object)?;
        let inbound = tx.edges_to(id).await?;
        delete_tree(tx.as_mut(), id.to_string()).await?;
        insert_object(tx.as_mut(), object, Some(id.to_string())).await?;
        for edge in &inbound {
            if tx.find_instance(&edge.subject).await?.is_some() {
                tx.insert_edge(edge).await?;
            }
        }
        tx.commit().await?;
        tracing::info!(id, restored = inbound.len(), "instance updated");
        Ok(())
    }

    /// Members of a class as a Hydra collection.
    pub async fn collection(
        store: &dyn GraphStore,
        api: &str,
        class_name: &str,
    ) -> Result<Value, CrudError> {
        let mut tx = store.begin().await?;
        if tx.find_class(class_name).await?.is_none() {
            return Err(CrudError::InvalidClass(class_name.to_string()));
        }
        let members: Vec<Value> = tx
            .instances_of(class_name)
            .await?
            .into_iter()
            .map(|i| {
                json!({
                    "@id": instance_iri(api, &i.class_name, &i.id),
                    "@type": i.class_name,
                })
            })
            .collect();
        Ok(json!({
            "@context": format!("/{}/contexts/{}Collection.jsonld", api, class_name),
            "@id": format!("/{}/{}Collection", api, class_name),
            "@type": format!("{}Collection", class_name),
            "members": members,
        }))
    }

    /// Insert class definitions, skipping names already present. Returns how many were new.
    pub async fn insert_classes(store: &dyn GraphStore, classes: &[RdfClass]) -> Result<u64, CrudError> {
        let mut tx = store.begin().await?;
        let count = define_classes(tx.as_mut(), classes).await?;
        tx.commit().await?;
        Ok(count)
    }

    /// Insert property definitions, skipping names already present. A known
    /// plain property takes the incoming kind; a typed one keeps its own.
    pub async fn insert_properties(store: &dyn GraphStore, properties: &[Property]) -> Result<u64, CrudError> {
        let mut tx = store.begin().await?;
        let count = define_properties(tx.as_mut(), properties).await?;
        tx.commit().await?;
        Ok(count)
    }

    pub async fn classes(store: &dyn GraphStore) -> Result<Vec<RdfClass>, CrudError> {
        let mut tx = store.begin().await?;
        tx.classes().await
    }

    pub async fn properties(store: &dyn GraphStore) -> Result<Vec<Property>, CrudError> {
        let mut tx = store.begin().await?;
        tx.properties().await
    }
}

pub(crate) async fn define_classes(tx: &mut dyn GraphTx, classes: &[RdfClass]) -> Result<u64, CrudError> {
    let mut count = 0u64;
    for class in classes {
        if tx.insert_class(class).await? {
            count += 1;
        }
    }
    Ok(count)
}

pub(crate) async fn define_properties(tx: &mut dyn GraphTx, properties: &[Property]) -> Result<u64, CrudError> {
    let mut count = 0u64;
    for property in properties {
        match tx.find_property(&property.name).await? {
            None => {
                tx.insert_property(property).await?;
                count += 1;
            }
            Some(existing) if existing.kind == PropertyKind::Plain && property.kind != PropertyKind::Plain => {
                if tx.has_terminal_edges(&property.name).await? {
                    tracing::warn!(
                        property = %property.name,
                        kind = %property.kind,
                        "kept plain: property already holds terminal values"
                    );
                } else {
                    tx.set_property_kind(&property.name, property.kind).await?;
                }
            }
            Some(_) => {}
        }
    }
    Ok(count)
}

async fn find_typed(
    tx: &mut dyn GraphTx,
    id: &str,
    class_name: Option<&str>,
) -> Result<Instance, CrudError> {
    match tx.find_instance(id).await? {
        Some(i) if class_name.map_or(true, |c| c == i.class_name) => Ok(i),
        _ => Err(CrudError::NotFound(id.to_string())),
    }
}

fn insert_object<'a>(
    tx: &'a mut dyn GraphTx,
    object: &'a Value,
    id: Option<String>,
) -> BoxFuture<'a, String> {
    Box::pin(async move {
        let map = object
            .as_object()
            .ok_or_else(|| CrudError::Malformed("instance must be a JSON object".into()))?;
        let class_name = map
            .get("@type")
            .and_then(Value::as_str)
            .ok_or_else(|| CrudError::Malformed("@type is required".into()))?;

        let id = match id {
            Some(id) => {
                if tx.find_instance(&id).await?.is_some() {
                    tracing::warn!(id = %id, "insert rejected: id taken");
                    return Err(CrudError::InstanceExists(id));
                }
                id
            }
            None => uuid::Uuid::new_v4().to_string(),
        };
        if tx.find_class(class_name).await?.is_none() {
            tracing::warn!(class = class_name, "insert rejected: unknown class");
            return Err(CrudError::InvalidClass(class_name.to_string()));
        }
        tx.insert_instance(&Instance {
            id: id.clone(),
            class_name: class_name.to_string(),
        })
        .await?;

        for (key, value) in map {
            if key.starts_with('@') || value.is_null() {
                continue;
            }
            let mut property = tx
                .find_property(key)
                .await?
                .ok_or_else(|| CrudError::InvalidProperty(key.clone()))?;
            // arrays use positions from 1 so a one-element array reads back as an array
            let items: Vec<(i32, &Value)> = match value {
                Value::Array(items) => items
                    .iter()
                    .enumerate()
                    .map(|(i, v)| (i as i32 + 1, v))
                    .collect(),
                other => vec![(0, other)],
            };
            for (position, item) in items {
                if item.is_null() {
                    continue;
                }
                let (value, owned) = resolve_value(tx, &mut property, item).await?;
                tx.insert_edge(&Edge {
                    subject: id.clone(),
                    predicate: property.name.clone(),
                    position,
                    value,
                    owned,
                })
                .await?;
            }
        }
        Ok(id)
    })
}

/// Turn one submitted value into an edge object, checking it against the property's kind.
async fn resolve_value(
    tx: &mut dyn GraphTx,
    property: &mut Property,
    item: &Value,
) -> Result<(EdgeValue, bool), CrudError> {
    if let Some(map) = item.as_object() {
        if property.kind == PropertyKind::Abstract {
            return Err(CrudError::InvalidProperty(property.name.clone()));
        }
        promote(tx, property).await?;
        if map.contains_key("@type") {
            let nested = insert_object(tx, item, None).await?;
            return Ok((EdgeValue::Instance(nested), true));
        }
        let reference = map.get("@id").and_then(Value::as_str).unwrap_or_default();
        let id = existing_instance(tx, reference).await?;
        return Ok((EdgeValue::Instance(id), false));
    }

    match property.kind {
        PropertyKind::Abstract => {
            let name = item.as_str().map(str::to_string).unwrap_or_else(|| item.to_string());
            if tx.find_class(&name).await?.is_none() {
                return Err(CrudError::InvalidClass(name));
            }
            Ok((EdgeValue::Class(name), false))
        }
        PropertyKind::Instance => {
            let reference = item.as_str().map(str::to_string).unwrap_or_else(|| item.to_string());
            let id = existing_instance(tx, &reference).await?;
            Ok((EdgeValue::Instance(id), false))
        }
        PropertyKind::Plain => Ok((EdgeValue::Terminal(item.clone()), false)),
    }
}

async fn existing_instance(tx: &mut dyn GraphTx, reference: &str) -> Result<String, CrudError> {
    let (class_name, id) = reference_target(reference);
    match tx.find_instance(id).await? {
        Some(i) if class_name.map_or(true, |c| c == i.class_name) => Ok(i.id),
        _ => Err(CrudError::InvalidInstance(reference.to_string())),
    }
}

/// A plain property becomes an instance property on its first instance value,
/// unless some instance already stores a terminal under it.
async fn promote(tx: &mut dyn GraphTx, property: &mut Property) -> Result<(), CrudError> {
    if property.kind == PropertyKind::Plain {
        if tx.has_terminal_edges(&property.name).await? {
            tracing::warn!(property = %property.name, "insert rejected: property holds terminal values");
            return Err(CrudError::InvalidProperty(property.name.clone()));
        }
        tx.set_property_kind(&property.name, PropertyKind::Instance).await?;
        property.kind = PropertyKind::Instance;
        tracing::debug!(property = %property.name, "promoted to instance property");
    }
    Ok(())
}

fn render<'a>(tx: &'a mut dyn GraphTx, api: &'a str, instance: Instance, depth: usize) -> BoxFuture<'a, Value> {
    Box::pin(async move {
        let mut out = Map::new();
        out.insert(
            "@id".into(),
            Value::String(instance_iri(api, &instance.class_name, &instance.id)),
        );
        out.insert("@type".into(), Value::String(instance.class_name.clone()));

        let edges = tx.edges_from(&instance.id).await?;
        // (predicate, is_array, values)
        let mut grouped: Vec<(String, bool, Vec<Value>)> = Vec::new();
        for edge in edges {
            let value = match edge.value {
                EdgeValue::Class(c) => Value::String(c),
                EdgeValue::Terminal(v) => v,
                EdgeValue::Instance(ref target) => match tx.find_instance(target).await? {
                    Some(child) if edge.owned && depth < MAX_DEPTH => render(tx, api, child, depth + 1).await?,
                    Some(child) => json!({ "@id": instance_iri(api, &child.class_name, &child.id) }),
                    None => json!({ "@id": target }),
                },
            };
            let same_predicate = grouped.last().map_or(false, |(p, _, _)| *p == edge.predicate);
            match grouped.last_mut() {
                Some((_, _, values)) if same_predicate => values.push(value),
                _ => grouped.push((edge.predicate, edge.position > 0, vec![value])),
            }
        }
        for (predicate, is_array, mut values) in grouped {
            let v = if is_array || values.len() > 1 {
                Value::Array(values)
            } else {
                values.pop().unwrap_or(Value::Null)
            };
            out.insert(predicate, v);
        }
        Ok(Value::Object(out))
    })
}

fn delete_tree<'a>(tx: &'a mut dyn GraphTx, id: String) -> BoxFuture<'a, ()> {
    Box::pin(async move {
        let owned: Vec<String> = tx
            .edges_from(&id)
            .await?
            .into_iter()
            .filter(|e| e.owned)
            .filter_map(|e| e.object_instance().map(str::to_string))
            .collect();
        if !tx.delete_instance(&id).await? {
            return Ok(());
        }
        for child in owned {
            delete_tree(tx, child).await?;
        }
        Ok(())
    })
}
