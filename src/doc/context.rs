//! JSON-LD contexts and the API entry point, generated from stored definitions.

use crate::doc::vocab::HYDRA;
use crate::model::{Property, PropertyKind, RdfClass};
use serde_json::{json, Map, Value};

pub const ENTRY_POINT: &str = "EntryPoint";

fn base_context(api: &str) -> Map<String, Value> {
    let mut ctx = Map::new();
    ctx.insert("hydra".into(), Value::String(HYDRA.iri.to_string()));
    ctx.insert("vocab".into(), Value::String(format!("/{}/vocab#", api)));
    ctx
}

/// `GET /{api}`: one `{Class}Collection` link per class.
pub fn entry_point(api: &str, classes: &[RdfClass]) -> Value {
    let mut out = Map::new();
    out.insert(
        "@context".into(),
        Value::String(format!("/{}/contexts/{}.jsonld", api, ENTRY_POINT)),
    );
    out.insert("@id".into(), Value::String(format!("/{}", api)));
    out.insert("@type".into(), Value::String(ENTRY_POINT.into()));
    for class in classes {
        out.insert(
            format!("{}Collection", class.name),
            Value::String(format!("/{}/{}Collection", api, class.name)),
        );
    }
    Value::Object(out)
}

/// Context document for `name`: `EntryPoint`, `{Class}Collection` or a class.
/// `None` when the name matches nothing defined.
pub fn context_for(api: &str, name: &str, classes: &[RdfClass], properties: &[Property]) -> Option<Value> {
    let mut ctx = base_context(api);
    if name == ENTRY_POINT {
        ctx.insert(ENTRY_POINT.into(), Value::String(format!("vocab:{}", ENTRY_POINT)));
        for class in classes {
            let key = format!("{}Collection", class.name);
            ctx.insert(
                key.clone(),
                json!({ "@id": format!("vocab:{}/{}", ENTRY_POINT, key), "@type": "@id" }),
            );
        }
        return Some(json!({ "@context": ctx }));
    }

    if let Some(class_name) = name.strip_suffix("Collection") {
        if classes.iter().any(|c| c.name == class_name) {
            ctx.insert(name.to_string(), Value::String(format!("vocab:{}", name)));
            ctx.insert("members".into(), json!({ "@id": "hydra:member", "@type": "@id" }));
            return Some(json!({ "@context": ctx }));
        }
    }

    let class = classes.iter().find(|c| c.name == name)?;
    ctx.insert(class.name.clone(), Value::String(format!("vocab:{}", class.name)));
    for p in properties {
        let term = format!("vocab:{}", p.name);
        let entry = match p.kind {
            PropertyKind::Plain => Value::String(term),
            PropertyKind::Abstract | PropertyKind::Instance => json!({ "@id": term, "@type": "@id" }),
        };
        ctx.insert(p.name.clone(), entry);
    }
    Some(json!({ "@context": ctx }))
}
