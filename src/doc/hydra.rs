//! Hydra ApiDocumentation → class and property definitions.

use crate::doc::vocab::{self, as_text, is_term, local_name, HYDRA, RDFS};
use crate::doc::ParsedVocabulary;
use crate::error::ImportError;
use crate::model::{Property, PropertyKind, RdfClass};
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};

/// Classes every Hydra API carries; they are served, not stored.
const SKIPPED_CLASSES: &[&str] = &["EntryPoint", "Resource"];

pub fn is_api_documentation(doc: &Value) -> bool {
    vocab::types(doc)
        .iter()
        .any(|t| is_term(&HYDRA, t, "ApiDocumentation"))
        || vocab::get(doc, &HYDRA, "supportedClass").is_some()
}

pub fn parse(doc: &Value) -> Result<ParsedVocabulary, ImportError> {
    let supported = match vocab::get(doc, &HYDRA, "supportedClass") {
        Some(Value::Array(items)) => items.as_slice(),
        Some(other) => std::slice::from_ref(other),
        None => &[],
    };

    let mut class_nodes = Vec::new();
    for node in supported {
        let id = node.get("@id").and_then(Value::as_str).unwrap_or_default();
        if HYDRA.contains(id) {
            continue;
        }
        let name = vocab::get(node, &HYDRA, "title")
            .and_then(as_text)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| s.trim_end_matches('.').to_string())
            .or_else(|| (!id.is_empty()).then(|| local_name(id).to_string()))
            .ok_or_else(|| ImportError::MissingName {
                kind: "class",
                id: node.to_string(),
            })?;
        if SKIPPED_CLASSES.contains(&name.as_str()) {
            continue;
        }
        class_nodes.push((id, name, node));
    }

    // a range naming a documented class makes the property an instance relation
    let documented: HashSet<&str> = class_nodes
        .iter()
        .flat_map(|(id, name, _)| [*id, name.as_str()])
        .filter(|s| !s.is_empty())
        .collect();

    let mut classes = Vec::with_capacity(class_nodes.len());
    let mut properties: BTreeMap<String, PropertyKind> = BTreeMap::new();
    for (_, name, node) in &class_nodes {
        classes.push(RdfClass {
            name: name.clone(),
            title: vocab::get(node, &HYDRA, "title").and_then(as_text).map(str::to_string),
            description: vocab::get(node, &HYDRA, "description")
                .or_else(|| vocab::get(node, &RDFS, "comment"))
                .and_then(as_text)
                .map(str::to_string),
        });

        let props = match vocab::get(node, &HYDRA, "supportedProperty") {
            Some(Value::Array(items)) => items.as_slice(),
            Some(other) => std::slice::from_ref(other),
            None => &[],
        };
        for prop in props {
            let Some((prop_name, kind)) = supported_property(prop, &documented)? else {
                continue;
            };
            let entry = properties.entry(prop_name).or_insert(kind);
            if *entry == PropertyKind::Plain {
                *entry = kind;
            }
        }
    }

    Ok(ParsedVocabulary {
        classes,
        properties: properties
            .into_iter()
            .map(|(name, kind)| Property { name, kind })
            .collect(),
    })
}

/// Name and kind of one `supportedProperty` entry. Hydra's own terms are skipped.
fn supported_property(
    prop: &Value,
    documented: &HashSet<&str>,
) -> Result<Option<(String, PropertyKind)>, ImportError> {
    let target = vocab::get(prop, &HYDRA, "property");
    let target_iri = target.and_then(as_text).unwrap_or_default();
    if HYDRA.contains(target_iri) {
        return Ok(None);
    }
    let name = vocab::get(prop, &HYDRA, "title")
        .and_then(as_text)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .or_else(|| (!target_iri.is_empty()).then(|| local_name(target_iri).to_string()))
        .ok_or_else(|| ImportError::MissingName {
            kind: "property",
            id: prop.to_string(),
        })?;

    let range = target
        .and_then(|t| vocab::get(t, &RDFS, "range"))
        .or_else(|| vocab::get(prop, &RDFS, "range"))
        .and_then(as_text)
        .unwrap_or_default();
    let is_link = target.map_or(false, |t| {
        vocab::types(t).iter().any(|ty| is_term(&HYDRA, ty, "Link"))
    });

    let kind = if RDFS.is(range, "Class") || HYDRA.is(range, "Class") {
        PropertyKind::Abstract
    } else if is_link
        || (!range.is_empty() && (documented.contains(range) || documented.contains(local_name(range))))
    {
        PropertyKind::Instance
    } else {
        PropertyKind::Plain
    };
    Ok(Some((name, kind)))
}
