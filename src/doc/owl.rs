//! OWL / RDFS vocabularies in expanded-or-compact JSON-LD (`@graph` of nodes).

use crate::doc::vocab::{self, as_text, is_term, local_name, OWL, RDF, RDFS};
use crate::doc::ParsedVocabulary;
use crate::error::ImportError;
use crate::model::{Property, PropertyKind, RdfClass};
use serde_json::Value;

pub fn is_owl_graph(doc: &Value) -> bool {
    doc.get("@graph").map_or(false, Value::is_array)
}

pub fn parse(doc: &Value) -> Result<ParsedVocabulary, ImportError> {
    let nodes = doc
        .get("@graph")
        .and_then(Value::as_array)
        .ok_or(ImportError::UnknownFormat)?;

    let mut parsed = ParsedVocabulary::default();
    for node in nodes {
        let types = vocab::types(node);
        let has = |ns: &vocab::Namespace, local: &str| types.iter().any(|t| ns.is(t, local));

        let kind = if has(&OWL, "Class") || has(&RDFS, "Class") {
            None
        } else if has(&OWL, "ObjectProperty") {
            Some(PropertyKind::Instance)
        } else if has(&OWL, "DatatypeProperty") {
            Some(PropertyKind::Plain)
        } else if has(&RDF, "Property") || has(&OWL, "AnnotationProperty") {
            let range = vocab::get(node, &RDFS, "range").and_then(as_text).unwrap_or_default();
            if is_term(&RDFS, range, "Class") {
                Some(PropertyKind::Abstract)
            } else {
                Some(PropertyKind::Plain)
            }
        } else {
            continue;
        };

        let id = node.get("@id").and_then(Value::as_str).unwrap_or_default();
        // owl:Thing and friends are not user classes
        if OWL.contains(id) || RDFS.contains(id) {
            continue;
        }
        let name = vocab::get(node, &RDFS, "label")
            .and_then(as_text)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .or_else(|| (!id.is_empty()).then(|| local_name(id).to_string()))
            .ok_or_else(|| ImportError::MissingName {
                kind: if kind.is_none() { "class" } else { "property" },
                id: node.to_string(),
            })?;

        match kind {
            None => parsed.classes.push(RdfClass {
                name,
                title: None,
                description: vocab::get(node, &RDFS, "comment").and_then(as_text).map(str::to_string),
            }),
            Some(kind) => parsed.properties.push(Property { name, kind }),
        }
    }
    Ok(parsed)
}
