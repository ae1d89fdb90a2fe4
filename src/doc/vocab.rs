//! Vocabulary IRIs and term matching for Hydra, RDF, RDFS and OWL documents.
//!
//! Documents may spell a term as a full IRI, a compact IRI (`hydra:Class`) or,
//! under a default `@vocab`, a bare local name. [`is_term`] accepts all three.

use serde_json::Value;

pub struct Namespace {
    pub prefix: &'static str,
    pub iri: &'static str,
}

pub const HYDRA: Namespace = Namespace {
    prefix: "hydra",
    iri: "http://www.w3.org/ns/hydra/core#",
};

pub const RDF: Namespace = Namespace {
    prefix: "rdf",
    iri: "http://www.w3.org/1999/02/22-rdf-syntax-ns#",
};

pub const RDFS: Namespace = Namespace {
    prefix: "rdfs",
    iri: "http://www.w3.org/2000/01/rdf-schema#",
};

pub const OWL: Namespace = Namespace {
    prefix: "owl",
    iri: "http://www.w3.org/2002/07/owl#",
};

impl Namespace {
    /// Whether `value` names `local` in this namespace.
    pub fn is(&self, value: &str, local: &str) -> bool {
        if let Some(rest) = value.strip_prefix(self.iri) {
            return rest == local;
        }
        if let Some((prefix, rest)) = value.split_once(':') {
            return prefix == self.prefix && rest == local;
        }
        false
    }

    /// Whether `value` is any term of this namespace.
    pub fn contains(&self, value: &str) -> bool {
        value.starts_with(self.iri)
            || value
                .split_once(':')
                .map_or(false, |(prefix, _)| prefix == self.prefix)
    }
}

/// Like [`Namespace::is`] but also accepts the bare local name, as written
/// under a default `@vocab`.
pub fn is_term(ns: &Namespace, value: &str, local: &str) -> bool {
    value == local || ns.is(value, local)
}

/// Last segment of an IRI: after `#`, else after `/`, else after `:`.
pub fn local_name(iri: &str) -> &str {
    let trimmed = iri.trim_end_matches(['/', '#']);
    trimmed
        .rsplit(['#', '/', ':'])
        .next()
        .filter(|s| !s.is_empty())
        .unwrap_or(trimmed)
}

/// Look up `local` in a JSON-LD node under any spelling of the namespace.
pub fn get<'a>(node: &'a Value, ns: &Namespace, local: &str) -> Option<&'a Value> {
    let map = node.as_object()?;
    map.get(local)
        .or_else(|| map.get(&format!("{}:{}", ns.prefix, local)))
        .or_else(|| map.get(&format!("{}{}", ns.iri, local)))
}

/// String form of a JSON-LD value: a plain string, `{"@id": ..}` or `{"@value": ..}`.
pub fn as_text(value: &Value) -> Option<&str> {
    match value {
        Value::String(s) => Some(s.as_str()),
        Value::Object(m) => m
            .get("@id")
            .or_else(|| m.get("@value"))
            .and_then(Value::as_str),
        Value::Array(items) => items.first().and_then(as_text),
        _ => None,
    }
}

/// `@type` of a node as a list of strings.
pub fn types(node: &Value) -> Vec<&str> {
    match node.get("@type") {
        Some(Value::String(s)) => vec![s.as_str()],
        Some(Value::Array(items)) => items.iter().filter_map(Value::as_str).collect(),
        _ => Vec::new(),
    }
}
