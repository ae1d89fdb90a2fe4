//! Document importer: Hydra ApiDocumentation or OWL/RDFS vocabularies into
//! class and property definitions.

pub mod context;
pub mod hydra;
pub mod owl;
pub mod validator;
pub mod vocab;

pub use validator::validate;

use crate::error::{AppError, ImportError};
use crate::model::{Property, RdfClass, StoredDocument};
use crate::service::{define_classes, define_properties};
use crate::store::GraphStore;
use serde::Serialize;
use serde_json::Value;

#[derive(Clone, Debug, Default)]
pub struct ParsedVocabulary {
    pub classes: Vec<RdfClass>,
    pub properties: Vec<Property>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    Hydra,
    Owl,
}

#[derive(Clone, Debug, Serialize)]
pub struct ImportReport {
    pub kind: DocumentKind,
    pub classes_added: u64,
    pub properties_added: u64,
    /// Version of the stored ApiDocumentation; Hydra documents only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<i64>,
}

pub fn parse_document(doc: &Value) -> Result<(DocumentKind, ParsedVocabulary), ImportError> {
    if !doc.is_object() {
        return Err(ImportError::NotAnObject);
    }
    let (kind, parsed) = if hydra::is_api_documentation(doc) {
        (DocumentKind::Hydra, hydra::parse(doc)?)
    } else if owl::is_owl_graph(doc) {
        (DocumentKind::Owl, owl::parse(doc)?)
    } else {
        return Err(ImportError::UnknownFormat);
    };
    validate(&parsed)?;
    Ok((kind, parsed))
}

/// Parse, validate and store a document's definitions in one transaction.
pub async fn import_document(store: &dyn GraphStore, doc: &Value) -> Result<ImportReport, AppError> {
    let (kind, parsed) = parse_document(doc)?;
    let mut tx = store.begin().await?;
    let classes_added = define_classes(tx.as_mut(), &parsed.classes).await?;
    let properties_added = define_properties(tx.as_mut(), &parsed.properties).await?;
    let version = match kind {
        DocumentKind::Hydra => Some(tx.save_document(doc).await?),
        DocumentKind::Owl => None,
    };
    tx.commit().await?;
    tracing::info!(
        kind = ?kind,
        classes = parsed.classes.len(),
        classes_added,
        properties_added,
        "document imported"
    );
    Ok(ImportReport {
        kind,
        classes_added,
        properties_added,
        version,
    })
}

pub async fn stored_document(store: &dyn GraphStore) -> Result<Option<StoredDocument>, AppError> {
    let mut tx = store.begin().await?;
    Ok(tx.latest_document().await?)
}
