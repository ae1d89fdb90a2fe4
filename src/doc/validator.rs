//! Vocabulary validation: every class and property named once.

use crate::doc::ParsedVocabulary;
use crate::error::ImportError;
use std::collections::HashSet;

pub fn validate(vocabulary: &ParsedVocabulary) -> Result<(), ImportError> {
    let mut class_names = HashSet::new();
    for c in &vocabulary.classes {
        if c.name.is_empty() {
            return Err(ImportError::MissingName {
                kind: "class",
                id: String::new(),
            });
        }
        if !class_names.insert(c.name.as_str()) {
            return Err(ImportError::Duplicate {
                kind: "class",
                name: c.name.clone(),
            });
        }
    }

    let mut property_names = HashSet::new();
    for p in &vocabulary.properties {
        if p.name.is_empty() {
            return Err(ImportError::MissingName {
                kind: "property",
                id: String::new(),
            });
        }
        if !property_names.insert(p.name.as_str()) {
            return Err(ImportError::Duplicate {
                kind: "property",
                name: p.name.clone(),
            });
        }
    }

    Ok(())
}
