//! Typed errors and HTTP mapping.
//!
//! Domain failures carry the status codes clients key on: 400 duplicate id,
//! 401 undefined class, 402 undefined property, 403 undefined instance,
//! 404 missing resource.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CrudError {
    #[error("Instance with ID : {0} already exists")]
    InstanceExists(String),
    #[error("The class {0} is not a valid/defined RDFClass")]
    InvalidClass(String),
    #[error("The property {0} is not a valid/defined Property")]
    InvalidProperty(String),
    #[error("The instance {0} is not a valid/defined Instance")]
    InvalidInstance(String),
    #[error("Instance with ID : {0} not found")]
    NotFound(String),
    #[error("{0}")]
    Malformed(String),
    #[error("database: {0}")]
    Store(#[from] sqlx::Error),
    #[error("store: {0}")]
    Backend(String),
}

impl CrudError {
    pub fn status_code(&self) -> u16 {
        match self {
            CrudError::InstanceExists(_) | CrudError::Malformed(_) => 400,
            CrudError::InvalidClass(_) => 401,
            CrudError::InvalidProperty(_) => 402,
            CrudError::InvalidInstance(_) => 403,
            CrudError::NotFound(_) => 404,
            CrudError::Store(_) | CrudError::Backend(_) => 500,
        }
    }
}

#[derive(Error, Debug)]
pub enum ImportError {
    #[error("document is not a JSON object")]
    NotAnObject,
    #[error("unrecognised document: expected a hydra:ApiDocumentation or an @graph of OWL/RDFS nodes")]
    UnknownFormat,
    #[error("missing name for {kind} '{id}'")]
    MissingName { kind: &'static str, id: String },
    #[error("duplicate {kind} name: {name}")]
    Duplicate { kind: &'static str, name: String },
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid value for {key}: {message}")]
    Invalid { key: &'static str, message: String },
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Crud(#[from] CrudError),
    #[error(transparent)]
    Import(#[from] ImportError),
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    NotFound(String),
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        AppError::Crud(CrudError::Store(e))
    }
}

impl AppError {
    pub fn status_code(&self) -> u16 {
        match self {
            AppError::Crud(e) => e.status_code(),
            AppError::Import(_) | AppError::BadRequest(_) => 400,
            AppError::NotFound(_) => 404,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let code = self.status_code();
        let status = StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if code >= 500 {
            tracing::error!(error = %self, "request failed");
        }
        let body = crate::response::status_body(code, self.to_string());
        (status, Json(body)).into_response()
    }
}
