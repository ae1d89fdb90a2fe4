//! Hydrus: a Hydra/JSON-LD CRUD server over an RDF-style graph store.

pub mod config;
pub mod doc;
pub mod error;
pub mod handlers;
pub mod model;
pub mod response;
pub mod routes;
pub mod service;
pub mod state;
pub mod store;

pub use config::{Settings, StoreBackend};
pub use doc::{import_document, ImportReport};
pub use error::{AppError, ConfigError, CrudError, ImportError};
pub use routes::{api_routes, build_router, common_routes};
pub use service::CrudService;
pub use state::AppState;
pub use store::{ensure_database_exists, GraphStore, MemoryStore, PgStore};
