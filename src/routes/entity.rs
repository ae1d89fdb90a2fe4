//! Instance routes. `/:name` only serves `{Class}Collection`; handlers 404 on anything else.

use crate::handlers::entity::{create, create_with_id, delete as delete_handler, list, read, update};
use crate::state::AppState;
use axum::{routing::get, Router};

pub fn entity_routes(state: AppState) -> Router {
    Router::new()
        .route("/:name", get(list).put(create))
        .route(
            "/:name/:id",
            get(read).put(create_with_id).post(update).delete(delete_handler),
        )
        .with_state(state)
}
