//! Documentation routes: entry point, vocab, JSON-LD contexts.

use crate::handlers::vocab::{entry_point, get_context, get_vocab, post_vocab};
use crate::state::AppState;
use axum::{routing::get, Router};

pub fn vocab_routes(state: AppState) -> Router {
    Router::new()
        .route("/", get(entry_point))
        .route("/vocab", get(get_vocab).post(post_vocab))
        .route("/contexts/:file", get(get_context))
        .with_state(state)
}
