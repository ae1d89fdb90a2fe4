use hydrus::{
    build_router, ensure_database_exists, import_document, AppState, GraphStore, MemoryStore, PgStore, Settings,
    StoreBackend,
};
use std::sync::Arc;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("hydrus=info")),
        )
        .init();

    let settings = Settings::from_env()?;

    let store: Arc<dyn GraphStore> = match settings.store {
        StoreBackend::Postgres => {
            ensure_database_exists(&settings.database_url).await?;
            let pool = sqlx::postgres::PgPoolOptions::new()
                .max_connections(settings.max_connections)
                .connect(&settings.database_url)
                .await?;
            let store = PgStore::new(pool, &settings.schema);
            store.ensure_tables().await?;
            Arc::new(store)
        }
        StoreBackend::Memory => {
            tracing::warn!("using in-memory store; data is lost on exit");
            Arc::new(MemoryStore::new())
        }
    };

    if let Some(path) = &settings.doc_path {
        let raw = tokio::fs::read(path).await?;
        let document: serde_json::Value = serde_json::from_slice(&raw)?;
        let report = import_document(store.as_ref(), &document).await?;
        tracing::info!(
            path = %path.display(),
            classes = report.classes_added,
            properties = report.properties_added,
            "imported API documentation"
        );
    }

    let state = AppState::new(store, &settings.api_name);
    let app = build_router(state, settings.body_limit);
    let listener = TcpListener::bind(settings.bind).await?;
    tracing::info!(
        "Hydrus listening on http://{}/{}",
        listener.local_addr()?,
        settings.api_name
    );
    axum::serve(listener, app).await?;
    Ok(())
}
