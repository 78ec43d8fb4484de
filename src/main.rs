use anyhow::Result;
use axum::Router;
use picstream::{AppState, accounts, db, feed, follows, posts};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("picstream=info,tower_http=info")),
        )
        .init();

    let db_url = dotenv::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://picstream.db".to_owned());
    let db_pool = db::connect(&db_url).await?;
    db::apply_schema(&db_pool).await?;

    let app = Router::new()
        .nest("/accounts", accounts::router())
        .nest("/follow", follows::router())
        .nest("/posts", posts::router())
        .nest("/feed", feed::router())
        .with_state(AppState { db_pool })
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr = dotenv::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_owned());
    tracing::info!(%addr, "listening");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
