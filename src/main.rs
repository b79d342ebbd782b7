use keepintouch::{AppState, ai::AiClient, auth, db};

use sqlx::sqlite::SqlitePoolOptions;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("keepintouch=info")),
        )
        .init();

    let database_url =
        dotenv::var("DATABASE_URL").unwrap_or("sqlite:chat.db?mode=rwc".to_owned());
    let db_pool = SqlitePoolOptions::new()
        .max_connections(16)
        .connect(&database_url)
        .await
        .unwrap();
    db::init_schema(&db_pool).await.unwrap();

    let ai = AiClient::from_env().unwrap();
    if ai.probe().await {
        tracing::info!("Gemini API status: connected");
    } else {
        tracing::info!("Gemini API status: using fallback responses");
    }

    let state = AppState {
        db_pool,
        ai,
        keys: auth::Keys::from_env(),
    };
    let app = keepintouch::app(state);

    let port: u16 = dotenv::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(3000);
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port)).await.unwrap();
    tracing::info!("Keep in Touch server listening on port {port}");
    axum::serve(listener, app).await.unwrap();
}
