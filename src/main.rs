use chalkboard::routes;
use chalkboard::state::AppState;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let port: u16 = std::env::var("PORT")
        .unwrap_or_else(|_| "12345".into())
        .parse()
        .expect("invalid PORT");

    let state = AppState::new();
    let app = routes::app(state);
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}"))
        .await
        .expect("failed to bind");

    tracing::info!(%port, "chalkboard relay listening");
    axum::serve(listener, app).await.expect("server failed");
}
