use std::net::SocketAddr;

use dotenvy::dotenv;

use roombook::logging::init_tracing;
use roombook::metrics::{init_metrics, metrics_app};
use roombook::router::init_router;
use roombook::state::init_app_state;
use roombook_db::run_migrations;

const DEFAULT_PORT: u16 = 3000;

#[tokio::main]
async fn main() {
    dotenv().ok();
    init_tracing();

    let state = init_app_state().await;

    if let Err(e) = run_migrations(&state.db).await {
        tracing::error!(error = %e, "Failed to apply database migrations");
        std::process::exit(1);
    }

    let mut app = init_router(state);
    if let Some(handle) = init_metrics() {
        app = app.merge(metrics_app(handle));
    }

    let port = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(DEFAULT_PORT);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(error = %e, %addr, "Failed to bind listener");
            std::process::exit(1);
        }
    };

    tracing::info!("Server running on http://localhost:{port}");
    tracing::info!("Swagger UI available at http://localhost:{port}/swagger-ui");
    tracing::info!("Scalar UI available at http://localhost:{port}/scalar");

    if let Err(e) = axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    {
        tracing::error!(error = %e, "Server error");
        std::process::exit(1);
    }
}
