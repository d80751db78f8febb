use std::net::SocketAddr;

use axum::{routing::get, Router};

use crate::{service::CarsService, storage::CarStore};

mod handlers;
mod models;

use handlers::{create_car, delete_car, get_car, health, list_cars, not_found, update_car};

#[derive(Clone)]
pub struct AppState<S: CarStore> {
    pub service: CarsService<S>,
    pub started_at: std::time::SystemTime,
}

pub fn router<S: CarStore + Clone + Send + Sync + 'static>(service: CarsService<S>) -> Router {
    let state = AppState {
        service,
        started_at: std::time::SystemTime::now(),
    };

    Router::new()
        .route("/health", get(health::<S>))
        .route(
            "/cars",
            get(list_cars::<S>)
                .post(create_car::<S>)
                .put(update_car::<S>)
                .delete(delete_car::<S>),
        )
        .route("/cars/:id", get(get_car::<S>))
        .fallback(not_found)
        .with_state(state)
}

pub async fn serve<S: CarStore + Clone + Send + Sync + 'static>(
    addr: SocketAddr,
    service: CarsService<S>,
    shutdown: tokio_util::sync::CancellationToken,
) -> anyhow::Result<()> {
    let app = router(service);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    log::info!("🌐 REST listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown.cancelled().await;
            log::info!("🛑 REST shutdown requested");
        })
        .await?;
    log::info!("👋 REST server exited");
    Ok(())
}
