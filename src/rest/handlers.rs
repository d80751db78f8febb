use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::{
    service::CarFilter,
    storage::CarStore,
    types::{Car, CarError},
};

use super::{
    models::{CarsQuery, ErrorResponse, HealthResponse},
    AppState,
};

pub async fn health<S: CarStore + Clone + Send + Sync + 'static>(
    State(state): State<AppState<S>>,
) -> impl IntoResponse {
    let uptime_secs = state.started_at.elapsed().map(|d| d.as_secs()).unwrap_or(0);
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "ok".to_string(),
            uptime_secs,
        }),
    )
}

pub async fn list_cars<S: CarStore + Clone + Send + Sync + 'static>(
    State(state): State<AppState<S>>,
    Query(query): Query<CarsQuery>,
) -> Response {
    let filter = CarFilter::from_params(query.model, query.year);
    let service = state.service;
    match run_blocking(move || service.find(&filter)).await {
        Ok(cars) => Json(cars).into_response(),
        Err(err) => error_response(err),
    }
}

/// Answers 200 with an empty body when the id is unknown.
pub async fn get_car<S: CarStore + Clone + Send + Sync + 'static>(
    State(state): State<AppState<S>>,
    Path(id): Path<String>,
) -> Response {
    let service = state.service;
    match run_blocking(move || service.find_by_id(&id)).await {
        Ok(Some(car)) => Json(car).into_response(),
        Ok(None) => StatusCode::OK.into_response(),
        Err(err) => error_response(err),
    }
}

pub async fn create_car<S: CarStore + Clone + Send + Sync + 'static>(
    State(state): State<AppState<S>>,
    Json(car): Json<Car>,
) -> Response {
    let service = state.service;
    match run_blocking(move || service.create(car)).await {
        Ok(car) => Json(car).into_response(),
        Err(err) => error_response(err),
    }
}

pub async fn update_car<S: CarStore + Clone + Send + Sync + 'static>(
    State(state): State<AppState<S>>,
    Json(car): Json<Car>,
) -> Response {
    let service = state.service;
    match run_blocking(move || service.update(car)).await {
        Ok(car) => Json(car).into_response(),
        Err(err) => error_response(err),
    }
}

pub async fn delete_car<S: CarStore + Clone + Send + Sync + 'static>(
    State(state): State<AppState<S>>,
    Json(car): Json<Car>,
) -> Response {
    let service = state.service;
    match run_blocking(move || service.delete(&car)).await {
        Ok(()) => StatusCode::OK.into_response(),
        Err(err) => error_response(err),
    }
}

pub async fn not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse {
            message: "endpoint not found".to_string(),
        }),
    )
}

/// Runs a synchronous storage call on the blocking pool.
async fn run_blocking<T, F>(f: F) -> Result<T, CarError>
where
    F: FnOnce() -> Result<T, CarError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f).await.map_err(|err| {
        CarError::Storage(anyhow::Error::new(err).context("storage task failed"))
    })?
}

fn error_response(err: CarError) -> Response {
    let status = match &err {
        CarError::AlreadyExists(_) => StatusCode::CONFLICT,
        CarError::NotFound(_) => StatusCode::NOT_FOUND,
        CarError::MissingId => StatusCode::BAD_REQUEST,
        CarError::Storage(inner) => {
            log::error!("Car storage failure: {:?}", inner);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    message: "internal storage error".to_string(),
                }),
            )
                .into_response();
        }
    };
    log::warn!("Rejected car request: {}", err);
    (
        status,
        Json(ErrorResponse {
            message: err.to_string(),
        }),
    )
        .into_response()
}
