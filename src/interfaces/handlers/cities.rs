use actix_web::{web, HttpResponse, Responder};
use serde::Deserialize;
use tracing::instrument;

use crate::{
    entities::city::{CityListResponse, NewCityRequest},
    errors::AppError,
    AppState,
};

#[derive(Debug, Deserialize)]
pub struct DeleteCityParams {
    #[serde(default)]
    pub purge: bool,
}

#[instrument(skip(state, data))]
pub async fn register_city(
    state: web::Data<AppState>,
    data: web::Json<NewCityRequest>,
) -> Result<impl Responder, AppError> {
    let registration = state.city_handler.register(data.into_inner()).await?;

    let mut response = if registration.created {
        HttpResponse::Created()
    } else {
        HttpResponse::Ok()
    };
    Ok(response.json(registration))
}

#[instrument(skip(state))]
pub async fn list_cities(state: web::Data<AppState>) -> Result<impl Responder, AppError> {
    let cities = state.city_handler.list_active_with_counts().await?;

    Ok(HttpResponse::Ok().json(CityListResponse {
        total: cities.len(),
        cities,
    }))
}

#[instrument(skip(state))]
pub async fn city_carousel(
    state: web::Data<AppState>,
    city_id: web::Path<i64>,
) -> Result<impl Responder, AppError> {
    let carousel = state.city_handler.carousel(city_id.into_inner()).await?;

    Ok(HttpResponse::Ok().json(carousel))
}

/// Deactivates by default; `?purge=true` removes the city and its media for good.
#[instrument(skip(state, params))]
pub async fn delete_city(
    state: web::Data<AppState>,
    city_id: web::Path<i64>,
    params: web::Query<DeleteCityParams>,
) -> Result<impl Responder, AppError> {
    let city_id = city_id.into_inner();

    if params.purge {
        state.city_handler.purge(city_id).await?;
    } else {
        state.city_handler.deactivate(city_id).await?;
    }

    Ok(HttpResponse::NoContent().finish())
}
