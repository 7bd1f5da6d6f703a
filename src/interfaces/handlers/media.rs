use actix_multipart::form::MultipartForm;
use actix_web::{web, HttpResponse, Responder};
use serde::Deserialize;
use tracing::instrument;

use crate::{entities::media::MediaUpload, errors::AppError, AppState};

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub q: Option<String>,
}

#[instrument(skip(state, form))]
pub async fn upload_media(
    state: web::Data<AppState>,
    MultipartForm(form): MultipartForm<MediaUpload>,
) -> Result<impl Responder, AppError> {
    let created = state.media_handler.upload(form).await?;

    Ok(HttpResponse::Created().json(created))
}

#[instrument(skip(state))]
pub async fn search_media(
    state: web::Data<AppState>,
    params: web::Query<SearchParams>,
) -> Result<impl Responder, AppError> {
    let result = state.search_handler.search(params.q.as_deref()).await?;

    Ok(HttpResponse::Ok().json(result))
}

#[instrument(skip(state))]
pub async fn media_detail(
    state: web::Data<AppState>,
    media_id: web::Path<i64>,
) -> Result<impl Responder, AppError> {
    let detail = state.media_handler.detail(media_id.into_inner()).await?;

    Ok(HttpResponse::Ok().json(detail))
}

#[instrument(skip(state))]
pub async fn delete_media(
    state: web::Data<AppState>,
    media_id: web::Path<i64>,
) -> Result<impl Responder, AppError> {
    state.media_handler.delete(media_id.into_inner()).await?;

    Ok(HttpResponse::NoContent().finish())
}
