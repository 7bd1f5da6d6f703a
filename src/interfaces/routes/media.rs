use actix_multipart::form::MultipartFormConfig;
use actix_web::web;

use crate::constants::MULTIPART_OVERHEAD_BYTES;
use crate::handlers::media;
use crate::routes::ExtractorError;
use crate::upload::UploadRules;

pub fn config_routes(cfg: &mut web::ServiceConfig, upload_rules: &UploadRules) {
    // oversized files must reach the validator so the client sees the per-type limit
    let total_limit = usize::try_from(upload_rules.max_upload_bytes())
        .unwrap_or(usize::MAX)
        .saturating_add(MULTIPART_OVERHEAD_BYTES);

    cfg.service(
        web::scope("/media")
            .app_data(
                MultipartFormConfig::default()
                    .total_limit(total_limit)
                    .memory_limit(MULTIPART_OVERHEAD_BYTES)
                    .error_handler(|err, _req| ExtractorError::from(err).into())
            )
            .service(
                web::resource("")
                    .route(web::post().to(media::upload_media))
                    .route(web::get().to(media::search_media))
            )
            .service(
                web::resource("/{media_id}")
                    .route(web::get().to(media::media_detail))
                    .route(web::delete().to(media::delete_media))
            )
    );
}
