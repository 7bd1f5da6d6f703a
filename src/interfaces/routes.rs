use actix_web::web;

use crate::handlers::{home::home, system::health_check};
use crate::upload::UploadRules;

mod cities;
mod media;
mod json_error;

pub use json_error::ExtractorError;

pub fn configure_routes(cfg: &mut web::ServiceConfig, upload_rules: &UploadRules) {
    cfg.service(home);

    cfg.service(
        web::scope("/api/v1")
            .service(health_check)
            .configure(cities::config_routes)
            .configure(|cfg| media::config_routes(cfg, upload_rules))
    );

    cfg.configure(json_error::config_routes);
}
