use actix_web::web;

use crate::handlers::cities;

pub fn config_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/cities")
            .service(
                web::resource("")
                    .route(web::post().to(cities::register_city))
                    .route(web::get().to(cities::list_cities))
            )
            .service(
                web::resource("/{city_id}")
                    .route(web::delete().to(cities::delete_city))
            )
            .service(
                web::resource("/{city_id}/carousel")
                    .route(web::get().to(cities::city_carousel))
            )
    );
}
