use actix_web::{get, HttpResponse, Responder};

#[get("/")]
pub async fn home() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "message": "Welcome to the City Gallery API!",
        "status": "Ok",
        "version": env!("CARGO_PKG_VERSION"),
        "cities": "/api/v1/cities",
        "media": "/api/v1/media",
        "health": "/api/v1/health"
    }))
}
