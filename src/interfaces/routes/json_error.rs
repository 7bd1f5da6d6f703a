use actix_multipart::MultipartError;
use actix_web::{
    web,
    http::StatusCode,
    ResponseError,
    HttpResponse,
    error::{JsonPayloadError, PathError, QueryPayloadError},
};
use serde_json::json;

/// Turns extractor failures (malformed JSON, bad path ids, bad query strings)
/// into the same `{"error": ...}` body the handlers return.
pub fn config_routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(|err, _req| {
        ExtractorError::from(err).into()
    }));
    cfg.app_data(web::PathConfig::default().error_handler(|err, _req| {
        ExtractorError::from(err).into()
    }));
    cfg.app_data(web::QueryConfig::default().error_handler(|err, _req| {
        ExtractorError::from(err).into()
    }));
}

#[derive(Debug)]
pub struct ExtractorError {
    message: String,
    status: StatusCode
}

impl std::fmt::Display for ExtractorError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl ResponseError for ExtractorError {
    fn status_code(&self) -> StatusCode {
        self.status
    }

    fn error_response(&self) -> HttpResponse<actix_web::body::BoxBody> {
        HttpResponse::build(self.status).json(json!({ "error": self.message }))
    }
}

impl ExtractorError {
    fn bad_request(message: String) -> Self {
        ExtractorError {
            message,
            status: StatusCode::BAD_REQUEST,
        }
    }
}

impl From<JsonPayloadError> for ExtractorError {
    fn from(err: JsonPayloadError) -> Self {
        ExtractorError::bad_request(format!("JSON payload error: {}", err))
    }
}

impl From<PathError> for ExtractorError {
    fn from(err: PathError) -> Self {
        ExtractorError::bad_request(format!("Invalid path parameter: {}", err))
    }
}

impl From<QueryPayloadError> for ExtractorError {
    fn from(err: QueryPayloadError) -> Self {
        ExtractorError::bad_request(format!("Invalid query string: {}", err))
    }
}

impl From<MultipartError> for ExtractorError {
    fn from(err: MultipartError) -> Self {
        ExtractorError {
            status: err.status_code(),
            message: format!("Upload form error: {}", err),
        }
    }
}
