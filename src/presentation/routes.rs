use crate::presentation::auth::{login, signup};
use crate::presentation::handlers::{
    ApiError, correct_grammar, create_note, delete_note, generate_assist, health_check, home,
    list_notes,
};
use actix_cors::Cors;
use actix_web::web;

pub const ROUTE_SUMMARY: &str = "GET /, GET /health, POST /signup, POST /login, GET /notes/, \
POST /notes/, DELETE /notes/{id}, POST /correct/, POST /assist/";

/// Registers every route plus the extractor configs that turn malformed
/// bodies and paths into 400 responses.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::JsonConfig::default()
            .error_handler(|err, _req| ApiError::Validation(err.to_string()).into()),
    )
    .app_data(
        web::PathConfig::default()
            .error_handler(|err, _req| ApiError::Validation(err.to_string()).into()),
    )
    .route("/", web::get().to(home))
    .route("/health", web::get().to(health_check))
    .route("/signup", web::post().to(signup))
    .route("/login", web::post().to(login))
    .route("/notes/", web::get().to(list_notes))
    .route("/notes/", web::post().to(create_note))
    .route("/notes/{id}", web::delete().to(delete_note))
    .route("/correct/", web::post().to(correct_grammar))
    .route("/assist/", web::post().to(generate_assist));
}

/// CORS policy admitting exactly one browser origin.
pub fn cors(origin: &str) -> Cors {
    Cors::default()
        .allowed_origin(origin)
        .allow_any_method()
        .allow_any_header()
        .expose_headers(["x-request-id", "x-response-time"])
        .supports_credentials()
        .max_age(3600)
}
