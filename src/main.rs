use actix_web::{App, HttpServer, web};
use ai_notes_api::data::note_repository::InMemoryNoteRepository;
use ai_notes_api::data::postgres::{self, PgRepository};
use ai_notes_api::data::user_repository::InMemoryUserRepository;
use ai_notes_api::domain::inference::Pipelines;
use ai_notes_api::domain::repository::{NoteRepository, UserRepository};
use ai_notes_api::infrastructure::config::{AppConfig, InferenceBackend};
use ai_notes_api::infrastructure::huggingface::build_pipelines;
use ai_notes_api::infrastructure::logging::init_logging;
use ai_notes_api::presentation::handlers::AppState;
use ai_notes_api::presentation::middleware::{
    JwtAuthMiddleware, RequestIdMiddleware, TimingMiddleware,
};
use ai_notes_api::presentation::routes::{self, ROUTE_SUMMARY};
use std::sync::Arc;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env()?;
    init_logging(config.log_format);
    info!(bind_addr = %config.bind_addr, "Configuration loaded");

    let users: Arc<dyn UserRepository>;
    let notes: Arc<dyn NoteRepository>;
    match &config.database {
        Some(db) => {
            let repository = PgRepository::new(postgres::connect(db).await?);
            users = Arc::new(repository.clone());
            notes = Arc::new(repository);
        }
        None => {
            warn!("DATABASE_URL not set, data will not survive a restart");
            let memory_users = InMemoryUserRepository::new();
            notes = Arc::new(InMemoryNoteRepository::new(memory_users.clone()));
            users = Arc::new(memory_users);
        }
    }

    let pipelines = match config.inference.backend {
        InferenceBackend::HuggingFace => build_pipelines(&config.inference)?,
        InferenceBackend::Mock => {
            warn!("Using mock inference pipelines");
            Pipelines::mock()
        }
    };
    info!(
        grammar = %config.inference.grammar_model,
        summary = %config.inference.summary_model,
        writing = %config.inference.writing_model,
        "Inference pipelines ready"
    );

    let state = web::Data::new(AppState::new(
        users,
        notes,
        pipelines,
        config.auth.clone(),
    ));

    let jwt_secret = config.auth.jwt_secret.clone();
    let cors_origin = config.cors_origin.clone();
    let server = HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(JwtAuthMiddleware::new(jwt_secret.clone()))
            .wrap(TimingMiddleware)
            .wrap(RequestIdMiddleware)
            .wrap(routes::cors(&cors_origin))
            .configure(routes::configure)
    })
    .bind(config.bind_addr.as_str())?;

    info!(
        address = %config.bind_addr,
        cors_origin = %config.cors_origin,
        routes = %ROUTE_SUMMARY,
        "Starting HTTP server"
    );
    server.run().await?;
    Ok(())
}
