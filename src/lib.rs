pub mod domain {
    pub mod error;
    pub mod inference;
    pub mod note;
    pub mod repository;
    pub mod user;
    pub mod writing;
}

pub mod application {
    pub mod auth_service;
    pub mod note_service;
    pub mod writing_service;
}

pub mod data {
    pub mod note_repository;
    pub mod postgres;
    pub mod user_repository;
}

pub mod infrastructure {
    pub mod config;
    pub mod huggingface;
    pub mod logging;
    pub mod mock_pipeline;
    pub mod security;
}

pub mod presentation {
    pub mod auth;
    pub mod handlers;
    pub mod middleware;
    pub mod routes;
}
