use crate::domain::user::{UserCreate, UserLogin};
use crate::presentation::handlers::{ApiError, AppState};
use actix_web::{HttpResponse, web};
use serde::Serialize;
use tracing::{error, info, instrument};

#[derive(Serialize)]
pub struct SignupResponse {
    pub message: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: String,
}

#[instrument(skip(state, req), fields(email = %req.email))]
pub async fn signup(
    state: web::Data<AppState>,
    req: web::Json<UserCreate>,
) -> Result<HttpResponse, ApiError> {
    info!("Signup request received");

    let user = state
        .auth_service
        .signup(req.into_inner())
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to register user");
            ApiError::from(e)
        })?;

    info!(user_id = user.id, "User registered successfully");
    Ok(HttpResponse::Ok().json(SignupResponse {
        message: "User created successfully".to_string(),
    }))
}

#[instrument(skip(state, req), fields(email = %req.email))]
pub async fn login(
    state: web::Data<AppState>,
    req: web::Json<UserLogin>,
) -> Result<HttpResponse, ApiError> {
    info!("Login request received");

    let token = state
        .auth_service
        .login(req.into_inner())
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to login");
            ApiError::from(e)
        })?;

    info!("Login successful");
    Ok(HttpResponse::Ok().json(LoginResponse {
        access_token: token,
        token_type: "bearer".to_string(),
    }))
}
