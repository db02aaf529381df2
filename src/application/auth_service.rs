use crate::domain::error::DomainError;
use crate::domain::repository::UserRepository;
use crate::domain::user::{NewUser, User, UserCreate, UserLogin};
use crate::infrastructure::config::AuthConfig;
use crate::infrastructure::security::{generate_token, hash_password, verify_password};
use anyhow::Result;
use std::sync::Arc;
use tracing::{debug, error, info, instrument, trace, warn};

const INVALID_CREDENTIALS: &str = "Invalid credentials";

pub struct AuthService {
    user_repository: Arc<dyn UserRepository>,
    config: AuthConfig,
}

impl AuthService {
    pub fn new(user_repository: Arc<dyn UserRepository>, config: AuthConfig) -> Self {
        Self {
            user_repository,
            config,
        }
    }

    #[instrument(skip(self, req), fields(email = %req.email))]
    pub async fn signup(&self, req: UserCreate) -> Result<User> {
        trace!("Starting user registration");
        req.validate()?;

        if self
            .user_repository
            .find_user_by_email(&req.email)
            .await?
            .is_some()
        {
            warn!(email = %req.email, "Email already registered");
            return Err(DomainError::Conflict("Email already registered".to_string()).into());
        }

        let password_hash = hash_password(&req.password).map_err(|e| {
            error!(error = %e, "Failed to hash password");
            DomainError::Internal(format!("Failed to hash password: {}", e))
        })?;

        debug!(email = %req.email, "Saving user to repository");
        // The repository re-checks uniqueness, so a concurrent signup still
        // loses with Conflict.
        let user = self
            .user_repository
            .create_user(NewUser {
                email: req.email,
                password_hash,
            })
            .await?;

        info!(user_id = user.id, email = %user.email, "User registered successfully");
        Ok(user)
    }

    #[instrument(skip(self, req), fields(email = %req.email))]
    pub async fn login(&self, req: UserLogin) -> Result<String> {
        trace!("Starting login");

        let user = self
            .user_repository
            .find_user_by_email(&req.email)
            .await?
            .ok_or_else(|| {
                warn!(email = %req.email, "User not found during login");
                DomainError::Unauthorized(INVALID_CREDENTIALS.to_string())
            })?;

        let is_valid = verify_password(&req.password, &user.password_hash).map_err(|e| {
            error!(error = %e, "Failed to verify password");
            DomainError::Internal(format!("Failed to verify password: {}", e))
        })?;

        if !is_valid {
            warn!(user_id = user.id, email = %user.email, "Invalid password during login");
            return Err(DomainError::Unauthorized(INVALID_CREDENTIALS.to_string()).into());
        }

        let token =
            generate_token(&user.email, &self.config.jwt_secret, self.config.token_ttl).map_err(
                |e| {
                    error!(error = %e, "Failed to generate token");
                    DomainError::Internal(format!("Failed to generate token: {}", e))
                },
            )?;

        info!(user_id = user.id, email = %user.email, "Login successful");
        Ok(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::user_repository::InMemoryUserRepository;
    use crate::infrastructure::security::validate_token;
    use chrono::Duration;

    fn service() -> AuthService {
        AuthService::new(
            Arc::new(InMemoryUserRepository::new()),
            AuthConfig {
                jwt_secret: "auth-service-secret".to_string(),
                token_ttl: Duration::minutes(60),
            },
        )
    }

    fn creds(email: &str, password: &str) -> (UserCreate, UserLogin) {
        (
            UserCreate {
                email: email.to_string(),
                password: password.to_string(),
            },
            UserLogin {
                email: email.to_string(),
                password: password.to_string(),
            },
        )
    }

    fn domain_error(err: &anyhow::Error) -> Option<&DomainError> {
        err.downcast_ref::<DomainError>()
    }

    #[tokio::test]
    async fn test_signup_stores_hash_not_password() {
        let service = service();
        let (signup, _) = creds("a@x.com", "pw");

        let user = service.signup(signup).await.unwrap();
        assert_eq!(user.email, "a@x.com");
        assert_ne!(user.password_hash, "pw");
        assert!(user.password_hash.starts_with("$argon2id$"));
    }

    #[tokio::test]
    async fn test_signup_twice_conflicts() {
        let service = service();
        service.signup(creds("a@x.com", "pw").0).await.unwrap();

        let err = service.signup(creds("a@x.com", "other").0).await.unwrap_err();
        assert!(matches!(domain_error(&err), Some(DomainError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_signup_distinct_emails_both_succeed() {
        let service = service();
        assert!(service.signup(creds("a@x.com", "pw").0).await.is_ok());
        assert!(service.signup(creds("b@x.com", "pw").0).await.is_ok());
    }

    #[tokio::test]
    async fn test_signup_rejects_invalid_input() {
        let service = service();
        let err = service.signup(creds("nope", "pw").0).await.unwrap_err();
        assert!(matches!(domain_error(&err), Some(DomainError::Validation(_))));
    }

    #[tokio::test]
    async fn test_login_issues_token_for_email() {
        let service = service();
        let (signup, login) = creds("a@x.com", "pw");
        service.signup(signup).await.unwrap();

        let token = service.login(login).await.unwrap();
        let subject = validate_token(&token, &service.config.jwt_secret).unwrap();
        assert_eq!(subject, "a@x.com");
    }

    #[tokio::test]
    async fn test_login_wrong_password_and_unknown_user_look_the_same() {
        let service = service();
        service.signup(creds("a@x.com", "pw").0).await.unwrap();

        let wrong = service.login(creds("a@x.com", "pw2").1).await.unwrap_err();
        let unknown = service.login(creds("b@x.com", "pw").1).await.unwrap_err();

        for err in [wrong, unknown] {
            assert!(matches!(
                domain_error(&err),
                Some(DomainError::Unauthorized(msg)) if msg == INVALID_CREDENTIALS
            ));
        }
    }
}
