use crate::domain::error::DomainError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub password_hash: String,
}

/// A user row that has not been assigned an id yet.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserCreate {
    pub email: String,
    pub password: String,
}

impl UserCreate {
    pub fn validate(&self) -> Result<(), DomainError> {
        if !is_plausible_email(&self.email) {
            return Err(DomainError::Validation(format!(
                "Invalid email address: {}",
                self.email
            )));
        }
        if self.password.is_empty() {
            return Err(DomainError::Validation(
                "Password must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserLogin {
    pub email: String,
    pub password: String,
}

// One '@' with something on both sides; deliverability is not our problem.
fn is_plausible_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.is_empty()
                && !domain.contains('@')
                && !email.chars().any(char::is_whitespace)
        }
        None => false,
    }
}
