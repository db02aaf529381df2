use argon2::Argon2;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use rand_core::OsRng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// Argon2 parameters for 50-150ms target latency
const ARGON2_M_COST: u32 = 19456; // 19 MB
const ARGON2_T_COST: u32 = 2; // 2 iterations
const ARGON2_P_COST: u32 = 1; // 1 parallelism

const TOKEN_LEEWAY_SECS: u64 = 60;

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String, // user email
    exp: i64,
    iat: i64,
}

/// Why a request's credential was rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("Missing token")]
    MissingToken,
    #[error("Invalid token scheme")]
    InvalidScheme,
    #[error("Invalid token")]
    InvalidToken,
}

fn argon2() -> Result<Argon2<'static>, argon2::password_hash::Error> {
    let params = argon2::Params::new(ARGON2_M_COST, ARGON2_T_COST, ARGON2_P_COST, None)
        .map_err(argon2::password_hash::Error::from)?;
    Ok(Argon2::new(
        argon2::Algorithm::Argon2id,
        argon2::Version::V0x13,
        params,
    ))
}

pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let password_hash = argon2()?.hash_password(password.as_bytes(), &salt)?;
    Ok(password_hash.to_string())
}

pub fn verify_password(password: &str, hash: &str) -> Result<bool, argon2::password_hash::Error> {
    let parsed_hash = PasswordHash::new(hash)?;

    match argon2()?.verify_password(password.as_bytes(), &parsed_hash) {
        Ok(()) => Ok(true),
        Err(_) => Ok(false),
    }
}

/// Issues an HS256 token for `subject` that expires `ttl` from now.
pub fn generate_token(
    subject: &str,
    secret: &str,
    ttl: Duration,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = Utc::now();
    let expires_at = now
        .checked_add_signed(ttl)
        .ok_or_else(|| jsonwebtoken::errors::Error::from(ErrorKind::InvalidToken))?;

    let claims = Claims {
        sub: subject.to_string(),
        exp: expires_at.timestamp(),
        iat: now.timestamp(),
    };

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_ref()),
    )
}

pub fn validate_token(token: &str, secret: &str) -> Result<String, jsonwebtoken::errors::Error> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = TOKEN_LEEWAY_SECS;
    validation.set_required_spec_claims(&["exp", "sub"]);

    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_ref()),
        &validation,
    )?;

    Ok(token_data.claims.sub)
}

/// Resolves the identity carried by an `Authorization` header value.
pub fn resolve_bearer(header: Option<&str>, secret: &str) -> Result<String, AuthError> {
    let header = header.ok_or(AuthError::MissingToken)?;
    let (scheme, token) = header.split_once(' ').unwrap_or((header, ""));
    let token = token.trim();

    if !scheme.eq_ignore_ascii_case("bearer") || token.is_empty() {
        return Err(AuthError::InvalidScheme);
    }

    validate_token(token, secret).map_err(|_| AuthError::InvalidToken)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hour() -> Duration {
        Duration::hours(1)
    }

    #[test]
    fn test_hash_password_generates_valid_hash() {
        let password = "test_password_123";
        let hash = hash_password(password).unwrap();

        assert!(!hash.is_empty());
        assert_ne!(hash, password);
        assert!(hash.starts_with("$argon2id$"));
    }

    #[test]
    fn test_hash_password_same_password_produces_different_hashes() {
        let password = "same_password";

        let hash1 = hash_password(password).unwrap();
        let hash2 = hash_password(password).unwrap();

        // Random salt
        assert_ne!(hash1, hash2);
    }

    #[test]
    fn test_verify_password_correct_password_returns_true() {
        let hash = hash_password("correct_password").unwrap();
        assert!(verify_password("correct_password", &hash).unwrap());
    }

    #[test]
    fn test_verify_password_incorrect_password_returns_false() {
        let hash = hash_password("correct_password").unwrap();
        assert!(!verify_password("wrong_password", &hash).unwrap());
        assert!(!verify_password("Correct_password", &hash).unwrap());
        assert!(!verify_password("", &hash).unwrap());
    }

    #[test]
    fn test_verify_password_invalid_hash_format() {
        let result = verify_password("test_password", "not_a_valid_hash");
        assert!(result.is_err());
    }

    #[test]
    fn test_verify_password_with_unicode() {
        let password = "пароль123";
        let hash = hash_password(password).unwrap();
        assert!(verify_password(password, &hash).unwrap());
    }

    #[test]
    fn test_generate_token_creates_three_part_jwt() {
        let token = generate_token("a@x.com", "test_secret_key", hour()).unwrap();
        assert_eq!(token.split('.').count(), 3);
    }

    #[test]
    fn test_token_round_trip() {
        let token = generate_token("round@trip.com", "round_trip_secret", hour()).unwrap();
        let subject = validate_token(&token, "round_trip_secret").unwrap();
        assert_eq!(subject, "round@trip.com");
    }

    #[test]
    fn test_validate_token_rejects_invalid_token() {
        assert!(validate_token("invalid.token.here", "secret_key").is_err());
    }

    #[test]
    fn test_validate_token_rejects_token_with_wrong_secret() {
        let token = generate_token("a@x.com", "correct_secret", hour()).unwrap();
        assert!(validate_token(&token, "wrong_secret").is_err());
    }

    #[test]
    fn test_generate_token_with_unrepresentable_expiry_is_an_error() {
        assert!(generate_token("a@x.com", "secret", Duration::MAX).is_err());
        assert!(generate_token("a@x.com", "secret", Duration::days(365 * 500_000)).is_err());
    }

    #[test]
    fn test_validate_token_rejects_expired_token() {
        let token = generate_token("a@x.com", "secret", Duration::hours(-2)).unwrap();
        let err = validate_token(&token, "secret").unwrap_err();
        assert!(matches!(
            err.kind(),
            jsonwebtoken::errors::ErrorKind::ExpiredSignature
        ));
    }

    #[test]
    fn test_validate_token_tolerates_leeway() {
        let token = generate_token("a@x.com", "secret", Duration::seconds(-10)).unwrap();
        assert_eq!(validate_token(&token, "secret").unwrap(), "a@x.com");
    }

    #[test]
    fn test_resolve_bearer_accepts_valid_header() {
        let token = generate_token("a@x.com", "secret", hour()).unwrap();
        let header = format!("Bearer {}", token);
        assert_eq!(resolve_bearer(Some(&header), "secret").unwrap(), "a@x.com");
    }

    #[test]
    fn test_resolve_bearer_scheme_is_case_insensitive() {
        let token = generate_token("a@x.com", "secret", hour()).unwrap();
        let header = format!("bearer {}", token);
        assert_eq!(resolve_bearer(Some(&header), "secret").unwrap(), "a@x.com");
    }

    #[test]
    fn test_resolve_bearer_missing_header() {
        assert_eq!(resolve_bearer(None, "secret"), Err(AuthError::MissingToken));
    }

    #[test]
    fn test_resolve_bearer_malformed_header() {
        let token = generate_token("a@x.com", "secret", hour()).unwrap();
        assert_eq!(
            resolve_bearer(Some(&token), "secret"),
            Err(AuthError::InvalidScheme)
        );
        assert_eq!(
            resolve_bearer(Some(&format!("Basic {}", token)), "secret"),
            Err(AuthError::InvalidScheme)
        );
        assert_eq!(
            resolve_bearer(Some("Bearer "), "secret"),
            Err(AuthError::InvalidScheme)
        );
    }

    #[test]
    fn test_resolve_bearer_expired_or_forged() {
        let expired = generate_token("a@x.com", "secret", Duration::hours(-2)).unwrap();
        assert_eq!(
            resolve_bearer(Some(&format!("Bearer {}", expired)), "secret"),
            Err(AuthError::InvalidToken)
        );

        let forged = generate_token("a@x.com", "other", hour()).unwrap();
        assert_eq!(
            resolve_bearer(Some(&format!("Bearer {}", forged)), "secret"),
            Err(AuthError::InvalidToken)
        );
    }
}
