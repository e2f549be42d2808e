//! Signup, login, and the bearer-token gate on the student routes.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::Config;
use crate::db::now_rfc3339;
use crate::error::ApiError;
use crate::state::AppState;

/// Both login failure modes must produce this exact message so a caller
/// cannot tell an unknown email from a wrong password.
const INVALID_CREDENTIALS: &str = "Invalid credentials";

#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
}

pub fn signup(conn: &Connection, config: &Config, req: SignupRequest) -> Result<(), ApiError> {
    let (name, email, password) = match (req.name, req.email, req.password) {
        (Some(n), Some(e), Some(p))
            if !n.trim().is_empty() && !e.trim().is_empty() && !p.is_empty() =>
        {
            (n.trim().to_string(), e.trim().to_string(), p)
        }
        _ => return Err(ApiError::Validation("All fields are required".into())),
    };

    let existing: Option<String> = conn
        .query_row(
            "SELECT id FROM users WHERE email = ?1",
            params![email],
            |row| row.get(0),
        )
        .optional()?;
    if existing.is_some() {
        return Err(ApiError::Conflict("User already exists".into()));
    }

    let hash = bcrypt::hash(&password, config.bcrypt_cost)
        .map_err(|e| ApiError::Internal(e.into()))?;

    conn.execute(
        "INSERT INTO users (id, name, email, password_hash, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![Uuid::new_v4().to_string(), name, email, hash, now_rfc3339()],
    )?;

    Ok(())
}

pub fn login(conn: &Connection, config: &Config, req: LoginRequest) -> Result<String, ApiError> {
    let (email, password) = match (req.email, req.password) {
        (Some(e), Some(p)) if !e.trim().is_empty() && !p.is_empty() => {
            (e.trim().to_string(), p)
        }
        _ => {
            return Err(ApiError::Validation(
                "Email and password are required".into(),
            ))
        }
    };

    let row: Option<(String, String)> = conn
        .query_row(
            "SELECT id, password_hash FROM users WHERE email = ?1",
            params![email],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()?;

    let (user_id, password_hash) = match row {
        Some(r) => r,
        None => return Err(ApiError::Auth(INVALID_CREDENTIALS.into())),
    };

    let ok = bcrypt::verify(&password, &password_hash)
        .map_err(|e| ApiError::Internal(e.into()))?;
    if !ok {
        return Err(ApiError::Auth(INVALID_CREDENTIALS.into()));
    }

    issue_token(config, &user_id)
}

pub fn issue_token(config: &Config, user_id: &str) -> Result<String, ApiError> {
    let now = chrono::Utc::now().timestamp();
    let claims = Claims {
        sub: user_id.to_string(),
        iat: now,
        exp: now + config.token_ttl_hours * 3600,
    };

    jsonwebtoken::encode(
        &jsonwebtoken::Header::default(),
        &claims,
        &jsonwebtoken::EncodingKey::from_secret(config.jwt_secret.as_bytes()),
    )
    .map_err(|e| ApiError::Internal(e.into()))
}

pub fn verify_token(secret: &str, token: &str) -> Result<Claims, ApiError> {
    jsonwebtoken::decode::<Claims>(
        token,
        &jsonwebtoken::DecodingKey::from_secret(secret.as_bytes()),
        &jsonwebtoken::Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|_| ApiError::Auth("Token is not valid".into()))
}

/// Middleware on every student route. Rejects before the handler runs; has
/// no other side effects.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let header_value = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::Auth("No token, authorization denied".into()))?;

    let token = header_value
        .strip_prefix("Bearer ")
        .ok_or_else(|| ApiError::Auth("No token, authorization denied".into()))?;

    verify_token(&state.config.jwt_secret, token)?;

    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config(secret: &str, ttl_hours: i64) -> Config {
        Config {
            db_path: std::path::PathBuf::from(":memory:"),
            port: 0,
            jwt_secret: secret.to_string(),
            bcrypt_cost: 4,
            token_ttl_hours: ttl_hours,
        }
    }

    #[test]
    fn token_round_trip() {
        let config = test_config("unit-secret", 24);
        let token = issue_token(&config, "user-1").unwrap();
        let claims = verify_token("unit-secret", &token).unwrap();
        assert_eq!(claims.sub, "user-1");
        assert_eq!(claims.exp - claims.iat, 24 * 3600);
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let config = test_config("unit-secret", 24);
        let token = issue_token(&config, "user-1").unwrap();
        assert!(matches!(
            verify_token("other-secret", &token),
            Err(ApiError::Auth(_))
        ));
    }

    #[test]
    fn expired_token_is_rejected() {
        // Negative TTL puts exp far enough in the past to beat the
        // default validation leeway.
        let config = test_config("unit-secret", -2);
        let token = issue_token(&config, "user-1").unwrap();
        assert!(matches!(
            verify_token("unit-secret", &token),
            Err(ApiError::Auth(_))
        ));
    }
}
