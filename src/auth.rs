use anyhow::Result;
use axum::{
    extract::FromRequestParts,
    http::{request::Parts, HeaderMap},
    response::{IntoResponse, Response},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::{errors::ApiError, models::User, AppState};

const TOKEN_LIFETIME_HOURS: i64 = 24;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub username: String,
    pub exp: usize,
}

/// The authenticated caller, loaded fresh from the database on every request
/// so plan and subscription changes apply immediately.
pub struct AuthUser {
    pub user: User,
}

impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = extract_token_from_headers(&parts.headers)
            .ok_or_else(|| ApiError::Unauthorized.into_response())?;

        let claims = verify_jwt(&token, &state.config.jwt_secret)
            .map_err(|_| ApiError::Unauthorized.into_response())?;

        let user = state
            .db
            .get_user_by_id(claims.sub)
            .await
            .map_err(|e| ApiError::internal_server_error(e.to_string()).into_response())?
            .ok_or_else(|| ApiError::Unauthorized.into_response())?;

        Ok(AuthUser { user })
    }
}

pub fn create_jwt(user: &User, secret: &str) -> Result<String> {
    let expiration = (Utc::now() + Duration::hours(TOKEN_LIFETIME_HOURS)).timestamp();

    let claims = Claims {
        sub: user.id,
        username: user.username.clone(),
        exp: expiration as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(token)
}

pub fn verify_jwt(token: &str, secret: &str) -> Result<Claims> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )?;

    Ok(token_data.claims)
}

fn extract_token_from_headers(headers: &HeaderMap) -> Option<String> {
    let auth_str = headers.get("authorization")?.to_str().ok()?;
    auth_str
        .strip_prefix("Bearer ")
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_extract_bearer_token() {
        let mut headers = HeaderMap::new();
        assert_eq!(extract_token_from_headers(&headers), None);

        headers.insert("authorization", HeaderValue::from_static("Basic abc"));
        assert_eq!(extract_token_from_headers(&headers), None);

        headers.insert("authorization", HeaderValue::from_static("Bearer "));
        assert_eq!(extract_token_from_headers(&headers), None);

        headers.insert("authorization", HeaderValue::from_static("Bearer abc.def.ghi"));
        assert_eq!(extract_token_from_headers(&headers).as_deref(), Some("abc.def.ghi"));
    }
}
