use axum::{
    extract::State,
    response::Json,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tracing::{info, warn};

use crate::{
    auth::{create_jwt, AuthUser},
    errors::user::{validate_registration, UserError},
    models::{CreateUser, LoginRequest, LoginResponse, UserResponse},
    AppState,
};

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/me", get(me))
}

#[utoipa::path(
    post,
    path = "/api/auth/register",
    tag = "auth",
    request_body = CreateUser,
    responses(
        (status = 200, description = "User registered successfully", body = UserResponse),
        (status = 400, description = "Invalid user data or missing captcha token"),
        (status = 403, description = "Captcha verification failed"),
        (status = 409, description = "Username or email already taken")
    )
)]
async fn register(
    State(state): State<Arc<AppState>>,
    Json(user_data): Json<CreateUser>,
) -> Result<Json<UserResponse>, UserError> {
    validate_registration(&user_data.username, &user_data.email, &user_data.password)?;

    if let Some(captcha) = &state.captcha {
        let token = user_data
            .captcha_token
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .ok_or(UserError::CaptchaMissing)?;
        let passed = captcha.verify(token).await.map_err(|e| {
            warn!("Captcha verification request failed: {}", e);
            UserError::CaptchaFailed
        })?;
        if !passed {
            return Err(UserError::CaptchaFailed);
        }
    }

    if state
        .db
        .get_user_by_username(user_data.username.trim())
        .await
        .map_err(|e| UserError::internal(e.to_string()))?
        .is_some()
    {
        return Err(UserError::DuplicateUsername { username: user_data.username });
    }
    if state
        .db
        .get_user_by_email(user_data.email.trim())
        .await
        .map_err(|e| UserError::internal(e.to_string()))?
        .is_some()
    {
        return Err(UserError::DuplicateEmail { email: user_data.email });
    }

    let user = state
        .db
        .create_user(CreateUser {
            username: user_data.username.trim().to_string(),
            email: user_data.email.trim().to_string(),
            ..user_data
        })
        .await
        .map_err(|e| UserError::internal(e.to_string()))?;

    info!("Registered user {} ({})", user.username, user.id);
    Ok(Json(user.into()))
}

#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 401, description = "Unauthorized - invalid credentials")
    )
)]
async fn login(
    State(state): State<Arc<AppState>>,
    Json(login_data): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, UserError> {
    let user = state
        .db
        .get_user_by_username(&login_data.username)
        .await
        .map_err(|e| UserError::internal(e.to_string()))?
        .ok_or(UserError::InvalidCredentials)?;

    let is_valid = bcrypt::verify(&login_data.password, &user.password_hash)
        .map_err(|e| UserError::internal(e.to_string()))?;

    if !is_valid {
        return Err(UserError::InvalidCredentials);
    }

    let token = create_jwt(&user, &state.config.jwt_secret)
        .map_err(|e| UserError::internal(e.to_string()))?;

    Ok(Json(LoginResponse {
        token,
        user: user.into(),
    }))
}

#[utoipa::path(
    get,
    path = "/api/auth/me",
    tag = "auth",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Current user information", body = UserResponse),
        (status = 401, description = "Unauthorized - invalid or missing token")
    )
)]
async fn me(auth_user: AuthUser) -> Json<UserResponse> {
    Json(auth_user.user.into())
}
