use axum::{extract::State, response::Json, routing::get, Router};
use std::sync::Arc;

use crate::{
    auth::AuthUser,
    errors::usage::UsageError,
    models::UsageResponse,
    AppState,
};

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/", get(get_usage))
}

#[utoipa::path(
    get,
    path = "/api/usage",
    tag = "usage",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Counters, limits and remaining quota for the current month", body = UsageResponse),
        (status = 401, description = "Unauthorized - invalid or missing token")
    )
)]
async fn get_usage(
    State(state): State<Arc<AppState>>,
    auth_user: AuthUser,
) -> Result<Json<UsageResponse>, UsageError> {
    let user = auth_user.user;
    let usage = state.db.get_usage(user.id).await?;

    Ok(Json(UsageResponse::new(user.plan_tier, user.subscription_status, usage)))
}
