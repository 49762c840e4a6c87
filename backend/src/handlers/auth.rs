//! Authentication handlers

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use shared::{Profile, SignInInput, SignUpInput, UserRole};

use crate::error::AppError;
use crate::middleware::CurrentUser;
use crate::AppState;

#[derive(Serialize)]
pub struct SignInResponse {
    pub user_id: Uuid,
    pub access_token: String,
    pub token_type: String,
    pub expires_at: i64,
}

#[derive(Serialize)]
pub struct MeResponse {
    pub user_id: Uuid,
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub role: UserRole,
}

#[derive(Deserialize)]
pub struct EmailQuery {
    pub email: String,
}

#[derive(Serialize)]
pub struct EmailExistsResponse {
    pub exists: bool,
}

fn session_cookie(name: &str, value: String) -> Cookie<'static> {
    Cookie::build((name.to_string(), value))
        .path("/")
        .http_only(true)
        .secure(true)
        .same_site(SameSite::Lax)
        .build()
}

/// Sign-up endpoint handler
pub async fn sign_up(
    State(state): State<AppState>,
    Json(body): Json<SignUpInput>,
) -> Result<(StatusCode, Json<Profile>), AppError> {
    let profile = state.auth_service().sign_up(body).await.into_result()?;
    Ok((StatusCode::CREATED, Json(profile)))
}

/// Sign-in endpoint handler. Sets the session cookie for browser clients
/// and returns the token for API clients.
pub async fn sign_in(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(body): Json<SignInInput>,
) -> Result<(CookieJar, Json<SignInResponse>), AppError> {
    let session = state.auth_service().sign_in(body).await?;

    let jar = jar.add(session_cookie(
        &state.config.auth.session_cookie,
        session.access_token.clone(),
    ));

    Ok((
        jar,
        Json(SignInResponse {
            user_id: session.user_id,
            access_token: session.access_token,
            token_type: "Bearer".to_string(),
            expires_at: session.expires_at,
        }),
    ))
}

/// Sign-out endpoint handler
pub async fn sign_out(State(state): State<AppState>, jar: CookieJar) -> (CookieJar, StatusCode) {
    let removal = Cookie::build((state.config.auth.session_cookie.clone(), String::new())).path("/");
    (jar.remove(removal), StatusCode::NO_CONTENT)
}

/// Current user endpoint handler
pub async fn me(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
) -> Result<Json<MeResponse>, AppError> {
    let full_name = match state.auth_service().profile(ctx.user_id).await {
        Ok(profile) => Some(profile.full_name),
        Err(AppError::NotFound(_)) => None,
        Err(e) => return Err(e),
    };

    Ok(Json(MeResponse {
        user_id: ctx.user_id,
        email: ctx.email,
        full_name,
        role: ctx.role,
    }))
}

/// Email availability check used by the sign-up form
pub async fn email_exists(
    State(state): State<AppState>,
    Query(query): Query<EmailQuery>,
) -> Result<Json<EmailExistsResponse>, AppError> {
    let exists = state.auth_service().email_exists(&query.email).await?;
    Ok(Json(EmailExistsResponse { exists }))
}
