//! Session middleware
//!
//! Resolves the caller once per request and stores an explicit
//! `RequestContext` in the request extensions. Handlers read it through the
//! `CurrentUser` extractor; nothing about the session lives outside the
//! request.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::{
    extract::CookieJar,
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use uuid::Uuid;

use shared::UserRole;

use crate::error::AppError;
use crate::services::AuthService;
use crate::AppState;

/// Authenticated caller for the current request
#[derive(Clone, Debug, PartialEq)]
pub struct RequestContext {
    pub user_id: Uuid,
    pub email: Option<String>,
    pub role: UserRole,
}

/// Look up the session from the bearer token or the session cookie and
/// attach a `RequestContext` when it is valid. Anonymous requests pass
/// through untouched.
pub async fn session_middleware(
    State(state): State<AppState>,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    let token = bearer
        .map(|TypedHeader(Authorization(b))| b.token().to_string())
        .or_else(|| {
            jar.get(&state.config.auth.session_cookie)
                .map(|c| c.value().to_string())
        });

    if let Some(token) = token {
        match state.auth.get_session(&token).await {
            Ok(Some(session)) => {
                let auth_service = AuthService::new(state.auth.clone(), state.profiles.clone());
                let role = auth_service.role_for(session.user_id).await;
                request.extensions_mut().insert(RequestContext {
                    user_id: session.user_id,
                    email: session.email,
                    role,
                });
            }
            Ok(None) => tracing::debug!("Ignoring invalid or expired session token"),
            Err(e) => tracing::warn!("Session lookup failed: {}", e),
        }
    }

    next.run(request).await
}

/// Reject requests that carry no valid session
pub async fn require_session(request: Request, next: Next) -> Response {
    if request.extensions().get::<RequestContext>().is_none() {
        return unauthorized_response("Authentication required");
    }
    next.run(request).await
}

/// Create unauthorized response
fn unauthorized_response(message: &str) -> Response {
    AppError::Unauthorized(message.to_string()).into_response()
}

/// Extractor for authenticated user
/// Use `Option<CurrentUser>` where anonymous callers are handled by the handler
#[derive(Clone, Debug)]
pub struct CurrentUser(pub RequestContext);

#[axum::async_trait]
impl<S> axum::extract::FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<RequestContext>()
            .cloned()
            .map(CurrentUser)
            .ok_or_else(|| unauthorized_response("Authentication required"))
    }
}
