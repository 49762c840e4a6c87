//! Enquiry handler: first contact from a buyer about a product

use axum::{
    async_trait,
    extract::{FromRequest, Request, State},
    http::{header::CONTENT_TYPE, StatusCode},
    response::{IntoResponse, Redirect, Response},
    Form, Json,
};
use serde::de::DeserializeOwned;
use uuid::Uuid;

use shared::{sanitize_return_path, EnquiryInput};

use crate::middleware::CurrentUser;
use crate::AppState;

/// Body accepted as JSON or as an urlencoded form, by content type
pub struct FormOrJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for FormOrJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Send + 'static,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_json = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|ct| ct.starts_with("application/json"))
            .unwrap_or(false);

        if is_json {
            Json::<T>::from_request(req, state)
                .await
                .map(|Json(value)| FormOrJson(value))
                .map_err(IntoResponse::into_response)
        } else {
            Form::<T>::from_request(req, state)
                .await
                .map(|Form(value)| FormOrJson(value))
                .map_err(IntoResponse::into_response)
        }
    }
}

/// Login URL that brings the user back to `return_path` afterwards
pub fn login_redirect_url(login_path: &str, return_path: &str) -> String {
    let query = url::form_urlencoded::Serializer::new(String::new())
        .append_pair("redirect", return_path)
        .finish();
    format!("{}?{}", login_path, query)
}

/// Where an anonymous enquirer should land after signing in
fn return_path_for(input: &EnquiryInput) -> String {
    if let Some(path) = sanitize_return_path(input.return_to.as_deref()) {
        return path.to_string();
    }
    match input
        .product_id
        .as_deref()
        .and_then(|id| Uuid::parse_str(id.trim()).ok())
    {
        Some(product_id) => format!("/products/{}", product_id),
        None => "/".to_string(),
    }
}

/// Create an enquiry. Anonymous callers are redirected to sign in.
///
/// The session is resolved before the body is read: an anonymous caller
/// gets the redirect even when the body is missing or malformed, and the
/// body only shapes where they come back to.
pub async fn create_enquiry(
    State(state): State<AppState>,
    user: Option<CurrentUser>,
    request: Request,
) -> Response {
    let body = FormOrJson::<EnquiryInput>::from_request(request, &state).await;

    let Some(CurrentUser(ctx)) = user else {
        let input = body.map(|FormOrJson(input)| input).unwrap_or_default();
        let target = login_redirect_url(&state.config.site.login_path, &return_path_for(&input));
        return Redirect::to(&target).into_response();
    };

    let input = match body {
        Ok(FormOrJson(input)) => input,
        Err(rejection) => return rejection,
    };

    match state
        .conversation_service()
        .create_enquiry(ctx.user_id, &input)
        .await
        .into_result()
    {
        Ok(enquiry) => (StatusCode::CREATED, Json(enquiry)).into_response(),
        Err(e) => e.into_response(),
    }
}
