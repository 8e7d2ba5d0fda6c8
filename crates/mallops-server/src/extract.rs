//! Request extractors: caller identity and strict JSON bodies.

use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, FromRequestParts, Request};
use axum::http::header;
use axum::http::request::Parts;
use mallops_access::{AccessError, extract_token};

use crate::error::ApiError;
use crate::state::AppState;

/// Resolved caller identity.
///
/// Extraction performs the full credential path: bearer-or-cookie token,
/// hash, session lookup, user lookup. Handlers receiving an
/// [`mallops_access::AuthContext`] are therefore always authenticated;
/// authorization stays explicit per handler.
pub struct Identity(pub mallops_access::AuthContext);

impl FromRequestParts<AppState> for Identity {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let authorization = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok());
        let cookies = parts
            .headers
            .get(header::COOKIE)
            .and_then(|v| v.to_str().ok());

        let access = state.access();
        let token = extract_token(authorization, cookies, &access.config().cookie_name)
            .ok_or(AccessError::MissingCredentials)?;

        let ctx = access.authenticate(&token).await?;
        Ok(Identity(ctx))
    }
}

/// JSON body extractor that renders deserialization failures as 400 with
/// the uniform error body (axum's default rejection is a bare 422).
pub struct ValidJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidJson<T>
where
    axum::Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match axum::Json::<T>::from_request(req, state).await {
            Ok(axum::Json(value)) => Ok(ValidJson(value)),
            Err(rejection) => Err(ApiError::validation(rejection.body_text())),
        }
    }
}
