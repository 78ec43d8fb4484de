use axum::{
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Response},
};
use uuid::Uuid;

pub const ACCOUNT_ID_HEADER: &str = "x-account-id";

/// Caller identity, resolved by the fronting auth layer and handed over
/// as a request header. The core trusts the value; a request without one
/// never made it through that layer legitimately.
pub struct Caller(pub Uuid);

impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let id = parts
            .headers
            .get(ACCOUNT_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| Uuid::parse_str(v).ok());

        match id {
            Some(id) => Ok(Caller(id)),
            None => Err((StatusCode::UNAUTHORIZED, "missing caller identity").into_response()),
        }
    }
}
