use axum::{extract::FromRequestParts, http::request::Parts, http::StatusCode};

use crate::api::rest::error::from_parts;
use crate::api::rest::problem::ProblemResponse;
use crate::contract::model::Identity;

/// Header carrying the chat identity of the caller.
pub const IDENTITY_HEADER: &str = "x-chat-identity";

/// Caller identity decoded from [`IDENTITY_HEADER`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallerIdentity(pub Identity);

impl<S> FromRequestParts<S> for CallerIdentity
where
    S: Send + Sync,
{
    type Rejection = ProblemResponse;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let instance = parts.uri.path().to_owned();
        let raw = parts.headers.get(IDENTITY_HEADER).ok_or_else(|| {
            from_parts(
                StatusCode::UNAUTHORIZED,
                "ACCESS_IDENTITY_MISSING",
                "Missing identity",
                format!("The {IDENTITY_HEADER} header is required"),
                &instance,
            )
        })?;

        let invalid = |detail: String| {
            from_parts(
                StatusCode::BAD_REQUEST,
                "ACCESS_IDENTITY_INVALID",
                "Invalid identity",
                detail,
                &instance,
            )
        };
        let text = raw
            .to_str()
            .map_err(|_| invalid(format!("{IDENTITY_HEADER} is not valid text")))?;
        let identity = text.parse::<Identity>().map_err(invalid)?;
        Ok(CallerIdentity(identity))
    }
}
