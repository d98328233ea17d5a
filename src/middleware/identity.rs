use axum::extract::FromRequestParts;
use uuid::Uuid;

use crate::error::AppError;

pub const USER_ID_HEADER: &str = "x-user-id";

/// Acting user id resolved from request context, when the upstream session
/// layer supplies one. Order intake falls back to this when the payload
/// carries no `user` field.
#[derive(Debug, Clone)]
pub struct SessionIdentity(pub Option<Uuid>);

impl<S> FromRequestParts<S> for SessionIdentity
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        let Some(value) = parts.headers.get(USER_ID_HEADER) else {
            return Ok(SessionIdentity(None));
        };

        let raw = value
            .to_str()
            .map_err(|_| AppError::Validation(format!("invalid {USER_ID_HEADER} header")))?;

        let user_id = Uuid::parse_str(raw.trim())
            .map_err(|_| AppError::Validation(format!("invalid {USER_ID_HEADER} header")))?;

        Ok(SessionIdentity(Some(user_id)))
    }
}
