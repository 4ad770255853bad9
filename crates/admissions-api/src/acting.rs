//! Acting-user extractor.

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::error::ApiError;

/// Header carrying the authenticated user's id, set by the upstream auth
/// layer.
pub const ACTING_USER_HEADER: &str = "x-user-id";

/// The id of the user on whose behalf the request is made.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActingUser(pub i64);

impl<S: Send + Sync> FromRequestParts<S> for ActingUser {
  type Rejection = ApiError;

  async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
    parts
      .headers
      .get(ACTING_USER_HEADER)
      .and_then(|v| v.to_str().ok())
      .and_then(|s| s.trim().parse().ok())
      .map(ActingUser)
      .ok_or(ApiError::Unauthorized)
  }
}
