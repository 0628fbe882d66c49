//! Identity extractors
//!
//! `AuthenticatedUser` accepts any valid bearer token; `StaffUser` and
//! `AdminUser` additionally require the matching role flag.

use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};

use crate::auth::{verify_token, JwtKeys};
use crate::error::DispatchError;
use crate::models::{Identity, Role};

#[derive(Debug, Clone, Copy)]
pub struct AuthenticatedUser(pub Identity);

#[derive(Debug, Clone, Copy)]
pub struct StaffUser(pub Identity);

#[derive(Debug, Clone, Copy)]
pub struct AdminUser(pub Identity);

#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    JwtKeys: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = DispatchError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|_| DispatchError::Unauthorized("missing bearer token".into()))?;

        let keys = JwtKeys::from_ref(state);
        let claims = verify_token(&keys, bearer.token())?;
        Ok(Self(claims.identity()))
    }
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for StaffUser
where
    JwtKeys: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = DispatchError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let AuthenticatedUser(identity) = AuthenticatedUser::from_request_parts(parts, state).await?;
        if identity.role != Role::Staff {
            return Err(DispatchError::Forbidden("staff role required".into()));
        }
        Ok(Self(identity))
    }
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for AdminUser
where
    JwtKeys: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = DispatchError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let AuthenticatedUser(identity) = AuthenticatedUser::from_request_parts(parts, state).await?;
        if !identity.is_admin() {
            return Err(DispatchError::Forbidden("admin role required".into()));
        }
        Ok(Self(identity))
    }
}
