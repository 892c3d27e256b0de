use std::marker::PhantomData;

use axum::{
    async_trait,
    extract::{FromRequest, FromRequestParts},
    http::request::Parts,
};

use crate::app::AppState;
use crate::auth::{AuthError, Capability, Identity};
use crate::error::ApiError;

/// JSON body whose rejections render through [`ApiError`]
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// Path parameters whose rejections render through [`ApiError`]
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct ApiPath<T>(pub T);

/// Identity placed in the request by [`jwt_auth_middleware`](super::jwt_auth_middleware)
#[derive(Debug, Clone)]
pub struct CurrentUser(pub Identity);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Identity>()
            .cloned()
            .map(CurrentUser)
            .ok_or_else(|| AuthError::Unauthenticated("Missing Authorization header").into())
    }
}

/// Capability a route demands before its handler runs
pub trait RequiredCapability {
    const CAPABILITY: Capability;
}

pub struct WriteStructure;

impl RequiredCapability for WriteStructure {
    const CAPABILITY: Capability = Capability::StructuralWrite;
}

pub struct AdjustStock;

impl RequiredCapability for AdjustStock {
    const CAPABILITY: Capability = Capability::AdjustQuantity;
}

/// Verified identity that the access policy has granted capability `C`.
///
/// Must come before any body extractor so a denied request is rejected
/// before its payload is read.
pub struct Authorized<C> {
    pub identity: Identity,
    _capability: PhantomData<C>,
}

#[async_trait]
impl<C> FromRequestParts<AppState> for Authorized<C>
where
    C: RequiredCapability + Send + Sync + 'static,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let CurrentUser(identity) = CurrentUser::from_request_parts(parts, state).await?;
        state.policy.authorize(&identity, C::CAPABILITY)?;
        Ok(Self { identity, _capability: PhantomData })
    }
}
