// Bearer token forwarding.
//
// The gateway does not verify tokens itself; whatever the caller sent is
// passed to the upstream API, which owns authentication.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts, RequestPartsExt};
use axum_extra::TypedHeader;
use headers::{authorization::Bearer, Authorization};
use std::convert::Infallible;

use crate::api_client::ApiClient;

#[derive(Debug, Clone, Default)]
pub struct ForwardedToken(pub Option<String>);

impl ForwardedToken {
    // Upstream client that carries the caller's token, or the configured one
    pub fn client(&self, api: &ApiClient) -> ApiClient {
        match &self.0 {
            Some(token) => api.with_token(token.as_str()),
            None => api.clone(),
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for ForwardedToken
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        match parts.extract::<TypedHeader<Authorization<Bearer>>>().await {
            Ok(TypedHeader(Authorization(bearer))) => Ok(Self(Some(bearer.token().to_string()))),
            Err(e) => {
                // Missing or malformed header: fall back to the configured token
                tracing::trace!("No bearer token to forward: {}", e);
                Ok(Self(None))
            }
        }
    }
}
