use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts},
};
use campus_services::auth::ServiceClaims;

use crate::{error::ApiError, state::QueueState};

/// A caller holding a valid service token (`Authorization: Bearer ...`).
#[derive(Debug, Clone)]
pub struct ServiceCaller {
    pub claims: ServiceClaims,
}

impl<S> FromRequestParts<S> for ServiceCaller
where
    QueueState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let state = QueueState::from_ref(state);

        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .ok_or_else(|| ApiError::Unauthorized("No token provided".to_string()))?;

        let claims = state.service_auth.verify(token)?;
        Ok(ServiceCaller { claims })
    }
}
