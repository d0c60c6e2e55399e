use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    web, Error, HttpMessage,
};
use futures::future::LocalBoxFuture;
use std::future::{ready, Ready};

use crate::models::Role;
use crate::services::auth_service::{verify_token, Claims};
use crate::state::AppState;
use crate::utils::AppError;

/// Rejects requests without a valid bearer token and stores the decoded
/// [`Claims`] in the request extensions for handlers (`web::ReqData<Claims>`).
pub struct AuthMiddleware;

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = AuthMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthMiddlewareService { service }))
    }
}

pub struct AuthMiddlewareService<S> {
    service: S,
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        match authenticate(&req) {
            Ok(claims) => {
                req.extensions_mut().insert(claims);
                let fut = self.service.call(req);
                Box::pin(async move { fut.await })
            }
            Err(e) => Box::pin(async move { Err(e.into()) }),
        }
    }
}

fn authenticate(req: &ServiceRequest) -> Result<Claims, AppError> {
    let state = req
        .app_data::<web::Data<AppState>>()
        .ok_or_else(|| AppError::Internal("Application state missing".to_string()))?;

    let header = req
        .headers()
        .get("Authorization")
        .ok_or_else(|| AppError::Unauthorized("Missing authentication token".to_string()))?;

    let token = header
        .to_str()
        .ok()
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::Unauthorized("Invalid token format".to_string()))?;

    verify_token(token, &state.config.jwt)
}

/// Role gate used by handlers after authentication.
pub fn require_role(claims: &Claims, allowed: &[Role]) -> Result<(), AppError> {
    if claims.has_role(allowed) {
        Ok(())
    } else {
        log::warn!("🚫 {} ({}) denied, needs one of {:?}", claims.sub, claims.role, allowed);
        Err(AppError::Forbidden("Insufficient permissions".to_string()))
    }
}

pub const MANAGERS: &[Role] = &[Role::Admin, Role::Manager];
pub const ADMINS: &[Role] = &[Role::Admin];
