// =====================================================
// FILE: src/server/middleware.rs - SESSION GUARD
// =====================================================

use crate::core::constants::SESSION_COOKIE;
use crate::core::error::AppError;
use crate::server::session::SessionManager;
use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header,
    Error, HttpMessage, HttpResponse, ResponseError,
};
use futures::future::{ready, LocalBoxFuture, Ready};
use std::sync::Arc;

/// Lets a request through only with a valid session cookie.
/// API calls get 401 JSON, page requests a redirect to the login form.
pub struct RequireSession {
    sessions: Arc<SessionManager>,
}

impl RequireSession {
    pub fn new(sessions: Arc<SessionManager>) -> Self {
        Self { sessions }
    }
}

impl<S, B> Transform<S, ServiceRequest> for RequireSession
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = RequireSessionService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequireSessionService {
            service,
            sessions: Arc::clone(&self.sessions),
        }))
    }
}

pub struct RequireSessionService<S> {
    service: S,
    sessions: Arc<SessionManager>,
}

impl<S, B> Service<ServiceRequest> for RequireSessionService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let session = req
            .cookie(SESSION_COOKIE)
            .and_then(|cookie| self.sessions.verify(cookie.value()));

        if let Some(session) = session {
            req.extensions_mut().insert(session);
            let fut = self.service.call(req);
            return Box::pin(async move { fut.await.map(ServiceResponse::map_into_left_body) });
        }

        log::debug!("Rejected unauthenticated request to {}", req.path());
        let response = if req.path().starts_with("/api/") {
            AppError::Unauthorized.error_response()
        } else {
            HttpResponse::SeeOther()
                .insert_header((header::LOCATION, "/login"))
                .finish()
        };

        let (request, _payload) = req.into_parts();
        let response = ServiceResponse::new(request, response).map_into_right_body();
        Box::pin(async move { Ok(response) })
    }
}
