//! Request logging middleware with a static per-route label.

use actix_web::Error;
use actix_web::dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready};
use futures_util::future::LocalBoxFuture;
use std::future::{Ready, ready};
use std::time::Instant;
use tracing::{info, warn};

/// Request logger middleware factory.
///
/// The label names the route in access logs, e.g. `RequestLogger::new("process")`.
#[derive(Clone, Copy, Debug)]
pub struct RequestLogger {
    label: &'static str,
}

impl RequestLogger {
    pub const fn new(label: &'static str) -> Self {
        Self { label }
    }
}

impl<S, B> Transform<S, ServiceRequest> for RequestLogger
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = RequestLoggerMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequestLoggerMiddleware {
            service,
            label: self.label,
        }))
    }
}

/// Request logger middleware service.
pub struct RequestLoggerMiddleware<S> {
    service: S,
    label: &'static str,
}

impl<S, B> Service<ServiceRequest> for RequestLoggerMiddleware<S>
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
        let start = Instant::now();
        let label = self.label;
        let method = req.method().to_string();
        let uri = req.uri().to_string();
        let remote_addr = req
            .connection_info()
            .realip_remote_addr()
            .unwrap_or("unknown")
            .to_string();

        info!(
            target: "access",
            handler = label,
            method = %method,
            uri = %uri,
            remote_addr = %remote_addr,
            "→ Request started"
        );

        let fut = self.service.call(req);

        Box::pin(async move {
            let res = fut.await?;
            let elapsed = start.elapsed();
            let status = res.status();

            if status.is_success() || status.is_redirection() {
                info!(
                    target: "access",
                    handler = label,
                    method = %method,
                    uri = %uri,
                    status = status.as_u16(),
                    duration_ms = %elapsed.as_millis(),
                    "← Request completed"
                );
            } else {
                warn!(
                    target: "access",
                    handler = label,
                    method = %method,
                    uri = %uri,
                    status = status.as_u16(),
                    duration_ms = %elapsed.as_millis(),
                    "← Request failed"
                );
            }

            Ok(res)
        })
    }
}
