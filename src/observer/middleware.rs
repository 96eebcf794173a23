//! Interception adapter
//!
//! Wraps a unary handler so that each call is timed and recorded:
//!
//! 1. take the start time and derive the request id from it
//! 2. run the handler
//! 3. on failure, record an [`ErrorEvent`](super::ErrorEvent)
//! 4. always record a [`MetricsEvent`](super::MetricsEvent)
//! 5. hand back the handler's own result
//!
//! The metrics record always carries [`RECORDED_STATUS_CODE`], including for
//! failed calls. Failures are distinguishable only through the error record
//! sharing the same `request_id`.
//!
//! [`ObserverService`] wraps a `tower::Service<UnaryCall<Req>>`, not a
//! `Service<http::Request<_>>`. Stacking [`ObserverLayer`] under tonic's
//! `Server::layer` therefore needs a small adapter that builds the
//! [`UnaryCall`] from the request path and deadline header.

use super::{Observer, RequestContext};
use chrono::Utc;
use futures::future::BoxFuture;
use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::time::Instant;
use tower::{Layer, Service};

/// Status code written on every metrics record
pub const RECORDED_STATUS_CODE: i32 = 200;

/// Metadata about the call being intercepted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallInfo {
    /// Fully qualified method, e.g. `/orders.Orders/Create`
    pub full_method: String,
}

impl CallInfo {
    pub fn new(full_method: impl Into<String>) -> Self {
        Self {
            full_method: full_method.into(),
        }
    }

    pub fn full_method(&self) -> &str {
        &self.full_method
    }
}

/// A unary request as seen by [`ObserverService`]
#[derive(Debug, Clone)]
pub struct UnaryCall<Req> {
    pub ctx: RequestContext,
    pub info: CallInfo,
    pub request: Req,
}

impl<Req> UnaryCall<Req> {
    pub fn new(ctx: RequestContext, info: CallInfo, request: Req) -> Self {
        Self { ctx, info, request }
    }
}

impl Observer {
    /// Run `handler` and record the outcome
    ///
    /// The duration covers only the handler; insert latency incurred
    /// afterwards is not included. Recording failures never reach the
    /// caller: the handler's response or error is returned as is.
    pub async fn intercept<Req, Resp, E, H, Fut>(
        &self,
        ctx: RequestContext,
        request: Req,
        info: &CallInfo,
        handler: H,
    ) -> Result<Resp, E>
    where
        H: FnOnce(RequestContext, Req) -> Fut,
        Fut: Future<Output = Result<Resp, E>>,
        E: Display,
    {
        let started = Instant::now();
        let request_id = self.request_id_strategy().generate(Utc::now());

        let result = handler(ctx.clone(), request).await;
        let elapsed = started.elapsed();

        let failure = result
            .as_ref()
            .err()
            .map(|err| (err.to_string(), format!("Request failed: {}", err)));

        if let Some((message, details)) = failure {
            // Already reported through the observer's logger.
            let _ = self.log_error(&ctx, &request_id, &message, &details).await;
        }

        self.log_metrics(
            &ctx,
            &request_id,
            info.full_method(),
            elapsed,
            RECORDED_STATUS_CODE,
        )
        .await;

        result
    }

    /// Tower layer applying [`Observer::intercept`] to every call
    pub fn middleware(self: &Arc<Self>) -> ObserverLayer {
        ObserverLayer::new(Arc::clone(self))
    }
}

#[derive(Clone, Debug)]
pub struct ObserverLayer {
    observer: Arc<Observer>,
}

impl ObserverLayer {
    pub fn new(observer: Arc<Observer>) -> Self {
        Self { observer }
    }
}

impl<S> Layer<S> for ObserverLayer {
    type Service = ObserverService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        ObserverService {
            inner,
            observer: self.observer.clone(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct ObserverService<S> {
    inner: S,
    observer: Arc<Observer>,
}

impl<S, Req> Service<UnaryCall<Req>> for ObserverService<S>
where
    S: Service<UnaryCall<Req>> + Clone + Send + 'static,
    S::Future: Send + 'static,
    S::Response: Send + 'static,
    S::Error: Display + Send + 'static,
    Req: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<S::Response, S::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, call: UnaryCall<Req>) -> Self::Future {
        // Take the service that was driven to readiness and leave a clone.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);
        let observer = self.observer.clone();

        Box::pin(async move {
            let UnaryCall { ctx, info, request } = call;
            let forwarded = info.clone();

            observer
                .intercept(ctx, request, &info, move |ctx, request| {
                    inner.call(UnaryCall::new(ctx, forwarded, request))
                })
                .await
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observer::MemoryStore;
    use std::time::Duration;

    fn observer() -> (Arc<MemoryStore>, Arc<Observer>) {
        let store = Arc::new(MemoryStore::new());
        let observer = Arc::new(Observer::with_store(store.clone()));
        (store, observer)
    }

    #[tokio::test]
    async fn test_success_records_metrics_only() {
        let (store, observer) = observer();
        let info = CallInfo::new("/echo.Echo/Say");

        let resp: Result<&str, String> = observer
            .intercept(RequestContext::background(), "hi", &info, |_, req| async move {
                Ok(req)
            })
            .await;

        assert_eq!(resp, Ok("hi"));
        assert!(store.error_events().is_empty());

        let metrics = store.metrics_events();
        assert_eq!(metrics.len(), 1);
        assert_eq!(metrics[0].service, "/echo.Echo/Say");
        assert_eq!(metrics[0].status_code, RECORDED_STATUS_CODE);
    }

    #[tokio::test]
    async fn test_failure_records_error_and_metrics_with_same_id() {
        let (store, observer) = observer();
        let info = CallInfo::new("/files.Files/Write");

        let resp: Result<(), String> = observer
            .intercept(RequestContext::background(), (), &info, |_, _| async {
                Err("disk full".to_string())
            })
            .await;

        assert_eq!(resp, Err("disk full".to_string()));

        let errors = store.error_events();
        let metrics = store.metrics_events();
        assert_eq!(errors.len(), 1);
        assert_eq!(metrics.len(), 1);
        assert_eq!(errors[0].error_message, "disk full");
        assert_eq!(errors[0].details, "Request failed: disk full");
        assert_eq!(errors[0].request_id, metrics[0].request_id);
        assert_eq!(metrics[0].status_code, 200);
    }

    #[tokio::test(start_paused = true)]
    async fn test_duration_excludes_insert_latency() {
        let (store, observer) = observer();
        store.set_insert_delay(Duration::from_secs(3));
        let info = CallInfo::new("/slow.Slow/Call");

        let _: Result<(), String> = observer
            .intercept(RequestContext::background(), (), &info, |_, _| async {
                tokio::time::sleep(Duration::from_millis(250)).await;
                Err("timeout upstream".to_string())
            })
            .await;

        let metrics = store.metrics_events();
        assert_eq!(metrics.len(), 1);
        assert!((metrics[0].duration_seconds - 0.25).abs() < 1e-3);
    }

    #[tokio::test]
    async fn test_handler_receives_context() {
        let (_store, observer) = observer();
        let ctx = RequestContext::with_timeout(Duration::from_secs(5));
        let deadline = ctx.deadline();

        let seen: Result<_, String> = observer
            .intercept(ctx, (), &CallInfo::new("/a.A/B"), |ctx, _| async move {
                Ok(ctx.deadline())
            })
            .await;

        assert_eq!(seen, Ok(deadline));
    }
}
