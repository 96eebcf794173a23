//! Request observer
//!
//! Records one document per event into a single collection:
//! - **Errors**: `log_error` persists an [`ErrorEvent`] and returns insert failures
//! - **Metrics**: `log_metrics` persists a [`MetricsEvent`] and swallows insert failures
//! - **Interception**: [`Observer::intercept`] and [`ObserverLayer`] time a handler
//!   and emit both kinds around it
//! - **Health**: `ping` probes the datastore with a fixed timeout
//!
//! ## Data Flow
//!
//! ```text
//! handler call ──▶ intercept ──▶ log_error (on failure) ──▶ EventStore::insert_one
//!                            └─▶ log_metrics (always)   ──▶ EventStore::insert_one
//! ```
//!
//! Every insert is awaited inline by the calling task. Nothing is buffered,
//! batched, or retried; a failed insert is a lost event.

pub mod context;
pub mod event;
pub mod memory;
pub mod middleware;
pub mod request_id;
pub mod store;

pub use context::RequestContext;
pub use event::{ErrorEvent, Event, MetricsEvent};
pub use memory::MemoryStore;
pub use middleware::{CallInfo, ObserverLayer, ObserverService, UnaryCall, RECORDED_STATUS_CODE};
pub use request_id::RequestIdStrategy;
pub use store::{EventStore, MongoStore};

use crate::config::ObserverConfig;
use crate::error::{ObserverError, StoreError};
use std::sync::Arc;
use std::time::Duration;
use tracing::Dispatch;

/// Timeout applied to `ping`, independent of any caller context
pub const DEFAULT_PING_TIMEOUT: Duration = Duration::from_secs(10);

/// Records request errors and metrics into an [`EventStore`]
///
/// Constructed once at startup and shared as `Arc<Observer>` by every
/// in-flight call. Holds no mutable state of its own.
pub struct Observer {
    store: Arc<dyn EventStore>,
    logger: Dispatch,
    request_ids: RequestIdStrategy,
    ping_timeout: Duration,
}

impl Observer {
    /// Connect to MongoDB and target `database_name.collection_name`
    ///
    /// No health check is performed here. The driver may defer opening a
    /// connection until the first insert.
    pub async fn connect(
        uri: &str,
        database_name: &str,
        collection_name: &str,
    ) -> Result<Self, ObserverError> {
        let store = MongoStore::connect(uri, database_name, collection_name)
            .await
            .map_err(ObserverError::Connect)?;

        tracing::debug!(
            database = database_name,
            collection = collection_name,
            "Observer connected"
        );

        Ok(Self::with_store(Arc::new(store)))
    }

    /// Connect using a loaded configuration
    pub async fn from_config(config: &ObserverConfig) -> Result<Self, ObserverError> {
        let observer = Self::connect(
            &config.mongo.uri,
            &config.mongo.database,
            &config.mongo.collection,
        )
        .await?;

        Ok(observer
            .with_request_ids(config.request_id)
            .with_ping_timeout(Duration::from_secs(config.ping_timeout_secs)))
    }

    /// Observer over any store, logging failures as JSON to stderr
    pub fn with_store(store: Arc<dyn EventStore>) -> Self {
        Self {
            store,
            logger: crate::logging::json_stderr_dispatch(),
            request_ids: RequestIdStrategy::default(),
            ping_timeout: DEFAULT_PING_TIMEOUT,
        }
    }

    /// Replace the sink used to report insert failures
    pub fn with_logger(mut self, logger: Dispatch) -> Self {
        self.logger = logger;
        self
    }

    pub fn with_request_ids(mut self, strategy: RequestIdStrategy) -> Self {
        self.request_ids = strategy;
        self
    }

    pub fn with_ping_timeout(mut self, timeout: Duration) -> Self {
        self.ping_timeout = timeout;
        self
    }

    pub fn request_id_strategy(&self) -> RequestIdStrategy {
        self.request_ids
    }

    pub fn store(&self) -> &Arc<dyn EventStore> {
        &self.store
    }

    /// Persist one [`ErrorEvent`] stamped with the current time
    ///
    /// On failure the error is logged once and also returned; it is never
    /// retried.
    pub async fn log_error(
        &self,
        ctx: &RequestContext,
        request_id: &str,
        error_message: &str,
        details: &str,
    ) -> Result<(), ObserverError> {
        let event = Event::from(ErrorEvent::now(request_id, error_message, details));

        if let Err(e) = self.insert(ctx, &event).await {
            self.report(request_id, "Error logging to MongoDB", &e);
            return Err(ObserverError::Insert(e));
        }

        Ok(())
    }

    /// Persist one [`MetricsEvent`] stamped with the current time
    ///
    /// Insert failures are logged and dropped; recording metrics never
    /// changes the outcome of the request being measured.
    pub async fn log_metrics(
        &self,
        ctx: &RequestContext,
        request_id: &str,
        service: &str,
        duration: Duration,
        status_code: i32,
    ) {
        let event = Event::from(MetricsEvent::now(request_id, service, duration, status_code));

        if let Err(e) = self.insert(ctx, &event).await {
            self.report(request_id, "Error logging metrics to MongoDB", &e);
        }
    }

    /// Single liveness round trip bounded by the observer's ping timeout
    pub async fn ping(&self) -> Result<(), ObserverError> {
        let ctx = RequestContext::with_timeout(self.ping_timeout);
        match ctx.run(self.store.ping()).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(ObserverError::Ping(e)),
            Err(e) => Err(ObserverError::Ping(e.into())),
        }
    }

    async fn insert(&self, ctx: &RequestContext, event: &Event) -> Result<(), StoreError> {
        ctx.run(self.store.insert_one(event)).await?
    }

    fn report(&self, request_id: &str, message: &str, error: &StoreError) {
        tracing::dispatcher::with_default(&self.logger, || {
            tracing::error!(request_id = %request_id, error = %error, "{}", message);
        });
    }
}

impl std::fmt::Debug for Observer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Observer")
            .field("request_ids", &self.request_ids)
            .field("ping_timeout", &self.ping_timeout)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ContextError;

    fn observer() -> (Arc<MemoryStore>, Observer) {
        let store = Arc::new(MemoryStore::new());
        let observer = Observer::with_store(store.clone());
        (store, observer)
    }

    #[tokio::test]
    async fn test_log_error_persists_event() {
        let (store, observer) = observer();
        let ctx = RequestContext::background();

        observer
            .log_error(&ctx, "req-1", "boom", "stack...")
            .await
            .unwrap();

        let errors = store.error_events();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].request_id, "req-1");
        assert_eq!(errors[0].error_message, "boom");
        assert_eq!(errors[0].details, "stack...");
    }

    #[tokio::test]
    async fn test_log_error_propagates_insert_failure() {
        let (store, observer) = observer();
        store.fail_inserts(true);

        let err = observer
            .log_error(&RequestContext::background(), "req-1", "boom", "")
            .await
            .unwrap_err();

        assert!(matches!(err, ObserverError::Insert(StoreError::Unavailable(_))));
        assert!(err.to_string().starts_with("failed to insert event"));
    }

    #[tokio::test]
    async fn test_log_metrics_swallows_insert_failure() {
        let (store, observer) = observer();
        store.fail_inserts(true);

        observer
            .log_metrics(
                &RequestContext::background(),
                "req-1",
                "/svc/Method",
                Duration::from_millis(5),
                200,
            )
            .await;

        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_cancelled_context_aborts_insert() {
        let (store, observer) = observer();
        let ctx = RequestContext::background();
        ctx.cancel();

        let err = observer
            .log_error(&ctx, "req-1", "boom", "")
            .await
            .unwrap_err();

        assert!(matches!(
            err.store_error(),
            StoreError::Context(ContextError::Cancelled)
        ));
        assert!(store.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_context_deadline_bounds_insert() {
        let (store, observer) = observer();
        store.set_insert_delay(Duration::from_secs(60));
        let ctx = RequestContext::with_timeout(Duration::from_secs(1));

        let err = observer
            .log_error(&ctx, "req-1", "boom", "")
            .await
            .unwrap_err();

        assert!(matches!(
            err.store_error(),
            StoreError::Context(ContextError::DeadlineExceeded)
        ));
    }

    #[tokio::test]
    async fn test_ping() {
        let (store, observer) = observer();
        assert!(observer.ping().await.is_ok());

        store.fail_pings(true);
        let err = observer.ping().await.unwrap_err();
        assert!(err.to_string().starts_with("failed to ping MongoDB"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_ping_gives_up_after_default_timeout() {
        let (store, observer) = observer();
        store.set_ping_delay(Duration::from_secs(60));

        let start = tokio::time::Instant::now();
        let err = observer.ping().await.unwrap_err();

        assert!(matches!(
            err,
            ObserverError::Ping(StoreError::Context(ContextError::DeadlineExceeded))
        ));
        assert_eq!(start.elapsed(), DEFAULT_PING_TIMEOUT);
    }

    #[tokio::test(start_paused = true)]
    async fn test_ping_honours_custom_timeout() {
        let (store, observer) = observer();
        let observer = observer.with_ping_timeout(Duration::from_secs(2));
        store.set_ping_delay(Duration::from_secs(60));

        let start = tokio::time::Instant::now();
        let err = observer.ping().await.unwrap_err();

        assert!(matches!(
            err,
            ObserverError::Ping(StoreError::Context(ContextError::DeadlineExceeded))
        ));
        assert_eq!(start.elapsed(), Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_ping_within_timeout_succeeds() {
        let (store, observer) = observer();
        store.set_ping_delay(Duration::from_secs(9));

        assert!(observer.ping().await.is_ok());
    }

    #[tokio::test]
    async fn test_connect_with_malformed_uri_fails() {
        let result = Observer::connect("definitely not a uri", "obs", "events").await;
        assert!(matches!(result, Err(ObserverError::Connect(_))));
    }
}
