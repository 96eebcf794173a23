pub mod config;
pub mod error;
pub mod logging;
pub mod observer;

pub use error::{ContextError, ObserverError, StoreError};
pub use observer::{
    CallInfo, ErrorEvent, Event, EventStore, MemoryStore, MetricsEvent, MongoStore, Observer,
    ObserverLayer, ObserverService, RequestContext, RequestIdStrategy, UnaryCall,
    RECORDED_STATUS_CODE,
};
