//! Persisted event records
//!
//! Both kinds share the `request_id` namespace and live side by side in one
//! collection. Field names match the stored document shape:
//!
//! | field         | ErrorEvent | MetricsEvent |
//! |---------------|------------|--------------|
//! | `request_id`  | yes        | yes          |
//! | `error_msg`   | yes        |              |
//! | `details`     | yes        |              |
//! | `service`     |            | yes          |
//! | `duration`    |            | yes (f64 s)  |
//! | `status_code` |            | yes          |
//! | `timestamp`   | yes        | yes          |

use bson::serde_helpers::chrono_datetime_as_bson_datetime;
use bson::Document;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Duration;

/// One failed request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorEvent {
    pub request_id: String,

    #[serde(rename = "error_msg")]
    pub error_message: String,

    /// Insert time, not request start time
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub timestamp: DateTime<Utc>,

    pub details: String,
}

impl ErrorEvent {
    /// Build an event stamped with the current time
    pub fn now(
        request_id: impl Into<String>,
        error_message: impl Into<String>,
        details: impl Into<String>,
    ) -> Self {
        Self {
            request_id: request_id.into(),
            error_message: error_message.into(),
            timestamp: Utc::now(),
            details: details.into(),
        }
    }
}

/// One completed request's performance record
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsEvent {
    pub request_id: String,
    pub service: String,

    #[serde(rename = "duration")]
    pub duration_seconds: f64,

    pub status_code: i32,

    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub timestamp: DateTime<Utc>,
}

impl MetricsEvent {
    pub fn now(
        request_id: impl Into<String>,
        service: impl Into<String>,
        duration: Duration,
        status_code: i32,
    ) -> Self {
        Self {
            request_id: request_id.into(),
            service: service.into(),
            duration_seconds: duration.as_secs_f64(),
            status_code,
            timestamp: Utc::now(),
        }
    }
}

/// Either kind of event, as handed to an [`EventStore`](super::EventStore)
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Error(ErrorEvent),
    Metrics(MetricsEvent),
}

impl Event {
    pub fn request_id(&self) -> &str {
        match self {
            Self::Error(e) => &e.request_id,
            Self::Metrics(m) => &m.request_id,
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            Self::Error(e) => e.timestamp,
            Self::Metrics(m) => m.timestamp,
        }
    }

    pub fn as_error(&self) -> Option<&ErrorEvent> {
        match self {
            Self::Error(e) => Some(e),
            Self::Metrics(_) => None,
        }
    }

    pub fn as_metrics(&self) -> Option<&MetricsEvent> {
        match self {
            Self::Metrics(m) => Some(m),
            Self::Error(_) => None,
        }
    }

    /// Encode as the BSON document written to the collection
    pub fn to_document(&self) -> Result<Document, bson::ser::Error> {
        match self {
            Self::Error(e) => bson::to_document(e),
            Self::Metrics(m) => bson::to_document(m),
        }
    }
}

impl From<ErrorEvent> for Event {
    fn from(event: ErrorEvent) -> Self {
        Self::Error(event)
    }
}

impl From<MetricsEvent> for Event {
    fn from(event: MetricsEvent) -> Self {
        Self::Metrics(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::Bson;

    #[test]
    fn test_error_event_document_shape() {
        let event = Event::from(ErrorEvent::now("req-1", "boom", "stack..."));
        let doc = event.to_document().unwrap();

        assert_eq!(doc.get_str("request_id").unwrap(), "req-1");
        assert_eq!(doc.get_str("error_msg").unwrap(), "boom");
        assert_eq!(doc.get_str("details").unwrap(), "stack...");
        assert!(matches!(doc.get("timestamp"), Some(Bson::DateTime(_))));
        assert!(!doc.contains_key("service"));
        assert!(!doc.contains_key("status_code"));
    }

    #[test]
    fn test_metrics_event_document_shape() {
        let event = Event::from(MetricsEvent::now(
            "req-2",
            "/orders.Orders/Create",
            Duration::from_millis(1500),
            200,
        ));
        let doc = event.to_document().unwrap();

        assert_eq!(doc.get_str("service").unwrap(), "/orders.Orders/Create");
        assert_eq!(doc.get_f64("duration").unwrap(), 1.5);
        assert_eq!(doc.get_i32("status_code").unwrap(), 200);
        assert!(matches!(doc.get("timestamp"), Some(Bson::DateTime(_))));
        assert!(!doc.contains_key("error_msg"));
    }

    #[test]
    fn test_accessors() {
        let event = Event::from(MetricsEvent::now("abc", "svc", Duration::ZERO, 200));
        assert_eq!(event.request_id(), "abc");
        assert!(event.as_metrics().is_some());
        assert!(event.as_error().is_none());
    }
}
