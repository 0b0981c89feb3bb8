//! Bounded in-memory log of recent errors.
//!
//! The composition root builds one [`ErrorLog`], installs its [`ErrorLogLayer`] into the
//! tracing subscriber and hands clones of it to whatever needs to read or observe errors.
//! Every `ERROR` event is kept (up to the configured capacity) and published to subscribers.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::VecDeque;
use std::fmt::Debug;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::broadcast;
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::Layer;
use tracing_subscriber::layer;

const LISTENER_BUFFER: usize = 64;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorRecord {
    pub recorded_at: DateTime<Utc>,
    pub target: String,
    pub message: String,
    pub fields: Vec<String>,
}

#[derive(Clone)]
pub struct ErrorLog {
    inner: Arc<Inner>,
}

struct Inner {
    capacity: usize,
    records: Mutex<VecDeque<ErrorRecord>>,
    listeners: broadcast::Sender<ErrorRecord>,
}

impl ErrorLog {
    pub fn new(capacity: usize) -> Self {
        let (listeners, _) = broadcast::channel(LISTENER_BUFFER);
        Self {
            inner: Arc::new(Inner {
                capacity: capacity.max(1),
                records: Mutex::new(VecDeque::with_capacity(capacity.max(1))),
                listeners,
            }),
        }
    }

    pub fn record(&self, record: ErrorRecord) {
        {
            let mut records = self
                .inner
                .records
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            if records.len() == self.inner.capacity {
                records.pop_front();
            }
            records.push_back(record.clone());
        }
        let _ = self.inner.listeners.send(record);
    }

    /// Oldest first.
    pub fn recent(&self) -> Vec<ErrorRecord> {
        let records = self
            .inner
            .records
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        records.iter().cloned().collect()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ErrorRecord> {
        self.inner.listeners.subscribe()
    }

    pub fn layer(&self) -> ErrorLogLayer {
        ErrorLogLayer { log: self.clone() }
    }
}

pub struct ErrorLogLayer {
    log: ErrorLog,
}

impl<S: Subscriber> Layer<S> for ErrorLogLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: layer::Context<'_, S>) {
        let metadata = event.metadata();
        if *metadata.level() != Level::ERROR {
            return;
        }

        let mut visitor = RecordVisitor::default();
        event.record(&mut visitor);
        self.log.record(ErrorRecord {
            recorded_at: Utc::now(),
            target: metadata.target().to_owned(),
            message: visitor.message,
            fields: visitor.fields,
        });
    }
}

#[derive(Default)]
struct RecordVisitor {
    message: String,
    fields: Vec<String>,
}

impl Visit for RecordVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_owned();
        } else {
            self.fields.push(format!("{}={value}", field.name()));
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn Debug) {
        if field.name() == "message" {
            self.message = format!("{value:?}");
        } else {
            self.fields.push(format!("{}={value:?}", field.name()));
        }
    }
}
