//! Audit emitter
//!
//! Audit events travel through a bounded channel to a single writer task.
//! Emitting never blocks the request path: when the queue is full or the
//! writer is gone, the event is dropped with a warning.

use filegate_core::AuditEvent;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::task::JoinHandle;

#[derive(Debug, Clone)]
pub struct AuditLogger {
    tx: mpsc::Sender<AuditEvent>,
}

impl AuditLogger {
    /// Create a logger and hand back the receiving end, for custom sinks.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<AuditEvent>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx }, rx)
    }

    /// Create a logger whose events are written to the `audit` tracing target
    /// by a background task. Must be called inside a Tokio runtime.
    pub fn spawn(capacity: usize) -> Self {
        Self::spawn_with_handle(capacity).0
    }

    /// Like `spawn`, also returning the writer task. The task ends once every
    /// clone of the logger is dropped and the queue is drained.
    pub fn spawn_with_handle(capacity: usize) -> (Self, JoinHandle<()>) {
        let (logger, mut rx) = Self::channel(capacity);

        let writer = tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                write_event(&event);
            }
            tracing::debug!("Audit writer stopped");
        });

        tracing::info!(queue_size = capacity, "Audit logger initialized with bounded channel");
        (logger, writer)
    }

    pub fn emit(&self, event: AuditEvent) {
        if let Err(e) = self.tx.try_send(event) {
            match e {
                TrySendError::Full(event) => tracing::warn!(
                    action = %event.action,
                    file_id = %event.file_id,
                    "Audit queue is full, dropping event"
                ),
                TrySendError::Closed(event) => tracing::warn!(
                    action = %event.action,
                    file_id = %event.file_id,
                    "Audit writer is gone, dropping event"
                ),
            }
        }
    }
}

/// Log one event as JSON on the `audit` target; rejections go out at WARN.
pub fn write_event(event: &AuditEvent) {
    let json = serde_json::to_string(event).unwrap_or_else(|_| "{}".to_string());

    if event.is_failure() {
        tracing::event!(
            target: "audit",
            tracing::Level::WARN,
            audit_entry = %json,
            action = %event.action,
            file_id = %event.file_id,
            user_id = %event.user_id,
            "File audit log"
        );
    } else {
        tracing::event!(
            target: "audit",
            tracing::Level::INFO,
            audit_entry = %json,
            action = %event.action,
            file_id = %event.file_id,
            user_id = %event.user_id,
            "File audit log"
        );
    }
}
