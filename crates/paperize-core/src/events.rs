//! Event emission abstraction.
//!
//! The engine surfaces user-visible notifications (the next wallpaper change
//! time) as named events; the host decides how to present them.

use std::sync::Arc;

use serde::Serialize;

/// Event name for the "next wallpaper change" notification.
pub const NEXT_WALLPAPER_CHANGE: &str = "next-wallpaper-change";

/// Receives notifications raised by the rotation engine.
pub trait EventSink: Send + Sync {
    /// `payload_json` is the serialized payload of `event_name`.
    fn emit(&self, event_name: &str, payload_json: &str);
}

/// Typed convenience over [`EventSink::emit`].
pub trait EventSinkExt {
    fn emit_typed<T: Serialize>(&self, event_name: &str, payload: &T);
}

impl<S: EventSink + ?Sized> EventSinkExt for S {
    fn emit_typed<T: Serialize>(&self, event_name: &str, payload: &T) {
        let Ok(json) = serde_json::to_string(payload).inspect_err(|e| {
            tracing::error!(event = event_name, "payload could not be serialized: {}", e)
        }) else {
            return;
        };
        self.emit(event_name, &json);
    }
}

/// Shared reference to an EventSink implementation.
pub type SharedEventSink = Arc<dyn EventSink>;

/// Payload of [`NEXT_WALLPAPER_CHANGE`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NextChangePayload {
    /// Persisted form (`%Y-%m-%dT%H:%M:%S`)
    pub next_set_time: String,
    /// Human-readable form for the notification body
    pub display_time: String,
}

/// Drops every event.
#[derive(Debug, Clone, Default)]
pub struct NoOpEventSink;

impl EventSink for NoOpEventSink {
    fn emit(&self, _event_name: &str, _payload_json: &str) {}
}

/// Event sink that writes every event to the log.
#[derive(Debug, Clone, Default)]
pub struct LoggingEventSink;

impl EventSink for LoggingEventSink {
    fn emit(&self, event_name: &str, payload_json: &str) {
        tracing::info!(event = event_name, payload = payload_json, "notification");
    }
}
