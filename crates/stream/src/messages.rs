//! Control-plane WebSocket frames and their codec.
//!
//! The control plane sends JSON text frames shaped
//! `{"type": "<kind>", "payload": {...}, "timestamp": "<iso-8601>"}`.
//! [`parse_frame`] turns one into an [`InboundEvent`], decoding a typed
//! view of the payload for the kinds the client understands. Tags it
//! does not know land in [`EventBody::Other`] instead of failing.

use flowml_core::message_types::{
    MSG_TYPE_HANDSHAKE, MSG_TYPE_JOB_UPDATE, MSG_TYPE_LOG_STREAM, MSG_TYPE_METRIC_UPDATE,
    MSG_TYPE_SYSTEM_EVENT, MSG_TYPE_WORKER_STATUS,
};
use flowml_core::types::Timestamp;
use serde::{Deserialize, Serialize};
use serde_json::Value;

// ---------------------------------------------------------------------------
// Inbound
// ---------------------------------------------------------------------------

/// A decoded inbound frame.
#[derive(Debug, Clone, PartialEq)]
pub struct InboundEvent {
    /// Typed view selected by the frame's `type` tag.
    pub body: EventBody,
    /// The payload exactly as received (`null` when absent).
    pub payload: Value,
    /// Sender-assigned timestamp, as received. Numbers keep their JSON
    /// text; absent, `null` or any other shape becomes empty.
    pub timestamp: String,
}

/// Inbound event variants, keyed by the frame's `type` field.
#[derive(Debug, Clone, PartialEq)]
pub enum EventBody {
    JobUpdate(JobUpdate),
    WorkerStatus(WorkerStatus),
    LogStream,
    MetricUpdate,
    SystemEvent(SystemEvent),
    /// A tag outside the known set.
    Other { kind: String },
}

/// Payload view for `job_update` frames.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JobUpdate {
    pub status: Option<String>,
    /// `jobName` on the wire.
    pub job_name: Option<String>,
    /// Accuracy in percent. Accepts a JSON number or a numeric string.
    pub accuracy: Option<f64>,
}

/// Payload view for `worker_status` frames.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorkerStatus {
    pub status: Option<String>,
    /// `workerName` on the wire.
    pub worker_name: Option<String>,
}

/// Payload view for `system_event` frames.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SystemEvent {
    pub level: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
}

impl JobUpdate {
    fn decode(payload: &Value) -> Self {
        Self {
            status: str_field(payload, "status"),
            job_name: str_field(payload, "jobName"),
            accuracy: num_field(payload, "accuracy"),
        }
    }
}

impl WorkerStatus {
    fn decode(payload: &Value) -> Self {
        Self {
            status: str_field(payload, "status"),
            worker_name: str_field(payload, "workerName"),
        }
    }
}

impl SystemEvent {
    fn decode(payload: &Value) -> Self {
        Self {
            level: str_field(payload, "level"),
            title: str_field(payload, "title"),
            description: str_field(payload, "description"),
        }
    }
}

impl EventBody {
    fn decode(kind: String, payload: &Value) -> Self {
        match kind.as_str() {
            MSG_TYPE_JOB_UPDATE => Self::JobUpdate(JobUpdate::decode(payload)),
            MSG_TYPE_WORKER_STATUS => Self::WorkerStatus(WorkerStatus::decode(payload)),
            MSG_TYPE_LOG_STREAM => Self::LogStream,
            MSG_TYPE_METRIC_UPDATE => Self::MetricUpdate,
            MSG_TYPE_SYSTEM_EVENT => Self::SystemEvent(SystemEvent::decode(payload)),
            _ => Self::Other { kind },
        }
    }

    /// The wire tag for this variant.
    pub fn kind(&self) -> &str {
        match self {
            Self::JobUpdate(_) => MSG_TYPE_JOB_UPDATE,
            Self::WorkerStatus(_) => MSG_TYPE_WORKER_STATUS,
            Self::LogStream => MSG_TYPE_LOG_STREAM,
            Self::MetricUpdate => MSG_TYPE_METRIC_UPDATE,
            Self::SystemEvent(_) => MSG_TYPE_SYSTEM_EVENT,
            Self::Other { kind } => kind,
        }
    }
}

impl InboundEvent {
    pub fn kind(&self) -> &str {
        self.body.kind()
    }

    /// `false` for frames whose tag fell into [`EventBody::Other`].
    pub fn is_known(&self) -> bool {
        !matches!(self.body, EventBody::Other { .. })
    }

    /// The sender timestamp parsed as RFC 3339, if it is one.
    pub fn parsed_timestamp(&self) -> Option<Timestamp> {
        chrono::DateTime::parse_from_rfc3339(&self.timestamp)
            .ok()
            .map(|ts| ts.with_timezone(&chrono::Utc))
    }
}

/// Wire envelope before the per-variant decode step.
#[derive(Deserialize)]
struct RawFrame {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    payload: Value,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    timestamp: String,
}

fn lenient_timestamp<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        _ => String::new(),
    })
}

/// Parse an inbound WebSocket text frame.
///
/// Returns `Err` when the text is not a JSON object with a string
/// `type`. Callers should log the failure and drop the frame.
pub fn parse_frame(text: &str) -> Result<InboundEvent, FrameError> {
    let raw: RawFrame = serde_json::from_str(text)?;
    let body = EventBody::decode(raw.kind, &raw.payload);
    Ok(InboundEvent {
        body,
        payload: raw.payload,
        timestamp: raw.timestamp,
    })
}

/// An inbound frame that could not be decoded.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    #[error("Malformed frame: {0}")]
    Malformed(#[from] serde_json::Error),
}

fn str_field(payload: &Value, key: &str) -> Option<String> {
    payload.get(key).and_then(Value::as_str).map(str::to_owned)
}

fn num_field(payload: &Value, key: &str) -> Option<f64> {
    match payload.get(key)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Outbound
// ---------------------------------------------------------------------------

/// A frame the owner asks the client to send.
///
/// The client stamps it with the send time; callers supply only the
/// `type` and an optional payload.
#[derive(Debug, Clone, PartialEq)]
pub struct OutboundMessage {
    pub kind: String,
    pub payload: Value,
}

impl OutboundMessage {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            payload: Value::Null,
        }
    }

    pub fn with_payload(mut self, payload: Value) -> Self {
        self.payload = payload;
        self
    }

    /// Serialize with `timestamp` attached. A `null` payload is omitted.
    pub fn encode(&self, timestamp: &str) -> Result<String, serde_json::Error> {
        serde_json::to_string(&StampedFrame {
            kind: &self.kind,
            payload: &self.payload,
            timestamp,
        })
    }
}

#[derive(Serialize)]
struct StampedFrame<'a> {
    #[serde(rename = "type")]
    kind: &'a str,
    #[serde(skip_serializing_if = "is_null")]
    payload: &'a Value,
    timestamp: &'a str,
}

fn is_null(value: &&Value) -> bool {
    value.is_null()
}

#[derive(Serialize)]
struct HandshakeFrame<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    payload: HandshakePayload<'a>,
}

#[derive(Serialize)]
struct HandshakePayload<'a> {
    client: &'a str,
    version: &'a str,
}

/// The frame sent once after every successful connection.
pub fn encode_handshake(client: &str, version: &str) -> Result<String, serde_json::Error> {
    serde_json::to_string(&HandshakeFrame {
        kind: MSG_TYPE_HANDSHAKE,
        payload: HandshakePayload { client, version },
    })
}
