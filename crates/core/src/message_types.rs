//! WebSocket message type discriminators.
//!
//! These are the canonical values of the `type` field on frames
//! exchanged with the FlowML control plane.

/// Job lifecycle change (queued, running, completed, failed).
pub const MSG_TYPE_JOB_UPDATE: &str = "job_update";

/// Worker joined, left or changed health.
pub const MSG_TYPE_WORKER_STATUS: &str = "worker_status";

/// A chunk of training or worker log output.
pub const MSG_TYPE_LOG_STREAM: &str = "log_stream";

/// A metric sample (loss, accuracy, resource usage).
pub const MSG_TYPE_METRIC_UPDATE: &str = "metric_update";

/// Cluster-wide announcement carrying its own severity level.
pub const MSG_TYPE_SYSTEM_EVENT: &str = "system_event";

/// Sent by the client once per successful connection.
pub const MSG_TYPE_HANDSHAKE: &str = "handshake";

/// Payload `status` value marking a finished training job.
pub const JOB_STATUS_COMPLETED: &str = "completed";

/// Payload `status` value marking a worker that came online.
pub const WORKER_STATUS_ONLINE: &str = "online";
