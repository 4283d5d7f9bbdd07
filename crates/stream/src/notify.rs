//! Which inbound events become user-facing notifications.

use flowml_core::message_types::{JOB_STATUS_COMPLETED, WORKER_STATUS_ONLINE};
use flowml_core::notification::{Notification, NotificationLevel};

use crate::messages::{EventBody, InboundEvent, JobUpdate, SystemEvent, WorkerStatus};

/// Map an inbound event to the notification it should raise, if any.
///
/// - completed `job_update` → success
/// - `worker_status` going online → info
/// - every `system_event` → severity from its `level`
pub fn notification_for(event: &InboundEvent) -> Option<Notification> {
    match &event.body {
        EventBody::JobUpdate(job) if job.status.as_deref() == Some(JOB_STATUS_COMPLETED) => {
            Some(job_completed(job))
        }
        EventBody::WorkerStatus(worker)
            if worker.status.as_deref() == Some(WORKER_STATUS_ONLINE) =>
        {
            Some(worker_online(worker))
        }
        EventBody::SystemEvent(system) => Some(system_event(system)),
        _ => None,
    }
}

fn job_completed(job: &JobUpdate) -> Notification {
    let name = job.job_name.as_deref().unwrap_or("Training job");
    let description = match job.accuracy {
        Some(accuracy) => format!("{name} finished with {accuracy}% accuracy"),
        None => format!("{name} finished"),
    };
    Notification::success("Training Complete", description)
}

fn worker_online(worker: &WorkerStatus) -> Notification {
    let name = worker.worker_name.as_deref().unwrap_or("A worker");
    Notification::info("Worker Connected", format!("{name} joined the cluster"))
}

fn system_event(system: &SystemEvent) -> Notification {
    Notification::new(
        NotificationLevel::from_level(system.level.as_deref().unwrap_or_default()),
        system.title.clone().unwrap_or_else(|| "System Event".to_string()),
        system.description.clone().unwrap_or_default(),
    )
}
