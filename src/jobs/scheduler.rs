use std::sync::Arc;
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

use super::payment_reconciler::reconcile_pending_payments;
use crate::services::payment_gateway::PaymentGateway;
use crate::store::AttendeeRepository;

/// Starts the cron scheduler running the pending-payment sweep on `schedule`
/// (six-field cron expression, seconds first).
pub async fn start_reconciliation(
    schedule: &str,
    attendees: Arc<dyn AttendeeRepository>,
    gateway: Arc<dyn PaymentGateway>,
) -> Result<JobScheduler, JobSchedulerError> {
    let scheduler = JobScheduler::new().await?;

    let job = Job::new_async(schedule, move |_id, _scheduler| {
        let attendees = attendees.clone();
        let gateway = gateway.clone();

        Box::pin(async move {
            if let Err(e) = reconcile_pending_payments(attendees.as_ref(), gateway.as_ref()).await {
                tracing::error!(error = %e, "Payment reconciliation could not load attendees");
            }
        })
    })?;

    scheduler.add(job).await?;
    scheduler.start().await?;

    tracing::info!(schedule, "Payment reconciliation scheduled");

    Ok(scheduler)
}
