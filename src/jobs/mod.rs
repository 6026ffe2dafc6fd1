// Jobs module - Scheduled background work

pub mod payment_reconciler;
pub mod scheduler;
