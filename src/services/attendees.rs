use chrono::Local;
use std::sync::Arc;

use crate::models::attendee::Attendee;
use crate::store::{AttendeeRepository, StoreError};

#[derive(thiserror::Error, Debug)]
pub enum AttendeeError {
    #[error("Attendee with identification {0} not found")]
    NotFound(i64),

    #[error("Attendee {0} already registered their entry")]
    EntryAlreadyRegistered(i64),

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Clone)]
pub struct AttendeeService {
    attendees: Arc<dyn AttendeeRepository>,
}

impl AttendeeService {
    pub fn new(attendees: Arc<dyn AttendeeRepository>) -> Self {
        Self { attendees }
    }

    pub async fn list(&self) -> Result<Vec<Attendee>, AttendeeError> {
        Ok(self.attendees.list().await?)
    }

    pub async fn find(&self, identification: i64) -> Result<Attendee, AttendeeError> {
        self.attendees
            .find(identification)
            .await?
            .ok_or(AttendeeError::NotFound(identification))
    }

    /// Records the attendee's arrival at the venue. The flag flips once;
    /// every later attempt is a conflict and leaves the stored time alone.
    #[tracing::instrument(skip(self))]
    pub async fn register_entry(&self, identification: i64) -> Result<Attendee, AttendeeError> {
        let attendee = self.find(identification).await?;
        if attendee.entry {
            return Err(AttendeeError::EntryAlreadyRegistered(identification));
        }

        let entry_time = Local::now().format("%H:%M:%S").to_string();

        // The conditional update loses against a concurrent entry for the same attendee
        let attendee = self
            .attendees
            .mark_entry(identification, &entry_time)
            .await?
            .ok_or(AttendeeError::EntryAlreadyRegistered(identification))?;

        tracing::info!(entry_time = %entry_time, "Entry registered");

        Ok(attendee)
    }
}
