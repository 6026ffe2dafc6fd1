use std::sync::Arc;

use crate::store::AttendeeRepository;

/// Derives invoice numbers and payment references from the attendee count.
///
/// Nothing is reserved: two registrations that read the count before either
/// inserts get the same invoice number.
#[derive(Clone)]
pub struct ReferenceGenerator {
    attendees: Arc<dyn AttendeeRepository>,
}

impl ReferenceGenerator {
    pub fn new(attendees: Arc<dyn AttendeeRepository>) -> Self {
        Self { attendees }
    }

    /// Attendee count plus one. Falls back to 1 when the count cannot be read
    /// so that registration does not fail on it.
    pub async fn next_invoice_number(&self) -> i64 {
        match self.attendees.count().await {
            Ok(count) => count + 1,
            Err(e) => {
                tracing::warn!(error = %e, "Attendee count failed, using invoice number 1");
                1
            }
        }
    }

    /// `{identification}{invoice number}` as decimal text
    pub async fn generate_reference(&self, identification: i64) -> String {
        let invoice_number = self.next_invoice_number().await;
        format!("{}{}", identification, invoice_number)
    }
}
