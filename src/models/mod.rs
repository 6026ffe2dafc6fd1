// Models module - Database entity representations

pub mod attendee;
pub mod profile;

pub use attendee::{Attendee, AttendeeSummary, NewAttendee, PaymentStatus};
pub use profile::{LoginProfile, Role};
