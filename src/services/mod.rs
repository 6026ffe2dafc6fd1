// Services module - Business logic

pub mod attendees;
pub mod auth;
pub mod password;
pub mod payment_gateway;
pub mod payment_sync;
pub mod reference;
pub mod registration;
pub mod tokens;
pub mod users;
