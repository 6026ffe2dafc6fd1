use std::sync::Arc;

use crate::services::attendees::AttendeeService;
use crate::services::auth::AuthService;
use crate::services::payment_gateway::PaymentGateway;
use crate::services::registration::RegistrationSaga;
use crate::services::tokens::TokenIssuer;
use crate::services::users::UserService;
use crate::store::{AttendeeRepository, ProfileRepository};

/// Application state shared by every handler
#[derive(Clone)]
pub struct AppState {
    pub attendees: Arc<dyn AttendeeRepository>,
    pub gateway: Arc<dyn PaymentGateway>,
    pub registration: RegistrationSaga,
    pub attendee_service: AttendeeService,
    pub users: UserService,
    pub auth: AuthService,
    pub gateway_configured: bool,
}

impl AppState {
    pub fn new(
        attendees: Arc<dyn AttendeeRepository>,
        profiles: Arc<dyn ProfileRepository>,
        gateway: Arc<dyn PaymentGateway>,
        tokens: TokenIssuer,
        gateway_configured: bool,
    ) -> Self {
        Self {
            registration: RegistrationSaga::new(
                attendees.clone(),
                profiles.clone(),
                gateway.clone(),
            ),
            attendee_service: AttendeeService::new(attendees.clone()),
            users: UserService::new(profiles.clone()),
            auth: AuthService::new(profiles, tokens),
            attendees,
            gateway,
            gateway_configured,
        }
    }
}
