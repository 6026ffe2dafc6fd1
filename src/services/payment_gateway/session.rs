use reqwest::Client;
use secrecy::{ExposeSecret, Secret};
use std::time::Duration;
use tokio::sync::RwLock;
use url::Url;

use super::types::{GatewayEnvelope, LoginRequest};
use super::GatewayError;
use crate::config::Config;

/// Where and as whom to log in to the gateway
#[derive(Debug, Clone)]
pub struct GatewaySettings {
    base_url: Option<Url>,
    username: Option<String>,
    password: Option<Secret<String>>,
    timeout: Duration,
}

impl GatewaySettings {
    pub fn new(
        base_url: Option<&str>,
        username: Option<String>,
        password: Option<Secret<String>>,
        timeout: Duration,
    ) -> Result<Self, GatewayError> {
        let base_url = base_url
            .filter(|url| !url.trim().is_empty())
            .map(|url| {
                Url::parse(url).map_err(|e| {
                    GatewayError::Configuration(format!("invalid payment_url {url:?}: {e}"))
                })
            })
            .transpose()?;

        Ok(Self {
            base_url,
            username: username.filter(|u| !u.is_empty()),
            password: password.filter(|p| !p.expose_secret().is_empty()),
            timeout,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, GatewayError> {
        Self::new(
            config.payment_url.as_deref(),
            config.payment_username.clone(),
            config.payment_password.clone(),
            Duration::from_secs(config.payment_timeout_secs),
        )
    }

    pub fn is_configured(&self) -> bool {
        self.base_url.is_some() && self.username.is_some() && self.password.is_some()
    }
}

/// Process-wide login state against the payment gateway.
///
/// Holds at most one bearer credential. It is never expired by a timer: the
/// client finds out it is stale when the gateway answers 401 and calls
/// [`GatewaySession::authenticate`] again. Concurrent callers may log in
/// redundantly; the last successful login wins.
pub struct GatewaySession {
    http: Client,
    settings: GatewaySettings,
    credential: RwLock<Option<Secret<String>>>,
}

impl GatewaySession {
    pub fn new(settings: GatewaySettings) -> Result<Self, GatewayError> {
        let http = Client::builder().timeout(settings.timeout).build()?;

        Ok(Self {
            http,
            settings,
            credential: RwLock::new(None),
        })
    }

    pub(crate) fn http(&self) -> &Client {
        &self.http
    }

    pub fn is_configured(&self) -> bool {
        self.settings.is_configured()
    }

    /// Absolute URL for a gateway path such as `login/auth`
    pub(crate) fn endpoint(&self, path: &str) -> Result<String, GatewayError> {
        let base = self
            .settings
            .base_url
            .as_ref()
            .ok_or_else(|| GatewayError::Configuration("payment_url is not set".to_string()))?;

        Ok(format!("{}/{}", base.as_str().trim_end_matches('/'), path))
    }

    pub async fn current_credential(&self) -> Option<Secret<String>> {
        self.credential.read().await.clone()
    }

    /// Logs in with the configured account and caches the returned token,
    /// replacing whatever was cached before.
    #[tracing::instrument(skip(self))]
    pub async fn authenticate(&self) -> Result<Secret<String>, GatewayError> {
        let url = self.endpoint("login/auth")?;
        let username = self
            .settings
            .username
            .as_deref()
            .ok_or_else(|| GatewayError::Configuration("payment_username is not set".to_string()))?;
        let password = self
            .settings
            .password
            .as_ref()
            .ok_or_else(|| GatewayError::Configuration("payment_password is not set".to_string()))?;

        let response = self
            .http
            .post(&url)
            .json(&LoginRequest {
                username,
                password: password.expose_secret(),
            })
            .send()
            .await
            .map_err(|e| GatewayError::Authentication(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status = %status, "Payment gateway login rejected");
            return Err(GatewayError::Authentication(format!(
                "login returned HTTP {}: {}",
                status, body
            )));
        }

        let envelope: GatewayEnvelope<String> = response
            .json()
            .await
            .map_err(|e| GatewayError::Authentication(format!("unreadable login response: {e}")))?;

        let token = match envelope.result.filter(|token| !token.is_empty()) {
            Some(token) => Secret::new(token),
            None => {
                return Err(GatewayError::Authentication(
                    envelope
                        .message
                        .unwrap_or_else(|| "no token in login response".to_string()),
                ))
            }
        };

        *self.credential.write().await = Some(token.clone());

        tracing::info!("Authenticated against payment gateway");

        Ok(token)
    }
}
