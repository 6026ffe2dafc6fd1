use async_trait::async_trait;
use reqwest::StatusCode;
use secrecy::{ExposeSecret, Secret};
use std::future::Future;
use std::sync::Arc;

use super::session::GatewaySession;
use super::types::{GatewayEnvelope, TransactionRequest, TransactionResult, TransactionStatus};
use super::GatewayError;

/// Re-authentications allowed per call before a 401 becomes fatal
const MAX_REAUTHENTICATIONS: usize = 1;

/// Transaction operations the registration flow and the reconciler rely on
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_transaction(
        &self,
        request: &TransactionRequest,
    ) -> Result<TransactionResult, GatewayError>;

    async fn query_transaction(&self, transaction_id: i64)
        -> Result<TransactionStatus, GatewayError>;
}

/// Outcome of a single authorized request
enum Attempt<T> {
    Done(T),
    Unauthorized,
}

pub struct PaymentGatewayClient {
    session: Arc<GatewaySession>,
}

impl PaymentGatewayClient {
    pub fn new(session: Arc<GatewaySession>) -> Self {
        Self { session }
    }

    pub fn session(&self) -> &GatewaySession {
        &self.session
    }

    /// Runs `send` with the cached credential, logging in first if there is
    /// none. A 401 triggers one fresh login and one re-issue of the request;
    /// a second 401 is reported as [`GatewayError::CredentialRejected`].
    async fn authorized<T, F, Fut>(&self, send: F) -> Result<T, GatewayError>
    where
        F: Fn(Secret<String>) -> Fut,
        Fut: Future<Output = Result<Attempt<T>, GatewayError>>,
    {
        let mut credential = match self.session.current_credential().await {
            Some(credential) => credential,
            None => self.session.authenticate().await?,
        };

        let mut reauthentications = 0;
        loop {
            match send(credential).await? {
                Attempt::Done(value) => return Ok(value),
                Attempt::Unauthorized if reauthentications < MAX_REAUTHENTICATIONS => {
                    reauthentications += 1;
                    tracing::warn!("Payment gateway rejected credential, re-authenticating");
                    credential = self.session.authenticate().await?;
                }
                Attempt::Unauthorized => {
                    tracing::error!(
                        reauthentications,
                        "Payment gateway rejected a fresh credential"
                    );
                    return Err(GatewayError::CredentialRejected);
                }
            }
        }
    }

    async fn send_create(
        &self,
        request: &TransactionRequest,
        credential: Secret<String>,
    ) -> Result<Attempt<TransactionResult>, GatewayError> {
        let url = self.session.endpoint("transaction/insertTransaction")?;

        let response = self
            .session
            .http()
            .post(&url)
            .bearer_auth(credential.expose_secret())
            .json(request)
            .send()
            .await?;

        match response.status() {
            StatusCode::UNAUTHORIZED => Ok(Attempt::Unauthorized),
            status if status.is_success() => {
                let envelope: GatewayEnvelope<TransactionResult> = response
                    .json()
                    .await
                    .map_err(|e| GatewayError::InvalidResponse(e.to_string()))?;

                envelope.result.map(Attempt::Done).ok_or_else(|| {
                    GatewayError::InvalidResponse(
                        envelope
                            .message
                            .unwrap_or_else(|| "missing transaction result".to_string()),
                    )
                })
            }
            _ => Err(GatewayError::upstream(response).await),
        }
    }

    async fn send_query(
        &self,
        transaction_id: i64,
        credential: Secret<String>,
    ) -> Result<Attempt<TransactionStatus>, GatewayError> {
        let url = self
            .session
            .endpoint("transaction/GetTransactionInformationIDTransaction")?;

        let response = self
            .session
            .http()
            .get(&url)
            .query(&[("IDTransaction", transaction_id)])
            .bearer_auth(credential.expose_secret())
            .send()
            .await?;

        match response.status() {
            StatusCode::UNAUTHORIZED => Ok(Attempt::Unauthorized),
            StatusCode::NOT_FOUND => Err(GatewayError::TransactionNotFound(transaction_id)),
            status if status.is_success() => {
                let envelope: GatewayEnvelope<TransactionStatus> = response
                    .json()
                    .await
                    .map_err(|e| GatewayError::InvalidResponse(e.to_string()))?;

                envelope
                    .result
                    .map(Attempt::Done)
                    .ok_or(GatewayError::TransactionNotFound(transaction_id))
            }
            _ => Err(GatewayError::upstream(response).await),
        }
    }
}

#[async_trait]
impl PaymentGateway for PaymentGatewayClient {
    #[tracing::instrument(skip(self, request), fields(reference = %request.reference))]
    async fn create_transaction(
        &self,
        request: &TransactionRequest,
    ) -> Result<TransactionResult, GatewayError> {
        let result = self
            .authorized(move |credential| self.send_create(request, credential))
            .await?;

        tracing::info!(
            transaction_id = result.transaction_id,
            "Payment transaction created"
        );

        Ok(result)
    }

    #[tracing::instrument(skip(self))]
    async fn query_transaction(
        &self,
        transaction_id: i64,
    ) -> Result<TransactionStatus, GatewayError> {
        self.authorized(move |credential| self.send_query(transaction_id, credential))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::payment_gateway::{GatewaySettings, Payer};
    use serde_json::json;
    use std::time::Duration;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const QUERY_PATH: &str = "/transaction/GetTransactionInformationIDTransaction";

    fn client(server: &MockServer) -> PaymentGatewayClient {
        let settings = GatewaySettings::new(
            Some(server.uri().as_str()),
            Some("api-user".to_string()),
            Some(Secret::new("api-pass".to_string())),
            Duration::from_secs(5),
        )
        .unwrap();

        PaymentGatewayClient::new(Arc::new(GatewaySession::new(settings).unwrap()))
    }

    async fn mount_login(server: &MockServer, expected_logins: u64) {
        Mock::given(method("POST"))
            .and(path("/login/auth"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"result": "tok"})))
            .expect(expected_logins)
            .mount(server)
            .await;
    }

    fn request() -> TransactionRequest {
        TransactionRequest {
            procedure_id: 7,
            payer: Payer {
                document: "123".to_string(),
                document_type: 1,
                full_name: None,
                verification_digit: None,
                first_name: "Ana".to_string(),
                middle_name: String::new(),
                last_name: "Rojas".to_string(),
                second_last_name: String::new(),
                phone: "555".to_string(),
                email: "a@x.com".to_string(),
                address: "Cali".to_string(),
            },
            payment_source: 1,
            implementation_type: 1,
            return_url_enabled: false,
            return_url: None,
            amount: 500_000,
            invoice_number: 5,
            reference: "1235".to_string(),
            description: "Pago Congreso Magno 3.0".to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_transaction_logs_in_once_and_reuses_credential() {
        let server = MockServer::start().await;
        mount_login(&server, 1).await;
        Mock::given(method("POST"))
            .and(path("/transaction/insertTransaction"))
            .and(header("authorization", "Bearer tok"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "state": 1,
                "isSuccess": true,
                "message": null,
                "result": {"idTransaccion": 9, "url": "https://pay/9"}
            })))
            .expect(2)
            .mount(&server)
            .await;

        let client = client(&server);
        for _ in 0..2 {
            let result = client.create_transaction(&request()).await.unwrap();
            assert_eq!(result.transaction_id, 9);
            assert_eq!(result.url, "https://pay/9");
        }
    }

    #[tokio::test]
    async fn test_single_unauthorized_triggers_one_reauthentication() {
        let server = MockServer::start().await;
        mount_login(&server, 2).await;
        Mock::given(method("GET"))
            .and(path(QUERY_PATH))
            .respond_with(ResponseTemplate::new(401))
            .up_to_n_times(1)
            .with_priority(1)
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(QUERY_PATH))
            .and(query_param("IDTransaction", "9"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "result": {"estado_Descripcion": "Aprobada"}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let status = client(&server).query_transaction(9).await.unwrap();
        assert_eq!(status.status_description, "Aprobada");
    }

    #[tokio::test]
    async fn test_second_unauthorized_is_fatal_without_third_attempt() {
        let server = MockServer::start().await;
        mount_login(&server, 2).await;
        Mock::given(method("POST"))
            .and(path("/transaction/insertTransaction"))
            .respond_with(ResponseTemplate::new(401))
            .expect(2)
            .mount(&server)
            .await;

        let err = client(&server).create_transaction(&request()).await.unwrap_err();
        assert!(matches!(err, GatewayError::CredentialRejected));
    }

    #[tokio::test]
    async fn test_query_not_found() {
        let server = MockServer::start().await;
        mount_login(&server, 1).await;
        Mock::given(method("GET"))
            .and(path(QUERY_PATH))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let err = client(&server).query_transaction(77).await.unwrap_err();
        assert!(matches!(err, GatewayError::TransactionNotFound(77)));
    }

    #[tokio::test]
    async fn test_other_failures_carry_upstream_status() {
        let server = MockServer::start().await;
        mount_login(&server, 1).await;
        Mock::given(method("GET"))
            .and(path(QUERY_PATH))
            .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
            .mount(&server)
            .await;

        match client(&server).query_transaction(9).await {
            Err(GatewayError::Upstream { status, message }) => {
                assert_eq!(status, 503);
                assert_eq!(message, "maintenance");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_login_failure_is_propagated() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/login/auth"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let err = client(&server).query_transaction(9).await.unwrap_err();
        assert!(matches!(err, GatewayError::Authentication(_)));
    }
}
