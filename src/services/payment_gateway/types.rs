use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

#[derive(Debug, Serialize)]
pub(crate) struct LoginRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

/// Response wrapper used by every gateway endpoint
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GatewayEnvelope<T> {
    pub result: Option<T>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Payer {
    #[serde(rename = "Documento")]
    pub document: String,
    #[serde(rename = "TipoDocumento")]
    pub document_type: i32,
    #[serde(rename = "Nombre_Completo", default)]
    pub full_name: Option<String>,
    #[serde(rename = "Dv", default)]
    pub verification_digit: Option<String>,
    #[serde(rename = "PRIMERNOMBRE")]
    pub first_name: String,
    #[serde(rename = "SEGUNDONOMBRE", default)]
    pub middle_name: String,
    #[serde(rename = "PRIMERAPELLIDO")]
    pub last_name: String,
    #[serde(rename = "SEGUNDOAPELLIDO", default)]
    pub second_last_name: String,
    #[serde(rename = "Telefono")]
    pub phone: String,
    #[serde(rename = "Email")]
    pub email: String,
    #[serde(rename = "Direccion")]
    pub address: String,
}

/// Body of `POST /transaction/insertTransaction`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TransactionRequest {
    #[serde(rename = "IdTramite")]
    pub procedure_id: i64,
    #[serde(rename = "Pagador")]
    pub payer: Payer,
    #[serde(rename = "FuentePago")]
    pub payment_source: i32,
    #[serde(rename = "TipoImplementacion")]
    pub implementation_type: i32,
    #[serde(rename = "Estado_Url")]
    pub return_url_enabled: bool,
    #[serde(rename = "Url", default)]
    pub return_url: Option<String>,
    #[serde(rename = "ValorPagar")]
    pub amount: i64,
    #[serde(rename = "Factura")]
    pub invoice_number: i64,
    #[serde(rename = "referencia")]
    pub reference: String,
    #[serde(rename = "Descripcion")]
    pub description: String,
}

/// Transaction opened by the gateway; `url` is the checkout the payer is sent to
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TransactionResult {
    #[serde(rename = "idTransaccion")]
    pub transaction_id: i64,
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TransactionStatus {
    #[serde(rename = "estado_Descripcion")]
    pub status_description: String,
    #[serde(flatten)]
    pub details: Map<String, JsonValue>,
}
