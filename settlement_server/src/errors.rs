use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use settlement_engine::SettlementGatewayError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("An error occurred on the backend of the server. {0}")]
    BackendError(String),
    #[error("Payload deserialization error")]
    CouldNotDeserializePayload,
    #[error("Could not read request body: {0}")]
    InvalidRequestBody(String),
    #[error("Invalid webhook signature. {0}")]
    InvalidSignature(#[from] SignatureError),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("Invalid server configuration. {0}")]
    ConfigurationError(String),
    #[error("UnspecifiedError. {0}")]
    Unspecified(String),
    #[error("The data was not found. {0}")]
    NoRecordFound(String),
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequestBody(_) => StatusCode::BAD_REQUEST,
            Self::CouldNotDeserializePayload => StatusCode::BAD_REQUEST,
            Self::InvalidSignature(_) => StatusCode::BAD_REQUEST,
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BackendError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ConfigurationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unspecified(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::NoRecordFound(_) => StatusCode::NOT_FOUND,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .body(serde_json::json!({ "error": self.to_string() }).to_string())
    }
}

/// Why a webhook signature header failed verification.
#[derive(Debug, Clone, Error)]
pub enum SignatureError {
    #[error("No signature header was provided.")]
    MissingHeader,
    #[error("The signature header is not in the expected format. {0}")]
    MalformedHeader(String),
    #[error("The signed timestamp is outside the accepted tolerance.")]
    StaleTimestamp,
    #[error("The signature does not match the payload.")]
    Mismatch,
}

impl From<SettlementGatewayError> for ServerError {
    fn from(e: SettlementGatewayError) -> Self {
        match e {
            SettlementGatewayError::OrderNotFound(id) => Self::NoRecordFound(format!("Order {id}")),
            SettlementGatewayError::ProductNotFound(id) => Self::NoRecordFound(format!("Product {id}")),
            SettlementGatewayError::OrderNotFulfillable(id, status) => {
                Self::InvalidRequestBody(format!("Order {id} cannot be marked ready from status {status}"))
            },
            SettlementGatewayError::DatabaseError(e) => Self::BackendError(format!("Database error: {e}")),
            SettlementGatewayError::SerializationError(e) => Self::BackendError(format!("Serialization error: {e}")),
        }
    }
}
