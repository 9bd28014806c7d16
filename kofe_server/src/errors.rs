use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use kofe_engine::traits::OrderFlowError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("An error occurred on the backend of the server. {0}")]
    BackendError(String),
    #[error("Could not read request path: {0}")]
    InvalidRequestPath(String),
    #[error("'{0}' is not a status the board may set")]
    UnsupportedStatus(String),
    #[error("The data was not found. {0}")]
    NoRecordFound(String),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("UnspecifiedError. {0}")]
    Unspecified(String),
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequestPath(_) => StatusCode::BAD_REQUEST,
            Self::UnsupportedStatus(_) => StatusCode::BAD_REQUEST,
            Self::NoRecordFound(_) => StatusCode::NOT_FOUND,
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BackendError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unspecified(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .body(serde_json::json!({ "error": self.to_string() }).to_string())
    }
}

impl From<OrderFlowError> for ServerError {
    fn from(e: OrderFlowError) -> Self {
        match e {
            OrderFlowError::OrderNotFound(id) => Self::NoRecordFound(format!("Order #{id}")),
            other => Self::BackendError(other.to_string()),
        }
    }
}

#[cfg(test)]
mod test {
    use kofe_engine::db_types::OrderId;

    use super::*;

    #[test]
    fn missing_orders_map_to_404() {
        let err = ServerError::from(OrderFlowError::OrderNotFound(OrderId(9)));
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn error_body_is_json() {
        let err = ServerError::UnsupportedStatus("paid".to_string());
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        let body = serde_json::json!({ "error": err.to_string() }).to_string();
        assert!(body.contains("is not a status the board may set"));
    }
}
