use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use log::error;
use loyalty_engine::{AuthApiError, BalanceApiError, OrderApiError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("An error occurred on the backend of the server. {0}")]
    BackendError(String),
    #[error("Could not read request body: {0}")]
    InvalidRequestBody(String),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("Invalid server configuration. {0}")]
    ConfigurationError(String),
    #[error("Authentication Error. {0}")]
    AuthenticationError(#[from] AuthError),
    #[error("Could not issue an access token. {0}")]
    CouldNotSerializeAccessToken(String),
    #[error("This login is already taken")]
    LoginAlreadyExists,
    #[error("The order was uploaded by another user")]
    OrderOwnedByAnotherUser,
    #[error("The order number is not valid")]
    InvalidOrderNumber,
    #[error("There are not enough points in the account")]
    InsufficientBalance,
    #[error("The server is shutting down")]
    ShuttingDown,
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequestBody(_) => StatusCode::BAD_REQUEST,
            Self::AuthenticationError(e) => match e {
                AuthError::MissingToken => StatusCode::UNAUTHORIZED,
                AuthError::ValidationError(_) => StatusCode::UNAUTHORIZED,
                AuthError::PoorlyFormattedToken(_) => StatusCode::UNAUTHORIZED,
                AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            },
            Self::LoginAlreadyExists => StatusCode::CONFLICT,
            Self::OrderOwnedByAnotherUser => StatusCode::CONFLICT,
            Self::InvalidOrderNumber => StatusCode::UNPROCESSABLE_ENTITY,
            Self::InsufficientBalance => StatusCode::PAYMENT_REQUIRED,
            Self::ShuttingDown => StatusCode::SERVICE_UNAVAILABLE,
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BackendError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ConfigurationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::CouldNotSerializeAccessToken(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .body(serde_json::json!({ "error": self.to_string() }).to_string())
    }
}

#[derive(Debug, Clone, Error)]
pub enum AuthError {
    #[error("No access token was provided.")]
    MissingToken,
    #[error("Access token is invalid. {0}")]
    ValidationError(String),
    #[error("Access token is not in the correct format. {0}")]
    PoorlyFormattedToken(String),
    #[error("Invalid login or password.")]
    InvalidCredentials,
}

impl From<AuthApiError> for ServerError {
    fn from(e: AuthApiError) -> Self {
        match e {
            AuthApiError::InvalidLogin | AuthApiError::InvalidPassword => Self::InvalidRequestBody(e.to_string()),
            AuthApiError::LoginAlreadyExists => Self::LoginAlreadyExists,
            AuthApiError::InvalidCredentials => Self::AuthenticationError(AuthError::InvalidCredentials),
            AuthApiError::DatabaseError(e) => Self::BackendError(format!("Database error: {e}")),
            AuthApiError::HashingError(e) => {
                error!("💻️ Password hashing failed. {e}");
                Self::BackendError(format!("Could not process credentials. {e}"))
            },
        }
    }
}

impl From<OrderApiError> for ServerError {
    fn from(e: OrderApiError) -> Self {
        match e {
            OrderApiError::DatabaseError(e) => Self::BackendError(format!("Database error: {e}")),
            OrderApiError::Cancelled => Self::ShuttingDown,
        }
    }
}

impl From<BalanceApiError> for ServerError {
    fn from(e: BalanceApiError) -> Self {
        match e {
            BalanceApiError::InvalidOrderFormat => Self::InvalidOrderNumber,
            BalanceApiError::InsufficientBalance => Self::InsufficientBalance,
            BalanceApiError::InvalidAmount => Self::InvalidRequestBody(e.to_string()),
            // A valid token for a user that does not exist means the ledger and the token issuer disagree
            BalanceApiError::UserNotFound(id) => Self::BackendError(format!("User #{id} is not in the ledger")),
            BalanceApiError::DatabaseError(e) => Self::BackendError(format!("Database error: {e}")),
            BalanceApiError::Cancelled => Self::ShuttingDown,
        }
    }
}
