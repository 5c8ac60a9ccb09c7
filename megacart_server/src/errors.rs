use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use megacart_engine::{
    AccountApiError,
    CartError,
    CheckoutError,
    OrderFlowError,
    PayoutError,
    SettlementError,
};
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
    #[error("UnspecifiedError. {0}")]
    Unspecified(String),
    #[error("Authentication Error. {0}")]
    AuthenticationError(#[from] AuthError),
    #[error("The data was not found. {0}")]
    NoRecordFound(String),
    #[error("Insufficient Permissions. {0}")]
    InsufficientPermissions(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    PaymentVerificationFailed(String),
    #[error("The payment gateway could not be used. {0}")]
    GatewayUnavailable(String),
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequestBody(_) => StatusCode::BAD_REQUEST,
            Self::AuthenticationError(e) => match e {
                AuthError::MissingPrincipal => StatusCode::UNAUTHORIZED,
                AuthError::ValidationError(_) => StatusCode::UNAUTHORIZED,
                AuthError::PoorlyFormattedPrincipal(_) => StatusCode::BAD_REQUEST,
                AuthError::MissingGuestToken => StatusCode::BAD_REQUEST,
            },
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BackendError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ConfigurationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unspecified(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::NoRecordFound(_) => StatusCode::NOT_FOUND,
            Self::InsufficientPermissions(_) => StatusCode::FORBIDDEN,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::PaymentVerificationFailed(_) => StatusCode::PAYMENT_REQUIRED,
            Self::GatewayUnavailable(_) => StatusCode::BAD_GATEWAY,
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
    #[error("No principal was supplied with the request.")]
    MissingPrincipal,
    #[error("Principal signature is invalid. {0}")]
    ValidationError(String),
    #[error("Principal header is not in the correct format. {0}")]
    PoorlyFormattedPrincipal(String),
    #[error("Guest carts need an x-guest-token header. Fetch one from /guest_token first.")]
    MissingGuestToken,
}

impl From<CheckoutError> for ServerError {
    fn from(e: CheckoutError) -> Self {
        match e {
            CheckoutError::InvalidCheckout(_) => Self::InvalidRequestBody(e.to_string()),
            CheckoutError::ProductNotFound(_) => Self::NoRecordFound(e.to_string()),
            CheckoutError::OrderNotFound(_) => Self::NoRecordFound(e.to_string()),
            CheckoutError::InsufficientStock { .. } => Self::Conflict(e.to_string()),
            CheckoutError::GatewayError(_) => Self::GatewayUnavailable(e.to_string()),
            CheckoutError::PermissionDenied(_) => Self::InsufficientPermissions(e.to_string()),
            CheckoutError::DatabaseError(e) => Self::BackendError(format!("Database error: {e}")),
        }
    }
}

impl From<SettlementError> for ServerError {
    fn from(e: SettlementError) -> Self {
        match e {
            SettlementError::OrderNotFound(_) => Self::NoRecordFound(e.to_string()),
            SettlementError::VerificationFailed(_) => Self::PaymentVerificationFailed(e.to_string()),
            SettlementError::ProcessingError(_) => Self::GatewayUnavailable(e.to_string()),
            SettlementError::PermissionDenied(_) => Self::InsufficientPermissions(e.to_string()),
            SettlementError::DatabaseError(e) => Self::BackendError(format!("Database error: {e}")),
        }
    }
}

impl From<OrderFlowError> for ServerError {
    fn from(e: OrderFlowError) -> Self {
        match e {
            OrderFlowError::OrderNotFound(_) => Self::NoRecordFound(e.to_string()),
            OrderFlowError::InvalidTransition { .. } => Self::Conflict(e.to_string()),
            OrderFlowError::TrackingNumberRequired => Self::InvalidRequestBody(e.to_string()),
            OrderFlowError::PermissionDenied(_) => Self::InsufficientPermissions(e.to_string()),
            OrderFlowError::DatabaseError(e) => Self::BackendError(format!("Database error: {e}")),
        }
    }
}

impl From<PayoutError> for ServerError {
    fn from(e: PayoutError) -> Self {
        match e {
            PayoutError::NoBalance | PayoutError::NoPaymentMethod | PayoutError::InvalidDecision(_) => {
                Self::InvalidRequestBody(e.to_string())
            },
            PayoutError::PayoutAlreadyPending(_) | PayoutError::NotPending(..) => Self::Conflict(e.to_string()),
            PayoutError::PayoutNotFound(_) | PayoutError::VendorNotFound(_) => Self::NoRecordFound(e.to_string()),
            PayoutError::PermissionDenied(_) => Self::InsufficientPermissions(e.to_string()),
            PayoutError::DatabaseError(e) => Self::BackendError(format!("Database error: {e}")),
        }
    }
}

impl From<AccountApiError> for ServerError {
    fn from(e: AccountApiError) -> Self {
        match e {
            AccountApiError::OrderNotFound(_) => Self::NoRecordFound(e.to_string()),
            AccountApiError::PermissionDenied(_) => Self::InsufficientPermissions(e.to_string()),
            AccountApiError::DatabaseError(e) => Self::BackendError(format!("Database error: {e}")),
        }
    }
}

impl From<CartError> for ServerError {
    fn from(e: CartError) -> Self {
        match e {
            CartError::ProductNotFound(_) => Self::NoRecordFound(e.to_string()),
            CartError::InvalidQuantity(_) => Self::InvalidRequestBody(e.to_string()),
            CartError::PermissionDenied(_) => Self::InsufficientPermissions(e.to_string()),
            CartError::DatabaseError(e) => Self::BackendError(format!("Database error: {e}")),
        }
    }
}

#[cfg(test)]
mod test {
    use megacart_engine::db_types::{OrderStatusType, PayoutStatus};

    use super::*;

    fn status<E: Into<ServerError>>(e: E) -> StatusCode {
        e.into().status_code()
    }

    #[test]
    fn checkout_errors() {
        assert_eq!(status(CheckoutError::InvalidCheckout("no items".into())), StatusCode::BAD_REQUEST);
        assert_eq!(
            status(CheckoutError::InsufficientStock { product_id: 1, requested: 2, available: 1 }),
            StatusCode::CONFLICT
        );
        assert_eq!(status(CheckoutError::GatewayError("timeout".into())), StatusCode::BAD_GATEWAY);
        assert_eq!(status(CheckoutError::DatabaseError("locked".into())), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn settlement_errors() {
        assert_eq!(status(SettlementError::VerificationFailed("bad sig".into())), StatusCode::PAYMENT_REQUIRED);
        assert_eq!(status(SettlementError::ProcessingError("down".into())), StatusCode::BAD_GATEWAY);
        assert_eq!(status(SettlementError::OrderNotFound("order_x".into())), StatusCode::NOT_FOUND);
    }

    #[test]
    fn flow_and_payout_errors() {
        let e = OrderFlowError::InvalidTransition { from: OrderStatusType::Pending, to: OrderStatusType::Shipped };
        assert_eq!(status(e), StatusCode::CONFLICT);
        assert_eq!(status(OrderFlowError::TrackingNumberRequired), StatusCode::BAD_REQUEST);
        assert_eq!(status(PayoutError::PayoutAlreadyPending(3)), StatusCode::CONFLICT);
        assert_eq!(status(PayoutError::NotPending(3, PayoutStatus::Completed)), StatusCode::CONFLICT);
        assert_eq!(status(PayoutError::NoBalance), StatusCode::BAD_REQUEST);
        assert_eq!(status(PayoutError::PermissionDenied("no".into())), StatusCode::FORBIDDEN);
    }

    #[test]
    fn error_body_is_json() {
        let err = ServerError::from(CartError::ProductNotFound(9));
        let resp = err.error_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert_eq!(err.to_string(), "The data was not found. Product 9 does not exist");
    }
}
