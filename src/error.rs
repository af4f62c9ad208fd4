use thiserror::Error;

#[derive(Error, Debug)]
pub enum PaymentError {
    #[error("Invalid amount: {0} (minimum donation is 1)")]
    InvalidAmount(rust_decimal::Decimal),
    #[error("Amount too large: {0}")]
    AmountOverflow(rust_decimal::Decimal),
    #[error("Fee quote failed: {0}")]
    FeeQuote(String),
    #[error("Checkout script failed to load")]
    ScriptLoad,
    #[error("Order creation failed: {0}")]
    OrderCreation(String),
    #[error("Payment verification failed for order {order_id}")]
    PaymentVerification { order_id: String },
    #[error("Action `{action}` is not allowed in state {state}")]
    InvalidTransition {
        action: &'static str,
        state: &'static str,
    },
    #[error("Action disabled: {0}")]
    ActionDisabled(&'static str),
    #[error("Donation already recorded for session {0}")]
    DuplicateDonation(uuid::Uuid),
    #[error("Unknown payment method: {0}")]
    UnknownMethod(String),
    #[error("Invalid card details: {0}")]
    InvalidCardDetails(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("IO error: {0}")]
    Storage(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, PaymentError>;
