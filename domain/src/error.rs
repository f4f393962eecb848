use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Unknown user role: {0}")]
    UnknownRole(String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Invalid currency code: {0}")]
    InvalidCurrency(String),

    #[error("Invalid checkout options: {0}")]
    InvalidCheckoutOptions(String),
}

pub type DomainResult<T> = Result<T, DomainError>;
