use sea_orm::error::DbErr;
use serde::Serialize;

/// Infrastructure-level failures surfaced by the settlement services.
///
/// Business-rule rejections (invalid coupons, card shortfalls, the
/// one-promotional-coupon rule) are not errors at this level: they are
/// collected as strings on the `SettlementOutcome` so the caller can show the
/// customer everything wrong at once.
#[derive(Debug, thiserror::Error, Serialize)]
pub enum ServiceError {
    #[error("Database error: {0}")]
    DatabaseError(
        #[from]
        #[serde(skip)]
        DbErr,
    ),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    #[error("Internal error: {0}")]
    InternalError(String),

    #[error("Other error: {0}")]
    Other(
        #[from]
        #[serde(skip)]
        anyhow::Error,
    ),
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(err: validator::ValidationErrors) -> Self {
        ServiceError::ValidationError(err.to_string())
    }
}
