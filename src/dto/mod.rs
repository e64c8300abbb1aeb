//! Request bodies and joined read models.

pub mod catalog;
pub mod inventory;
pub mod sales;

pub use catalog::{CreateProductRequest, InitialStock, ProductView, UpdateProductRequest};
pub use inventory::{HistoryAudit, InventoryView, UpdateInventoryRequest};
pub use sales::{CreateSaleRequest, PlatformSales, SaleView, SalesStatistics};

use rust_decimal::Decimal;
use validator::ValidationError;

/// Rejects strings that are empty once trimmed
pub(crate) fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("blank");
        err.message = Some("must not be blank".into());
        return Err(err);
    }
    Ok(())
}

pub(crate) fn validate_non_negative_decimal(value: &Decimal) -> Result<(), ValidationError> {
    if value.is_sign_negative() && !value.is_zero() {
        let mut err = ValidationError::new("negative");
        err.message = Some("must not be negative".into());
        return Err(err);
    }
    Ok(())
}

/// Trims a string, turning an all-whitespace value into `None`
pub(crate) fn normalize_optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
