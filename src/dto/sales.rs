use crate::entities::sale;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use super::{validate_non_negative_decimal, validate_not_blank, ProductView};

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SaleView {
    #[serde(flatten)]
    pub sale: sale::Model,
    pub product: Option<ProductView>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateSaleRequest {
    pub product_id: i32,
    #[validate(range(min = 1))]
    pub quantity: i32,
    #[validate(custom = "validate_non_negative_decimal")]
    #[schema(value_type = String, example = "1599.98")]
    pub total_price: Decimal,
    #[validate(length(max = 100), custom = "validate_not_blank")]
    pub platform: String,
    /// Defaults to the time of recording
    pub sale_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlatformSales {
    pub platform: String,
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64, example = 1250.5)]
    pub total_revenue: Decimal,
    pub total_units: i64,
}

/// Aggregate sales figures; all zero when nothing has been sold
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SalesStatistics {
    /// Rounded to cents; reported as a JSON number
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64, example = 4321.75)]
    pub total_revenue: Decimal,
    pub total_units: i64,
    pub by_platform: Vec<PlatformSales>,
}

impl Default for SalesStatistics {
    fn default() -> Self {
        Self {
            total_revenue: Decimal::ZERO,
            total_units: 0,
            by_platform: Vec::new(),
        }
    }
}
