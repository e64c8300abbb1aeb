use crate::entities::{category, inventory, product};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use super::{validate_non_negative_decimal, validate_not_blank};

/// A product with its category, and its stock level where one exists
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductView {
    #[serde(flatten)]
    pub product: product::Model,
    pub category: Option<category::Model>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inventory: Option<inventory::Model>,
}

/// Opening stock for a newly created product
#[derive(Debug, Clone, Deserialize, Serialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InitialStock {
    #[validate(range(min = 0))]
    pub quantity: i32,
    #[serde(default = "default_low_stock_threshold")]
    #[validate(range(min = 0))]
    pub low_stock_threshold: i32,
}

pub(crate) fn default_low_stock_threshold() -> i32 {
    10
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductRequest {
    #[validate(length(max = 255), custom = "validate_not_blank")]
    pub name: String,
    pub description: Option<String>,
    #[validate(custom = "validate_non_negative_decimal")]
    #[schema(value_type = String, example = "799.99")]
    pub price: Decimal,
    pub category_id: i32,
    #[validate]
    pub initial_stock: Option<InitialStock>,
}

/// Partial update; absent fields keep their current value
#[derive(Debug, Clone, Default, Deserialize, Serialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProductRequest {
    #[validate(length(max = 255), custom = "validate_not_blank")]
    pub name: Option<String>,
    pub description: Option<String>,
    #[validate(custom = "validate_non_negative_decimal")]
    #[schema(value_type = Option<String>, example = "749.00")]
    pub price: Option<Decimal>,
    pub category_id: Option<i32>,
}

impl UpdateProductRequest {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.price.is_none()
            && self.category_id.is_none()
    }
}
