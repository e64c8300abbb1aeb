use crate::entities::{inventory, inventory_history};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use super::ProductView;

/// An inventory row joined with its product and, on single-row reads, its history
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InventoryView {
    #[serde(flatten)]
    pub inventory: inventory::Model,
    pub product: Option<ProductView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub history: Option<Vec<inventory_history::Model>>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateInventoryRequest {
    /// New absolute stock level
    pub quantity: i32,
    #[validate(range(min = 0))]
    pub low_stock_threshold: Option<i32>,
}

/// Result of replaying an inventory row's history from zero
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HistoryAudit {
    pub inventory_id: i32,
    pub current_quantity: i32,
    /// Quantity reached by applying every transition in order
    pub replayed_quantity: i32,
    pub records: usize,
    /// History ids whose previous quantity does not match the preceding record
    pub breaks: Vec<i32>,
    pub consistent: bool,
}

impl HistoryAudit {
    /// Replays `history`, which must already be in chronological order
    pub fn replay(inventory: &inventory::Model, history: &[inventory_history::Model]) -> Self {
        let mut expected_previous = 0;
        let mut breaks = Vec::new();

        for record in history {
            if record.previous_quantity != expected_previous {
                breaks.push(record.id);
            }
            expected_previous = record.new_quantity;
        }

        Self {
            inventory_id: inventory.id,
            current_quantity: inventory.quantity,
            replayed_quantity: expected_previous,
            records: history.len(),
            consistent: breaks.is_empty() && expected_previous == inventory.quantity,
            breaks,
        }
    }
}
