//! Events published by the navigator.
//!
//! The summary consumer subscribes via
//! [`InventoryNavigator::subscribe`](crate::InventoryNavigator::subscribe); on
//! [`NavigatorEvent::Finished`] it presents the summary and re-queries the
//! catalog.

use serde::Serialize;

use stocktake_core::MaterialId;
use stocktake_inventory::{CompletionSummary, StockUpdate};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NavigatorEvent {
    MaterialSaved {
        stock_update: StockUpdate,
        already_correct: bool,
    },
    SaveFailed {
        material_id: MaterialId,
        reason: String,
    },
    Finished(CompletionSummary),
}
