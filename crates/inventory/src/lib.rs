//! Stock-take domain module.
//!
//! Pure, deterministic state for one inventory count pass (no IO, no HTTP, no
//! async runtime). The effectful orchestration lives in `stocktake-workflow`.

pub mod catalog;
pub mod correction;
pub mod session;
pub mod summary;

pub use catalog::{CategoryGroup, MaterialStockEntry, StockCatalog, StockUpdate};
pub use correction::{CorrectionPreview, correction_note};
pub use session::{InventoryProgress, InventorySession, SessionError, SessionState};
pub use summary::CompletionSummary;
