//! Stock-take workflow orchestration.
//!
//! Drives an [`InventorySession`](stocktake_inventory::InventorySession)
//! through the step / save / finish protocol on top of two collaborators: a
//! [`StockCatalogProvider`] and a [`CorrectionService`].

pub mod bulk;
pub mod config;
pub mod error;
pub mod events;
pub mod in_memory;
pub mod navigator;
pub mod ports;
pub mod session_handle;

pub use bulk::{BulkSaveFailure, BulkSaveReport};
pub use config::NavigatorConfig;
pub use error::{NavigatorError, PersistenceFailure};
pub use events::NavigatorEvent;
pub use in_memory::InMemoryStockBackend;
pub use navigator::{InventoryNavigator, SaveOutcome, SavedMaterial};
pub use ports::{CommitOutcome, CorrectionRequest, CorrectionService, PortError, StockCatalogProvider};
pub use session_handle::SessionHandle;
