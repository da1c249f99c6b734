//! Boundary contracts consumed by the navigator.
//!
//! Implementations live outside the core (HTTP adapters, the in-memory backend
//! used by tests). Transport-level details such as status codes or error
//! payload parsing stay in the adapter; the navigator only ever sees a
//! [`CommitOutcome`].

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use stocktake_core::{MaterialId, Quantity, RequestId, WorkshopId};
use stocktake_inventory::StockCatalog;

/// One correction to persist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorrectionRequest {
    /// Correlates adapter logs with the navigator call that issued the request.
    pub request_id: RequestId,
    pub material_id: MaterialId,
    pub counted: Quantity,
    pub note: String,
}

/// Discriminated result of a commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitOutcome {
    /// A correction was recorded; recorded stock is now `updated_stock`.
    Committed { updated_stock: Quantity },
    /// The counted value already matched recorded stock; nothing was written.
    AlreadyCorrect { updated_stock: Quantity },
    /// The backend refused or could not be reached.
    Failed(String),
}

impl CommitOutcome {
    /// Recorded stock after the call, for both success variants.
    pub fn updated_stock(&self) -> Option<Quantity> {
        match self {
            CommitOutcome::Committed { updated_stock } | CommitOutcome::AlreadyCorrect { updated_stock } => {
                Some(*updated_stock)
            }
            CommitOutcome::Failed(_) => None,
        }
    }
}

/// Catalog provider failure.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PortError {
    #[error("backend unavailable: {0}")]
    Unavailable(String),

    #[error("request rejected ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("no response within {0:?}")]
    Timeout(std::time::Duration),

    #[error("malformed response: {0}")]
    Decode(String),
}

/// Supplies a workshop's materials with their current recorded stock.
#[async_trait]
pub trait StockCatalogProvider: Send + Sync {
    /// Category-grouped, stably ordered catalog of one workshop.
    async fn fetch_catalog(&self, workshop_id: WorkshopId) -> Result<StockCatalog, PortError>;
}

/// Durably adjusts recorded stock to a counted quantity.
#[async_trait]
pub trait CorrectionService: Send + Sync {
    async fn commit(&self, request: &CorrectionRequest) -> CommitOutcome;
}

#[async_trait]
impl<P> StockCatalogProvider for Arc<P>
where
    P: StockCatalogProvider + ?Sized,
{
    async fn fetch_catalog(&self, workshop_id: WorkshopId) -> Result<StockCatalog, PortError> {
        (**self).fetch_catalog(workshop_id).await
    }
}

#[async_trait]
impl<S> CorrectionService for Arc<S>
where
    S: CorrectionService + ?Sized,
{
    async fn commit(&self, request: &CorrectionRequest) -> CommitOutcome {
        (**self).commit(request).await
    }
}
