//! In-memory stock backend implementing both collaborator ports.
//!
//! Intended for tests, demos and offline dry runs. Behaves like the real
//! backend: committing a count equal to recorded stock yields
//! [`CommitOutcome::AlreadyCorrect`] and writes nothing.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;

use stocktake_core::{MaterialId, Quantity, WorkshopId};
use stocktake_inventory::{StockCatalog, StockUpdate};

use crate::ports::{CommitOutcome, CorrectionRequest, CorrectionService, PortError, StockCatalogProvider};

#[derive(Debug, Default)]
struct BackendState {
    catalog: Option<StockCatalog>,
    scripted_failures: HashMap<MaterialId, VecDeque<String>>,
    corrections: Vec<CorrectionRequest>,
}

/// Single-workshop in-memory backend.
#[derive(Debug, Default)]
pub struct InMemoryStockBackend {
    state: Mutex<BackendState>,
}

impl InMemoryStockBackend {
    pub fn new(catalog: StockCatalog) -> Self {
        Self {
            state: Mutex::new(BackendState {
                catalog: Some(catalog),
                ..BackendState::default()
            }),
        }
    }

    /// Make the next commit for `material_id` fail with `reason`. Queues up.
    pub fn fail_next(&self, material_id: MaterialId, reason: impl Into<String>) {
        self.lock()
            .scripted_failures
            .entry(material_id)
            .or_default()
            .push_back(reason.into());
    }

    pub fn recorded_stock(&self, material_id: MaterialId) -> Option<Quantity> {
        self.lock()
            .catalog
            .as_ref()
            .and_then(|c| c.find(material_id))
            .map(|m| m.recorded_stock)
    }

    /// Corrections actually written (already-correct and failed calls excluded).
    pub fn corrections(&self) -> Vec<CorrectionRequest> {
        self.lock().corrections.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BackendState> {
        self.state.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

#[async_trait]
impl StockCatalogProvider for InMemoryStockBackend {
    async fn fetch_catalog(&self, workshop_id: WorkshopId) -> Result<StockCatalog, PortError> {
        let state = self.lock();
        match &state.catalog {
            Some(catalog) if catalog.workshop_id() == workshop_id => Ok(catalog.clone()),
            _ => Err(PortError::Rejected {
                status: 404,
                message: format!("workshop {workshop_id} not found"),
            }),
        }
    }
}

#[async_trait]
impl CorrectionService for InMemoryStockBackend {
    async fn commit(&self, request: &CorrectionRequest) -> CommitOutcome {
        let mut state = self.lock();

        if let Some(reason) = state
            .scripted_failures
            .get_mut(&request.material_id)
            .and_then(VecDeque::pop_front)
        {
            return CommitOutcome::Failed(reason);
        }

        let Some(catalog) = state.catalog.as_mut() else {
            return CommitOutcome::Failed("no catalog loaded".to_string());
        };
        let Some(recorded) = catalog.find(request.material_id).map(|m| m.recorded_stock) else {
            return CommitOutcome::Failed(format!("material {} not found", request.material_id));
        };

        if recorded == request.counted {
            return CommitOutcome::AlreadyCorrect {
                updated_stock: recorded,
            };
        }

        let update = StockUpdate {
            material_id: request.material_id,
            recorded_stock: request.counted,
        };
        if let Err(e) = catalog.apply_stock_update(&update) {
            return CommitOutcome::Failed(e.to_string());
        }
        state.corrections.push(request.clone());

        CommitOutcome::Committed {
            updated_stock: request.counted,
        }
    }
}
