//! Bulk save: commit every pending correction of the session in one go.

use serde::Serialize;
use tracing::{info, warn};

use stocktake_core::MaterialId;
use stocktake_inventory::{SessionError, StockUpdate};

use crate::error::NavigatorError;
use crate::navigator::InventoryNavigator;
use crate::ports::{CorrectionService, StockCatalogProvider};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BulkSaveFailure {
    pub material_id: MaterialId,
    pub reason: String,
}

/// Outcome of [`InventoryNavigator::save_all`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BulkSaveReport {
    pub saved_count: usize,
    pub error_count: usize,
    pub total_count: usize,
    pub stock_updates: Vec<StockUpdate>,
    pub failures: Vec<BulkSaveFailure>,
    /// The session was reset part-way; remaining corrections were not sent.
    pub interrupted: bool,
}

impl BulkSaveReport {
    pub fn is_complete_success(&self) -> bool {
        !self.interrupted && self.error_count == 0
    }
}

impl<P, S> InventoryNavigator<P, S>
where
    P: StockCatalogProvider,
    S: CorrectionService,
{
    /// Commit every unsaved counted value that differs from recorded stock.
    ///
    /// Corrections go out one at a time under the single-flight guard. A failed
    /// material stays unsaved and the batch continues with the next one.
    pub async fn save_all(&self) -> Result<BulkSaveReport, NavigatorError> {
        let _flight = self.begin_flight()?;

        let (generation, pending) = {
            let session = self.session().lock();
            if !session.is_active() {
                return Err(SessionError::NotLoaded.into());
            }
            (session.generation(), session.pending_corrections())
        };

        let mut report = BulkSaveReport {
            total_count: pending.len(),
            ..BulkSaveReport::default()
        };

        for preview in pending {
            let ticket = {
                let session = self.session().lock();
                if session.generation() != generation {
                    report.interrupted = true;
                    break;
                }
                let Some(material) = session.material(preview.material_id).cloned() else {
                    continue;
                };
                self.ticket(&session, &material, preview.counted)
            };

            let result = self.commit(&ticket.request).await;

            let mut session = self.session().lock();
            if session.generation() != generation {
                report.interrupted = true;
                break;
            }
            match self.reconcile(&mut session, &ticket.request, result) {
                Ok(saved) => {
                    report.saved_count += 1;
                    report.stock_updates.push(saved.stock_update);
                }
                Err(err) => {
                    report.error_count += 1;
                    report.failures.push(BulkSaveFailure {
                        material_id: preview.material_id,
                        reason: err.to_string(),
                    });
                }
            }
        }

        if report.interrupted {
            warn!(
                "bulk save interrupted by reset after {} of {} corrections",
                report.saved_count + report.error_count,
                report.total_count
            );
        } else {
            info!(
                "bulk save done: {} saved, {} failed, {} total",
                report.saved_count, report.error_count, report.total_count
            );
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use stocktake_core::{Quantity, WorkshopId};
    use stocktake_inventory::{CategoryGroup, MaterialStockEntry, StockCatalog};

    use crate::config::NavigatorConfig;
    use crate::in_memory::InMemoryStockBackend;
    use crate::session_handle::SessionHandle;

    fn backend(stocks: &[i64]) -> Arc<InMemoryStockBackend> {
        let materials = stocks
            .iter()
            .enumerate()
            .map(|(idx, &stock)| {
                MaterialStockEntry::new(
                    MaterialId::new(idx as u64 + 1),
                    format!("material-{}", idx + 1),
                    Quantity::from_units(stock),
                )
            })
            .collect();
        let catalog = StockCatalog::new(
            WorkshopId::new(1),
            vec![CategoryGroup {
                category_id: None,
                category_name: "All".to_string(),
                materials,
            }],
        )
        .unwrap();
        Arc::new(InMemoryStockBackend::new(catalog))
    }

    async fn loaded(
        backend: &Arc<InMemoryStockBackend>,
    ) -> InventoryNavigator<Arc<InMemoryStockBackend>, Arc<InMemoryStockBackend>> {
        let navigator = InventoryNavigator::new(
            SessionHandle::new(),
            backend.clone(),
            backend.clone(),
            NavigatorConfig::default(),
        );
        navigator.load(WorkshopId::new(1)).await.unwrap();
        navigator
    }

    fn set(navigator: &InventoryNavigator<Arc<InMemoryStockBackend>, Arc<InMemoryStockBackend>>, id: u64, v: i64) {
        navigator
            .session()
            .lock()
            .set_count(MaterialId::new(id), Quantity::from_units(v))
            .unwrap();
    }

    #[tokio::test]
    async fn saves_only_differing_counts() {
        let backend = backend(&[10, 5, 3]);
        let navigator = loaded(&backend).await;
        set(&navigator, 1, 9);
        set(&navigator, 3, 4);

        let report = navigator.save_all().await.unwrap();

        assert_eq!((report.saved_count, report.error_count, report.total_count), (2, 0, 2));
        assert!(report.is_complete_success());
        assert_eq!(backend.recorded_stock(MaterialId::new(3)), Some(Quantity::from_units(4)));
        assert_eq!(navigator.session().read(|s| s.unsaved_count()), 0);
    }

    #[tokio::test]
    async fn failures_are_reported_and_stay_unsaved() {
        let backend = backend(&[10, 5]);
        let navigator = loaded(&backend).await;
        set(&navigator, 1, 1);
        set(&navigator, 2, 2);
        backend.fail_next(MaterialId::new(1), "locked");

        let report = navigator.save_all().await.unwrap();

        assert_eq!((report.saved_count, report.error_count), (1, 1));
        assert_eq!(report.failures[0].material_id, MaterialId::new(1));
        assert!(report.failures[0].reason.contains("locked"));
        navigator.session().read(|s| {
            assert!(!s.is_saved(MaterialId::new(1)));
            assert!(s.is_saved(MaterialId::new(2)));
            assert_eq!(s.unsaved_count(), 1);
        });
    }

    #[tokio::test]
    async fn nothing_pending_is_an_empty_report() {
        let backend = backend(&[10]);
        let navigator = loaded(&backend).await;

        let report = navigator.save_all().await.unwrap();
        assert_eq!(report, BulkSaveReport::default());
        assert!(backend.corrections().is_empty());
    }

    #[tokio::test]
    async fn requires_a_loaded_session() {
        let backend = backend(&[10]);
        let navigator = loaded(&backend).await;
        navigator.reset();

        assert_eq!(
            navigator.save_all().await,
            Err(NavigatorError::Session(SessionError::NotLoaded))
        );
    }
}
