//! Inventory navigator: the step / save / finish protocol.
//!
//! Save-and-advance:
//! 1. validate the value the operator entered (absent or negative: refuse, stay)
//! 2. write it into the session
//! 3. commit it through the [`CorrectionService`] (bounded by `commit_timeout`)
//! 4. committed or already-correct: mark saved, then advance, or finish at the
//!    end of the list; any failure: surface it and stay on the same material
//!
//! At most one save is in flight per navigator. Every request is tagged with the
//! session generation it was issued against; a response that arrives after the
//! session was reset or re-initialized is dropped.

use std::sync::atomic::{AtomicBool, Ordering};

use chrono::Utc;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use stocktake_core::{MaterialId, Quantity, RequestId, WorkshopId};
use stocktake_inventory::{
    CompletionSummary, InventoryProgress, InventorySession, MaterialStockEntry, SessionError, StockCatalog,
    StockUpdate, correction_note,
};

use crate::config::NavigatorConfig;
use crate::error::{NavigatorError, PersistenceFailure};
use crate::events::NavigatorEvent;
use crate::ports::{CommitOutcome, CorrectionRequest, CorrectionService, PortError, StockCatalogProvider};
use crate::session_handle::SessionHandle;

/// A material whose count is now reflected in recorded stock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedMaterial {
    /// Recorded stock after the commit, for the caller's own catalog copy.
    pub stock_update: StockUpdate,
    /// The backend reported that no correction was necessary.
    pub already_correct: bool,
}

/// Result of a successful save-and-advance call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    /// Saved and moved on to the material at `cursor`.
    Advanced { saved: SavedMaterial, cursor: usize },
    /// Saved the last material; the session was finished and reset.
    Finished {
        saved: SavedMaterial,
        summary: CompletionSummary,
    },
    /// Saved, but navigation changed underneath the call so the cursor was left alone.
    Stayed { saved: SavedMaterial, cursor: usize },
    /// The session was reset or re-initialized while the call was pending; the
    /// response was ignored.
    Discarded,
}

/// Request state captured before the await point.
pub(crate) struct Ticket {
    pub(crate) generation: u64,
    pub(crate) cursor: usize,
    pub(crate) request: CorrectionRequest,
}

pub(crate) struct FlightGuard<'a>(&'a AtomicBool);

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

enum Direction {
    Next,
    Previous,
}

/// Drives one [`InventorySession`] through a stock-take.
pub struct InventoryNavigator<P, S> {
    session: SessionHandle,
    catalog: P,
    corrections: S,
    config: NavigatorConfig,
    in_flight: AtomicBool,
    events: broadcast::Sender<NavigatorEvent>,
}

impl<P, S> InventoryNavigator<P, S>
where
    P: StockCatalogProvider,
    S: CorrectionService,
{
    pub fn new(session: SessionHandle, catalog: P, corrections: S, config: NavigatorConfig) -> Self {
        let (events, _) = broadcast::channel(config.event_capacity.max(1));
        Self {
            session,
            catalog,
            corrections,
            config,
            in_flight: AtomicBool::new(false),
            events,
        }
    }

    pub fn session(&self) -> &SessionHandle {
        &self.session
    }

    pub fn config(&self) -> &NavigatorConfig {
        &self.config
    }

    pub fn subscribe(&self) -> broadcast::Receiver<NavigatorEvent> {
        self.events.subscribe()
    }

    /// Whether a save is pending; the triggering action must stay disabled meanwhile.
    pub fn is_saving(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    pub fn progress(&self) -> InventoryProgress {
        self.session.read(InventorySession::progress)
    }

    /// Fetch the current catalog without touching the session (e.g. after finish).
    pub async fn refresh_catalog(&self, workshop_id: WorkshopId) -> Result<StockCatalog, NavigatorError> {
        let timeout = self.config.catalog_timeout;
        match tokio::time::timeout(timeout, self.catalog.fetch_catalog(workshop_id)).await {
            Ok(result) => Ok(result?),
            Err(_) => Err(PortError::Timeout(timeout).into()),
        }
    }

    /// Fetch the catalog and initialize the session with it.
    ///
    /// An empty catalog is rejected before the session is touched.
    pub async fn load(&self, workshop_id: WorkshopId) -> Result<StockCatalog, NavigatorError> {
        let catalog = self.refresh_catalog(workshop_id).await?;
        if catalog.is_empty() {
            warn!("workshop {} has no materials to count", workshop_id);
            return Err(SessionError::EmptyCatalog.into());
        }

        let mut session = self.session.lock();
        session.initialize(catalog.flatten())?;
        info!(
            "stock-take loaded for workshop {}: {} materials (generation {})",
            workshop_id,
            catalog.len(),
            session.generation()
        );
        Ok(catalog)
    }

    pub fn start(&self) -> Result<(), NavigatorError> {
        let mut session = self.session.lock();
        session.start()?;
        info!("stock-take navigation started at {}", session.position_label());
        Ok(())
    }

    /// Commit the entered value for the current material and move on.
    pub async fn save_and_advance(&self, displayed: Option<Quantity>) -> Result<SaveOutcome, NavigatorError> {
        let counted = validate_count(displayed)?;
        let _flight = self.begin_flight()?;

        let ticket = {
            let mut session = self.session.lock();
            if !session.is_navigating() {
                return Err(SessionError::NotNavigating.into());
            }
            let current = session
                .current_material()
                .cloned()
                .ok_or(SessionError::EmptyCatalog)?;
            session.set_count(current.id, counted)?;
            self.ticket(&session, &current, counted)
        };

        let result = self.commit(&ticket.request).await;

        let mut session = self.session.lock();
        if session.generation() != ticket.generation {
            debug!(
                "discarding response for material {} (request {}): session was reset",
                ticket.request.material_id, ticket.request.request_id
            );
            return Ok(SaveOutcome::Discarded);
        }

        let saved = self.reconcile(&mut session, &ticket.request, result)?;

        if !session.is_navigating() || session.cursor() != ticket.cursor {
            return Ok(SaveOutcome::Stayed {
                saved,
                cursor: session.cursor(),
            });
        }

        if session.go_to_next() {
            return Ok(SaveOutcome::Advanced {
                saved,
                cursor: session.cursor(),
            });
        }

        let summary = self.finish_locked(&mut session);
        Ok(SaveOutcome::Finished { saved, summary })
    }

    /// Commit the entered value of any material in the session without moving
    /// the cursor. Returns `None` when the response arrived for a session that
    /// has since been reset.
    ///
    /// Entering a value other than the recorded stock takes the material out of
    /// the saved set right away, so a failed commit leaves it pending.
    pub async fn save(
        &self,
        material_id: MaterialId,
        displayed: Option<Quantity>,
    ) -> Result<Option<SavedMaterial>, NavigatorError> {
        let counted = validate_count(displayed)?;
        let _flight = self.begin_flight()?;

        let ticket = {
            let mut session = self.session.lock();
            if !session.is_active() {
                return Err(SessionError::NotLoaded.into());
            }
            let material = session
                .material(material_id)
                .cloned()
                .ok_or(SessionError::UnknownMaterial(material_id))?;
            session.set_count(material_id, counted)?;
            self.ticket(&session, &material, counted)
        };

        let result = self.commit(&ticket.request).await;

        let mut session = self.session.lock();
        if session.generation() != ticket.generation {
            debug!("discarding stale response for material {}", material_id);
            return Ok(None);
        }
        self.reconcile(&mut session, &ticket.request, result).map(Some)
    }

    /// Manual step forward. A displayed value is kept in the session but not persisted.
    pub fn go_to_next(&self, displayed: Option<Quantity>) -> Result<bool, NavigatorError> {
        self.navigate(displayed, Direction::Next)
    }

    /// Manual step back. A displayed value is kept in the session but not persisted.
    pub fn go_to_previous(&self, displayed: Option<Quantity>) -> Result<bool, NavigatorError> {
        self.navigate(displayed, Direction::Previous)
    }

    fn navigate(&self, displayed: Option<Quantity>, direction: Direction) -> Result<bool, NavigatorError> {
        if self.is_saving() {
            return Err(NavigatorError::SaveInFlight);
        }

        let mut session = self.session.lock();
        if !session.is_navigating() {
            return Err(SessionError::NotNavigating.into());
        }
        if displayed.is_some() {
            let value = validate_count(displayed)?;
            let current = session
                .current_material()
                .map(|m| m.id)
                .ok_or(SessionError::EmptyCatalog)?;
            session.set_count(current, value)?;
        }

        Ok(match direction {
            Direction::Next => session.go_to_next(),
            Direction::Previous => session.go_to_previous(),
        })
    }

    /// End the pass: snapshot progress, reset the session, publish the summary.
    ///
    /// Refused while a save is pending, so the summary never misses a commit
    /// the backend may already have applied.
    pub fn finish(&self) -> Result<CompletionSummary, NavigatorError> {
        if self.is_saving() {
            return Err(NavigatorError::SaveInFlight);
        }
        let mut session = self.session.lock();
        if !session.is_active() {
            return Err(SessionError::NotLoaded.into());
        }
        Ok(self.finish_locked(&mut session))
    }

    /// Discard the session (cancellation). Pending responses will be ignored.
    pub fn reset(&self) {
        let mut session = self.session.lock();
        session.reset();
        info!("stock-take reset (generation {})", session.generation());
    }

    fn finish_locked(&self, session: &mut InventorySession) -> CompletionSummary {
        session.finish_navigation();
        let summary = CompletionSummary::from_progress(&session.progress(), Utc::now());
        session.reset();

        info!(
            "stock-take finished: {} processed, {} saved, {} total",
            summary.processed_count, summary.saved_count, summary.total_count
        );
        self.publish(NavigatorEvent::Finished(summary.clone()));
        summary
    }

    pub(crate) fn begin_flight(&self) -> Result<FlightGuard<'_>, NavigatorError> {
        self.in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| NavigatorError::SaveInFlight)?;
        Ok(FlightGuard(&self.in_flight))
    }

    pub(crate) fn ticket(
        &self,
        session: &InventorySession,
        material: &MaterialStockEntry,
        counted: Quantity,
    ) -> Ticket {
        Ticket {
            generation: session.generation(),
            cursor: session.cursor(),
            request: CorrectionRequest {
                request_id: RequestId::new(),
                material_id: material.id,
                counted,
                note: correction_note(
                    &self.config.note_prefix,
                    counted,
                    session.recorded_stock(material.id).unwrap_or(material.recorded_stock),
                ),
            },
        }
    }

    /// The only await point of the protocol.
    pub(crate) async fn commit(&self, request: &CorrectionRequest) -> Result<SavedMaterial, PersistenceFailure> {
        debug!(
            "committing material {} = {} (request {})",
            request.material_id, request.counted, request.request_id
        );

        let timeout = self.config.commit_timeout;
        let outcome = tokio::time::timeout(timeout, self.corrections.commit(request))
            .await
            .map_err(|_| PersistenceFailure::TimedOut(timeout))?;

        let (updated_stock, already_correct) = match outcome {
            CommitOutcome::Committed { updated_stock } => (updated_stock, false),
            CommitOutcome::AlreadyCorrect { updated_stock } => (updated_stock, true),
            CommitOutcome::Failed(reason) => return Err(PersistenceFailure::Rejected(reason)),
        };

        Ok(SavedMaterial {
            stock_update: StockUpdate {
                material_id: request.material_id,
                recorded_stock: updated_stock,
            },
            already_correct,
        })
    }

    /// Apply a commit result to the session. Must run under the session lock
    /// and only after the generation check.
    ///
    /// On success the returned stock becomes the session's recorded stock; the
    /// material is marked saved while its count still equals that stock.
    pub(crate) fn reconcile(
        &self,
        session: &mut InventorySession,
        request: &CorrectionRequest,
        result: Result<SavedMaterial, PersistenceFailure>,
    ) -> Result<SavedMaterial, NavigatorError> {
        match result {
            Ok(saved) => {
                session.record_stock(&saved.stock_update)?;
                if session.count_for(request.material_id) == Some(saved.stock_update.recorded_stock) {
                    session.mark_saved(request.material_id)?;
                }
                if saved.already_correct {
                    info!("material {} already matches recorded stock", request.material_id);
                } else {
                    info!(
                        "material {} corrected to {} (request {})",
                        request.material_id, saved.stock_update.recorded_stock, request.request_id
                    );
                }
                self.publish(NavigatorEvent::MaterialSaved {
                    stock_update: saved.stock_update,
                    already_correct: saved.already_correct,
                });
                Ok(saved)
            }
            Err(failure) => {
                warn!(
                    "saving material {} failed (request {}): {}",
                    request.material_id, request.request_id, failure
                );
                self.publish(NavigatorEvent::SaveFailed {
                    material_id: request.material_id,
                    reason: failure.to_string(),
                });
                Err(NavigatorError::Persistence {
                    material_id: request.material_id,
                    failure,
                })
            }
        }
    }

    pub(crate) fn publish(&self, event: NavigatorEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }
}

fn validate_count(displayed: Option<Quantity>) -> Result<Quantity, NavigatorError> {
    match displayed {
        None => Err(NavigatorError::validation("no counted value entered")),
        Some(value) if value.is_negative() => Err(NavigatorError::validation(format!(
            "counted value {value} is negative"
        ))),
        Some(value) => Ok(value),
    }
}
