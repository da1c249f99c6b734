//! Inventory session: all mutable state of one stock-take pass.
//!
//! Every transition is a total function over the current state. Out-of-range
//! navigation reports "no movement" instead of failing, and precondition
//! failures are returned to the caller as [`SessionError`].
//!
//! State machine:
//!
//! ```text
//! Empty --initialize--> Loaded --start--> Navigating --finish_navigation--> Loaded
//!                                          |  ^
//!                                          +--+ go_to_next / go_to_previous
//! any state --reset--> Empty
//! ```

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use stocktake_core::{MaterialId, Quantity};

use crate::catalog::{MaterialStockEntry, StockUpdate};
use crate::correction::CorrectionPreview;

/// Coarse lifecycle state of a session.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    /// Nothing loaded.
    Empty,
    /// Catalog loaded, step-by-step navigation not running.
    Loaded,
    /// Step-by-step navigation is being driven.
    Navigating,
}

/// Read-only snapshot used for the progress indicator and the completion summary.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryProgress {
    pub visited_count: usize,
    pub saved_count: usize,
    pub total_count: usize,
    pub cursor: usize,
    /// `round(visited / total * 100)`, 0 for an empty session.
    pub percentage: u8,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("no catalog loaded")]
    NotLoaded,
    #[error("no materials to count")]
    EmptyCatalog,
    #[error("navigation has not been started")]
    NotNavigating,
    #[error("material {0} is not part of this stock-take")]
    UnknownMaterial(MaterialId),
    #[error("material {0} appears more than once")]
    DuplicateMaterial(MaterialId),
}

/// State of one stock-take pass, owned by a single controller.
///
/// `visited` only grows during a pass. `saved` holds the materials whose
/// counted value equals the stock the backend has recorded for them; it
/// shrinks as soon as such a count is changed to anything else. The two sets
/// are tracked independently.
#[derive(Debug, Clone, Default)]
pub struct InventorySession {
    materials: Vec<MaterialStockEntry>,
    positions: HashMap<MaterialId, usize>,
    cursor: usize,
    counted: HashMap<MaterialId, Quantity>,
    /// Backend stock per material: catalog value, then the result of each commit.
    recorded: HashMap<MaterialId, Quantity>,
    visited: HashSet<MaterialId>,
    saved: HashSet<MaterialId>,
    active: bool,
    navigating: bool,
    generation: u64,
}

impl InventorySession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a catalog, replacing any previous pass entirely.
    ///
    /// Counts start at each material's recorded stock. Callers reject empty
    /// catalogs before calling; an empty load is representable but cannot be
    /// started. A list with a repeated material id is refused and the session
    /// is left untouched.
    pub fn initialize(&mut self, materials: Vec<MaterialStockEntry>) -> Result<(), SessionError> {
        let mut positions = HashMap::with_capacity(materials.len());
        for (idx, m) in materials.iter().enumerate() {
            if positions.insert(m.id, idx).is_some() {
                return Err(SessionError::DuplicateMaterial(m.id));
            }
        }
        let recorded: HashMap<MaterialId, Quantity> = materials.iter().map(|m| (m.id, m.recorded_stock)).collect();

        *self = Self {
            materials,
            positions,
            cursor: 0,
            counted: recorded.clone(),
            recorded,
            visited: HashSet::new(),
            saved: HashSet::new(),
            active: true,
            navigating: false,
            generation: self.generation + 1,
        };
        Ok(())
    }

    /// Begin step-by-step navigation at the current cursor.
    pub fn start(&mut self) -> Result<(), SessionError> {
        if !self.active {
            return Err(SessionError::NotLoaded);
        }
        let current = self
            .materials
            .get(self.cursor)
            .ok_or(SessionError::EmptyCatalog)?
            .id;

        self.navigating = true;
        self.visited.insert(current);
        Ok(())
    }

    /// Leave navigation mode; counts, visited and saved sets are kept.
    pub fn finish_navigation(&mut self) {
        self.navigating = false;
    }

    /// Move forward one material. Returns `false` (and changes nothing) at the
    /// end of the list or when not navigating.
    pub fn go_to_next(&mut self) -> bool {
        if !self.can_go_to_next() {
            return false;
        }
        self.move_to(self.cursor + 1);
        true
    }

    /// Move back one material. Returns `false` (and changes nothing) at the
    /// start of the list or when not navigating.
    pub fn go_to_previous(&mut self) -> bool {
        if !self.can_go_to_previous() {
            return false;
        }
        self.move_to(self.cursor - 1);
        true
    }

    fn move_to(&mut self, index: usize) {
        self.cursor = index;
        let id = self.materials[index].id;
        self.visited.insert(id);
    }

    pub fn can_go_to_next(&self) -> bool {
        self.navigating && self.cursor + 1 < self.materials.len()
    }

    pub fn can_go_to_previous(&self) -> bool {
        self.navigating && self.cursor > 0
    }

    /// Overwrite the counted value of a material. Non-negativity is enforced by
    /// the input layer.
    ///
    /// A saved material stays saved only while its count equals the recorded
    /// stock; any other value has not been persisted.
    pub fn set_count(&mut self, material_id: MaterialId, value: Quantity) -> Result<(), SessionError> {
        self.ensure_known(material_id)?;
        self.counted.insert(material_id, value);
        if self.recorded.get(&material_id) != Some(&value) {
            self.saved.remove(&material_id);
        }
        Ok(())
    }

    /// Take over the stock the backend holds after a commit. Becomes the
    /// baseline for pending corrections and correction notes.
    pub fn record_stock(&mut self, update: &StockUpdate) -> Result<(), SessionError> {
        self.ensure_known(update.material_id)?;
        self.recorded.insert(update.material_id, update.recorded_stock);
        Ok(())
    }

    /// Idempotent insert into the saved set.
    pub fn mark_saved(&mut self, material_id: MaterialId) -> Result<(), SessionError> {
        self.ensure_known(material_id)?;
        self.saved.insert(material_id);
        Ok(())
    }

    /// Idempotent removal from the saved set. Returns whether the id was present.
    pub fn unmark_saved(&mut self, material_id: MaterialId) -> bool {
        self.saved.remove(&material_id)
    }

    fn ensure_known(&self, material_id: MaterialId) -> Result<(), SessionError> {
        if self.positions.contains_key(&material_id) {
            Ok(())
        } else {
            Err(SessionError::UnknownMaterial(material_id))
        }
    }

    /// Discard all state unconditionally. The generation counter survives so
    /// late responses issued against the old pass can be recognised.
    pub fn reset(&mut self) {
        let generation = self.generation + 1;
        *self = Self {
            generation,
            ..Self::default()
        };
    }

    pub fn progress(&self) -> InventoryProgress {
        let visited_count = self.visited.len();
        let total_count = self.materials.len();
        let percentage = if total_count == 0 {
            0
        } else {
            // Round half up, matching the on-screen indicator.
            ((visited_count * 200 + total_count) / (2 * total_count)).min(100) as u8
        };

        InventoryProgress {
            visited_count,
            saved_count: self.saved.len(),
            total_count,
            cursor: self.cursor,
            percentage,
        }
    }

    /// `"{cursor + 1}/{total}"`, or `"0/0"` when nothing is loaded.
    pub fn position_label(&self) -> String {
        if self.materials.is_empty() {
            "0/0".to_string()
        } else {
            format!("{}/{}", self.cursor + 1, self.materials.len())
        }
    }

    pub fn state(&self) -> SessionState {
        match (self.active, self.navigating) {
            (false, _) => SessionState::Empty,
            (true, false) => SessionState::Loaded,
            (true, true) => SessionState::Navigating,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn is_navigating(&self) -> bool {
        self.navigating
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn materials(&self) -> &[MaterialStockEntry] {
        &self.materials
    }

    pub fn material(&self, material_id: MaterialId) -> Option<&MaterialStockEntry> {
        self.positions.get(&material_id).map(|&idx| &self.materials[idx])
    }

    pub fn current_material(&self) -> Option<&MaterialStockEntry> {
        if !self.active {
            return None;
        }
        self.materials.get(self.cursor)
    }

    pub fn count_for(&self, material_id: MaterialId) -> Option<Quantity> {
        self.counted.get(&material_id).copied()
    }

    pub fn is_visited(&self, material_id: MaterialId) -> bool {
        self.visited.contains(&material_id)
    }

    pub fn is_saved(&self, material_id: MaterialId) -> bool {
        self.saved.contains(&material_id)
    }

    /// Stock the backend is known to hold, including commits made during this pass.
    pub fn recorded_stock(&self, material_id: MaterialId) -> Option<Quantity> {
        self.recorded.get(&material_id).copied()
    }

    /// Materials whose count differs from recorded stock and that are not saved,
    /// in session order.
    pub fn pending_corrections(&self) -> Vec<CorrectionPreview> {
        self.materials
            .iter()
            .filter(|m| !self.saved.contains(&m.id))
            .filter_map(|m| {
                let counted = self.count_for(m.id)?;
                let recorded = self.recorded_stock(m.id).unwrap_or(m.recorded_stock);
                (counted != recorded).then(|| CorrectionPreview {
                    material_id: m.id,
                    material_name: m.name.clone(),
                    counted,
                    recorded,
                })
            })
            .collect()
    }

    pub fn unsaved_count(&self) -> usize {
        self.pending_corrections().len()
    }
}
