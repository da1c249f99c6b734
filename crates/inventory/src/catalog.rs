use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use stocktake_core::{CategoryId, DomainError, DomainResult, MaterialId, Quantity, WorkshopId};

/// One material with its last-known recorded stock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaterialStockEntry {
    pub id: MaterialId,
    pub name: String,
    /// Recorded stock at catalog load time; the starting suggestion for the count.
    pub recorded_stock: Quantity,
    /// Display grouping only. `None` for uncategorised materials.
    pub category_id: Option<CategoryId>,
}

impl MaterialStockEntry {
    pub fn new(id: MaterialId, name: impl Into<String>, recorded_stock: Quantity) -> Self {
        Self {
            id,
            name: name.into(),
            recorded_stock,
            category_id: None,
        }
    }

    pub fn with_category(mut self, category_id: CategoryId) -> Self {
        self.category_id = Some(category_id);
        self
    }
}

/// Materials of one category, in display order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryGroup {
    pub category_id: Option<CategoryId>,
    pub category_name: String,
    pub materials: Vec<MaterialStockEntry>,
}

/// Recorded stock after a commit, for the caller to apply to its own catalog copy.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockUpdate {
    pub material_id: MaterialId,
    pub recorded_stock: Quantity,
}

/// Category-grouped stock of one workshop.
///
/// Group order and the order of materials inside each group are preserved; the
/// flattened sequence is the iteration order of a stock-take.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockCatalog {
    workshop_id: WorkshopId,
    groups: Vec<CategoryGroup>,
}

impl StockCatalog {
    /// Build a catalog, rejecting a material that appears in more than one place.
    pub fn new(workshop_id: WorkshopId, groups: Vec<CategoryGroup>) -> DomainResult<Self> {
        let mut seen = HashSet::new();
        for group in &groups {
            for material in &group.materials {
                if !seen.insert(material.id) {
                    return Err(DomainError::invariant(format!(
                        "material {} appears more than once in the catalog",
                        material.id
                    )));
                }
            }
        }
        Ok(Self {
            workshop_id,
            groups,
        })
    }

    pub fn workshop_id(&self) -> WorkshopId {
        self.workshop_id
    }

    pub fn groups(&self) -> &[CategoryGroup] {
        &self.groups
    }

    pub fn len(&self) -> usize {
        self.groups.iter().map(|g| g.materials.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn find(&self, material_id: MaterialId) -> Option<&MaterialStockEntry> {
        self.groups
            .iter()
            .flat_map(|g| g.materials.iter())
            .find(|m| m.id == material_id)
    }

    /// The ordered sequence a session walks through.
    pub fn flatten(&self) -> Vec<MaterialStockEntry> {
        self.groups
            .iter()
            .flat_map(|g| g.materials.iter().cloned())
            .collect()
    }

    pub fn apply_stock_update(&mut self, update: &StockUpdate) -> DomainResult<()> {
        let entry = self
            .groups
            .iter_mut()
            .flat_map(|g| g.materials.iter_mut())
            .find(|m| m.id == update.material_id)
            .ok_or_else(|| DomainError::not_found(format!("material {}", update.material_id)))?;
        entry.recorded_stock = update.recorded_stock;
        Ok(())
    }
}
