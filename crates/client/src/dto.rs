//! Wire shapes of the REST backend.

use serde::{Deserialize, Serialize};

use stocktake_core::{CategoryId, DomainResult, MaterialId, Quantity, WorkshopId};
use stocktake_inventory::{CategoryGroup, MaterialStockEntry, StockCatalog};

/// Label used for a group without a category id when the backend sends no name.
pub const UNCATEGORISED_LABEL: &str = "Uncategorised";

/// Backend `change_type` for stock-take corrections.
pub const CHANGE_TYPE_STOCKTAKE: &str = "inventur";

#[derive(Debug, Clone, Deserialize)]
pub struct CategoryGroupDto {
    #[serde(default)]
    pub category_id: Option<u64>,
    #[serde(default)]
    pub category_name: Option<String>,
    #[serde(default)]
    pub materials: Vec<MaterialDto>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MaterialDto {
    pub id: u64,
    pub bezeichnung: String,
    /// `null` when the material has never been stocked.
    #[serde(default)]
    pub current_stock: Option<Quantity>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MovementRequestDto<'a> {
    pub workshop_id: WorkshopId,
    pub change_type: &'a str,
    /// Decimal string with two fractional digits, as the backend's decimal field expects.
    pub quantity: String,
    pub note: &'a str,
}

/// Build the domain catalog. Groups keep backend order except that the
/// uncategorised group is moved last.
pub fn into_catalog(workshop_id: WorkshopId, groups: Vec<CategoryGroupDto>) -> DomainResult<StockCatalog> {
    let (mut categorised, uncategorised): (Vec<_>, Vec<_>) =
        groups.into_iter().partition(|g| g.category_id.is_some());
    categorised.extend(uncategorised);

    let groups = categorised
        .into_iter()
        .map(|group| {
            let category_id = group.category_id.map(CategoryId::new);
            let materials = group
                .materials
                .into_iter()
                .map(|m| {
                    let entry = MaterialStockEntry::new(
                        MaterialId::new(m.id),
                        m.bezeichnung,
                        m.current_stock.unwrap_or(Quantity::ZERO),
                    );
                    match category_id {
                        Some(id) => entry.with_category(id),
                        None => entry,
                    }
                })
                .collect();
            CategoryGroup {
                category_id,
                category_name: group
                    .category_name
                    .unwrap_or_else(|| UNCATEGORISED_LABEL.to_string()),
                materials,
            }
        })
        .collect();

    StockCatalog::new(workshop_id, groups)
}
