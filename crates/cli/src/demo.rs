//! Offline catalog for `stocktake --demo`.

use stocktake_core::{CategoryId, DomainResult, MaterialId, Quantity, WorkshopId};
use stocktake_inventory::{CategoryGroup, MaterialStockEntry, StockCatalog};

pub const DEMO_WORKSHOP: WorkshopId = WorkshopId::new(1);

pub fn demo_catalog() -> DomainResult<StockCatalog> {
    let fasteners = CategoryId::new(1);
    StockCatalog::new(
        DEMO_WORKSHOP,
        vec![
            CategoryGroup {
                category_id: Some(fasteners),
                category_name: "Fasteners".to_string(),
                materials: vec![
                    MaterialStockEntry::new(MaterialId::new(1), "Bolt M8", Quantity::from_units(120))
                        .with_category(fasteners),
                    MaterialStockEntry::new(MaterialId::new(2), "Nut M8", Quantity::from_units(80))
                        .with_category(fasteners),
                ],
            },
            CategoryGroup {
                category_id: None,
                category_name: "Uncategorised".to_string(),
                materials: vec![MaterialStockEntry::new(
                    MaterialId::new(3),
                    "Duct tape",
                    Quantity::from_hundredths(350),
                )],
            },
        ],
    )
}
