use async_trait::async_trait;
use tracing::{info, warn};

use stocktake_core::WorkshopId;
use stocktake_inventory::StockCatalog;
use stocktake_workflow::{PortError, StockCatalogProvider};

use crate::api::ApiClient;
use crate::dto::{CategoryGroupDto, into_catalog};
use crate::error::ClientError;

/// Reads `GET /api/workshops/{id}/material-stock/`.
#[derive(Debug, Clone)]
pub struct HttpCatalogProvider {
    api: ApiClient,
}

impl HttpCatalogProvider {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    pub async fn fetch(&self, workshop_id: WorkshopId) -> Result<StockCatalog, ClientError> {
        let path = format!("/api/workshops/{workshop_id}/material-stock/");
        let groups: Vec<CategoryGroupDto> = self.api.get_json(&path).await?;
        let catalog = into_catalog(workshop_id, groups)?;
        info!(
            "fetched {} materials in {} groups for workshop {}",
            catalog.len(),
            catalog.groups().len(),
            workshop_id
        );
        Ok(catalog)
    }
}

#[async_trait]
impl StockCatalogProvider for HttpCatalogProvider {
    async fn fetch_catalog(&self, workshop_id: WorkshopId) -> Result<StockCatalog, PortError> {
        self.fetch(workshop_id).await.map_err(|e| {
            warn!("catalog fetch for workshop {} failed: {}", workshop_id, e);
            PortError::from(e)
        })
    }
}
