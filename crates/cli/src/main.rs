use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::Parser;
use tokio::io::BufReader;

use stocktake_cli::demo::{DEMO_WORKSHOP, demo_catalog};
use stocktake_client::{ApiClient, ClientConfig, HttpCatalogProvider, HttpCorrectionService};
use stocktake_core::WorkshopId;
use stocktake_workflow::{
    CorrectionService, InMemoryStockBackend, InventoryNavigator, NavigatorConfig, SessionHandle, StockCatalogProvider,
};

#[derive(Parser)]
#[command(name = "stocktake")]
#[command(about = "Count a workshop's materials and correct recorded stock", long_about = None)]
struct Cli {
    /// Workshop whose stock is counted
    #[arg(env = "STOCKTAKE_WORKSHOP_ID")]
    workshop_id: Option<WorkshopId>,

    /// Run against a built-in in-memory catalog instead of the backend
    #[arg(long)]
    demo: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    stocktake_observability::init();

    let cli = Cli::parse();
    let config = NavigatorConfig::from_env();

    if cli.demo {
        tracing::info!("running against the in-memory demo backend");
        let backend = Arc::new(InMemoryStockBackend::new(demo_catalog()?));
        let navigator = InventoryNavigator::new(SessionHandle::new(), backend.clone(), backend, config);
        return drive(&navigator, DEMO_WORKSHOP).await;
    }

    let Some(workshop_id) = cli.workshop_id else {
        bail!("no workshop given: pass WORKSHOP_ID or set STOCKTAKE_WORKSHOP_ID");
    };
    let client_config = ClientConfig::from_env();
    tracing::info!("using backend {}", client_config.base_url);
    let api = ApiClient::new(client_config)?;
    let navigator = InventoryNavigator::new(
        SessionHandle::new(),
        HttpCatalogProvider::new(api.clone()),
        HttpCorrectionService::new(api, workshop_id),
        config,
    );
    drive(&navigator, workshop_id).await
}

async fn drive<P, S>(navigator: &InventoryNavigator<P, S>, workshop_id: WorkshopId) -> Result<()>
where
    P: StockCatalogProvider,
    S: CorrectionService,
{
    let catalog = navigator
        .load(workshop_id)
        .await
        .with_context(|| format!("could not load stock of workshop {workshop_id}"))?;
    println!(
        "workshop {}: {} materials in {} categories (h for help)",
        workshop_id,
        catalog.len(),
        catalog.groups().len()
    );
    navigator.start()?;

    let stdin = BufReader::new(tokio::io::stdin());
    let mut stdout = std::io::stdout();
    let summary = stocktake_cli::run(navigator, stdin, &mut stdout).await?;

    if summary.is_some() {
        let refreshed = navigator.refresh_catalog(workshop_id).await?;
        println!("catalog refreshed: {} materials", refreshed.len());
    }
    Ok(())
}
