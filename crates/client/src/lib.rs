//! HTTP adapters for the stock-take workflow.
//!
//! Implements [`StockCatalogProvider`](stocktake_workflow::StockCatalogProvider)
//! and [`CorrectionService`](stocktake_workflow::CorrectionService) against the
//! workshop REST backend. Status codes and error payloads are interpreted here;
//! the navigator only sees commit outcomes.

pub mod api;
pub mod catalog;
pub mod config;
pub mod corrections;
pub mod dto;
pub mod error;

pub use api::ApiClient;
pub use catalog::HttpCatalogProvider;
pub use config::ClientConfig;
pub use corrections::{HttpCorrectionService, classify_commit_response};
pub use error::ClientError;
