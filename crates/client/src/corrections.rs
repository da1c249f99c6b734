use async_trait::async_trait;
use reqwest::Method;
use tracing::{debug, warn};

use stocktake_core::{Quantity, WorkshopId};
use stocktake_workflow::{CommitOutcome, CorrectionRequest, CorrectionService, PortError};

use crate::api::ApiClient;
use crate::dto::{CHANGE_TYPE_STOCKTAKE, MovementRequestDto};

/// Longest error body quoted in a failure reason.
const MAX_REASON_BODY: usize = 200;

/// Posts stock-take movements to `POST /api/materials/{id}/movements`.
#[derive(Debug, Clone)]
pub struct HttpCorrectionService {
    api: ApiClient,
    workshop_id: WorkshopId,
}

impl HttpCorrectionService {
    pub fn new(api: ApiClient, workshop_id: WorkshopId) -> Self {
        Self { api, workshop_id }
    }

    pub fn workshop_id(&self) -> WorkshopId {
        self.workshop_id
    }
}

#[async_trait]
impl CorrectionService for HttpCorrectionService {
    async fn commit(&self, request: &CorrectionRequest) -> CommitOutcome {
        let path = format!("/api/materials/{}/movements", request.material_id);
        let body = MovementRequestDto {
            workshop_id: self.workshop_id,
            change_type: CHANGE_TYPE_STOCKTAKE,
            quantity: request.counted.to_decimal_string(),
            note: &request.note,
        };

        let resp = match self.api.request(Method::POST, &path).json(&body).send().await {
            Ok(resp) => resp,
            Err(e) => {
                warn!("request {} could not reach backend: {}", request.request_id, e);
                return CommitOutcome::Failed(PortError::Unavailable(e.to_string()).to_string());
            }
        };

        let status = resp.status().as_u16();
        let text = match resp.text().await {
            Ok(text) => text,
            Err(e) => return CommitOutcome::Failed(PortError::Decode(e.to_string()).to_string()),
        };
        debug!("request {} answered {}", request.request_id, status);

        classify_commit_response(status, &text, request.counted, &self.api.config().already_correct_sentinel)
    }
}

/// Map a movement response onto a commit outcome.
///
/// A 400 carrying the sentinel means the counted value already equals recorded
/// stock; that is a success, not an error.
pub fn classify_commit_response(status: u16, body: &str, counted: Quantity, sentinel: &str) -> CommitOutcome {
    match status {
        200..=299 => CommitOutcome::Committed { updated_stock: counted },
        400 if !sentinel.is_empty() && body.contains(sentinel) => {
            CommitOutcome::AlreadyCorrect { updated_stock: counted }
        }
        _ => CommitOutcome::Failed(
            PortError::Rejected {
                status,
                message: truncate(body.trim(), MAX_REASON_BODY),
            }
            .to_string(),
        ),
    }
}

fn truncate(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &s[..idx]),
        None => s.to_string(),
    }
}
