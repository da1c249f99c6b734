use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{Value, json};

use stocktake_client::{ApiClient, ClientConfig, HttpCatalogProvider, HttpCorrectionService};
use stocktake_core::{MaterialId, Quantity, WorkshopId};
use stocktake_workflow::{
    CommitOutcome, CorrectionRequest, CorrectionService, InventoryNavigator, NavigatorConfig, PortError, SaveOutcome,
    SessionHandle, StockCatalogProvider,
};

const TOKEN: &str = "test-token";
const WORKSHOP: WorkshopId = WorkshopId::new(7);

/// Minimal stand-in for the workshop backend.
#[derive(Default)]
struct StubBackend {
    /// material id -> recorded stock in hundredths
    stock: HashMap<u64, i64>,
    movements: Vec<Value>,
    fail_with: Option<StatusCode>,
}

type Shared = Arc<Mutex<StubBackend>>;

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == format!("Bearer {TOKEN}"))
}

async fn material_stock(
    State(state): State<Shared>,
    Path(workshop_id): Path<u64>,
    headers: HeaderMap,
) -> (StatusCode, Json<Value>) {
    if !authorized(&headers) {
        return (StatusCode::UNAUTHORIZED, Json(json!({"detail": "unauthorized"})));
    }
    if workshop_id != WORKSHOP.get() {
        return (StatusCode::NOT_FOUND, Json(json!({"detail": "Nicht gefunden."})));
    }

    let state = state.lock().unwrap();
    let stock = |id: u64| {
        state
            .stock
            .get(&id)
            .map(|h| json!(format!("{}.{:02}", h / 100, h % 100)))
            .unwrap_or(Value::Null)
    };
    (
        StatusCode::OK,
        Json(json!([
            {"category_id": 1, "category_name": "Fasteners", "materials": [
                {"id": 1, "bezeichnung": "Bolt M8", "current_stock": stock(1)},
                {"id": 2, "bezeichnung": "Nut M8", "current_stock": stock(2)}
            ]},
            {"category_id": null, "category_name": "Ohne Kategorie", "materials": [
                {"id": 3, "bezeichnung": "Tape", "current_stock": stock(3)}
            ]}
        ])),
    )
}

async fn create_movement(
    State(state): State<Shared>,
    Path(material_id): Path<u64>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    if !authorized(&headers) {
        return (StatusCode::UNAUTHORIZED, Json(json!({"detail": "unauthorized"})));
    }

    let mut state = state.lock().unwrap();
    if let Some(status) = state.fail_with.take() {
        return (status, Json(json!({"detail": "backend failure"})));
    }

    let counted: Quantity = body["quantity"].as_str().unwrap().parse().unwrap();
    let recorded = state.stock.get(&material_id).copied().unwrap_or(0);
    if recorded == counted.hundredths() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"non_field_errors": ["Der Bestand ist bereits korrekt."]})),
        );
    }

    state.stock.insert(material_id, counted.hundredths());
    state.movements.push(body.clone());
    (StatusCode::CREATED, Json(body))
}

struct TestServer {
    base_url: String,
    state: Shared,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn(stock: &[(u64, i64)]) -> Self {
        let state: Shared = Arc::new(Mutex::new(StubBackend {
            stock: stock.iter().copied().collect(),
            ..StubBackend::default()
        }));
        let app = Router::new()
            .route("/api/workshops/:id/material-stock/", get(material_stock))
            .route("/api/materials/:id/movements", post(create_movement))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url,
            state,
            handle,
        }
    }

    fn api(&self) -> ApiClient {
        ApiClient::new(ClientConfig::new(&self.base_url).with_token(TOKEN)).unwrap()
    }

    fn movements(&self) -> Vec<Value> {
        self.state.lock().unwrap().movements.clone()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn request(material_id: u64, counted: Quantity) -> CorrectionRequest {
    CorrectionRequest {
        request_id: Default::default(),
        material_id: MaterialId::new(material_id),
        counted,
        note: "check".to_string(),
    }
}

#[tokio::test]
async fn catalog_is_fetched_grouped_and_decoded() {
    let server = TestServer::spawn(&[(1, 1000), (2, 250)]).await;
    let provider = HttpCatalogProvider::new(server.api());

    let catalog = provider.fetch_catalog(WORKSHOP).await.unwrap();

    let ids: Vec<u64> = catalog.flatten().iter().map(|m| m.id.get()).collect();
    assert_eq!(ids, vec![1, 2, 3]);
    assert_eq!(
        catalog.find(MaterialId::new(2)).unwrap().recorded_stock,
        Quantity::from_hundredths(250)
    );
    // No recorded stock yet.
    assert_eq!(catalog.find(MaterialId::new(3)).unwrap().recorded_stock, Quantity::ZERO);
}

#[tokio::test]
async fn unknown_workshop_is_rejected() {
    let server = TestServer::spawn(&[]).await;
    let provider = HttpCatalogProvider::new(server.api());

    let err = provider.fetch_catalog(WorkshopId::new(99)).await.unwrap_err();
    assert!(matches!(err, PortError::Rejected { status: 404, .. }));
}

#[tokio::test]
async fn missing_token_is_rejected() {
    let server = TestServer::spawn(&[]).await;
    let api = ApiClient::new(ClientConfig::new(&server.base_url)).unwrap();

    let err = HttpCatalogProvider::new(api).fetch_catalog(WORKSHOP).await.unwrap_err();
    assert!(matches!(err, PortError::Rejected { status: 401, .. }));
}

#[tokio::test]
async fn commit_posts_a_stocktake_movement() {
    let server = TestServer::spawn(&[(1, 1000)]).await;
    let service = HttpCorrectionService::new(server.api(), WORKSHOP);

    let outcome = service.commit(&request(1, Quantity::from_hundredths(850))).await;

    assert_eq!(
        outcome,
        CommitOutcome::Committed {
            updated_stock: Quantity::from_hundredths(850)
        }
    );
    let movements = server.movements();
    assert_eq!(movements.len(), 1);
    assert_eq!(movements[0]["change_type"], "inventur");
    assert_eq!(movements[0]["quantity"], "8.50");
    assert_eq!(movements[0]["workshop_id"], 7);
    assert_eq!(movements[0]["note"], "check");
}

#[tokio::test]
async fn unchanged_count_is_already_correct() {
    let server = TestServer::spawn(&[(1, 1000)]).await;
    let service = HttpCorrectionService::new(server.api(), WORKSHOP);

    let outcome = service.commit(&request(1, Quantity::from_units(10))).await;

    assert_eq!(
        outcome,
        CommitOutcome::AlreadyCorrect {
            updated_stock: Quantity::from_units(10)
        }
    );
    assert!(server.movements().is_empty());
}

#[tokio::test]
async fn server_error_is_a_failure() {
    let server = TestServer::spawn(&[(1, 1000)]).await;
    server.state.lock().unwrap().fail_with = Some(StatusCode::INTERNAL_SERVER_ERROR);
    let service = HttpCorrectionService::new(server.api(), WORKSHOP);

    match service.commit(&request(1, Quantity::from_units(3))).await {
        CommitOutcome::Failed(reason) => assert!(reason.contains("500")),
        other => panic!("Expected Failed, got {other:?}"),
    }
}

#[tokio::test]
async fn unreachable_backend_is_a_failure() {
    // Bind and drop to get a port nothing listens on.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let config = ClientConfig::new(format!("http://{addr}")).with_request_timeout(Duration::from_secs(2));
    let service = HttpCorrectionService::new(ApiClient::new(config).unwrap(), WORKSHOP);

    match service.commit(&request(1, Quantity::from_units(3))).await {
        CommitOutcome::Failed(reason) => assert!(reason.contains("unavailable")),
        other => panic!("Expected Failed, got {other:?}"),
    }
}

#[tokio::test]
async fn full_pass_over_http() {
    let server = TestServer::spawn(&[(1, 1000), (2, 500), (3, 0)]).await;
    let api = server.api();
    let navigator = InventoryNavigator::new(
        SessionHandle::new(),
        HttpCatalogProvider::new(api.clone()),
        HttpCorrectionService::new(api, WORKSHOP),
        NavigatorConfig::default(),
    );
    navigator.load(WORKSHOP).await.unwrap();
    navigator.start().unwrap();

    // Unchanged, corrected, corrected.
    let first = navigator.save_and_advance(Some(Quantity::from_units(10))).await.unwrap();
    assert!(matches!(first, SaveOutcome::Advanced { ref saved, cursor: 1 } if saved.already_correct));
    navigator.save_and_advance(Some(Quantity::from_units(6))).await.unwrap();
    let last = navigator.save_and_advance(Some(Quantity::from_units(2))).await.unwrap();

    let SaveOutcome::Finished { summary, .. } = last else {
        panic!("Expected Finished, got {last:?}");
    };
    assert_eq!((summary.processed_count, summary.saved_count, summary.total_count), (3, 3, 3));
    assert_eq!(server.movements().len(), 2);

    let refreshed = navigator.refresh_catalog(WORKSHOP).await.unwrap();
    assert_eq!(
        refreshed.find(MaterialId::new(2)).unwrap().recorded_stock,
        Quantity::from_units(6)
    );
}
