// Finance Buddy - Web Server
// REST API over the shared session, plus the dashboard page

use anyhow::{Context, Result};
use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Json, Response},
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard};
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use finance_buddy::charts::Dimensions;
use finance_buddy::storage::ImportSummary;
use finance_buddy::{
    logging, AppConfig, AssetForm, DebtForm, FormErrors, Session, SortDirection, SortField,
    SqliteStore, Storage, TransactionQuery,
};

/// Shared application state
#[derive(Clone)]
struct AppState {
    session: Arc<Mutex<Session<SqliteStore>>>,
    config: Arc<AppConfig>,
}

impl AppState {
    fn session(&self) -> MutexGuard<'_, Session<SqliteStore>> {
        // Recover from a poisoned lock; the session holds only saved state
        self.session.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// API Response wrapper
#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    errors: Option<Vec<FieldError>>,
}

#[derive(Serialize)]
struct FieldError {
    field: &'static str,
    message: String,
}

impl<T: Serialize> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            errors: None,
        }
    }
}

fn ok<T: Serialize>(data: T) -> Response {
    (StatusCode::OK, Json(ApiResponse::ok(data))).into_response()
}

fn fail(status: StatusCode, message: impl Into<String>) -> Response {
    let body: ApiResponse<()> = ApiResponse {
        success: false,
        data: None,
        error: Some(message.into()),
        errors: None,
    };
    (status, Json(body)).into_response()
}

fn invalid(errors: FormErrors) -> Response {
    let body: ApiResponse<()> = ApiResponse {
        success: false,
        data: None,
        error: Some(errors.to_string()),
        errors: Some(
            errors
                .iter()
                .map(|(field, message)| FieldError {
                    field,
                    message: message.to_string(),
                })
                .collect(),
        ),
    };
    (StatusCode::UNPROCESSABLE_ENTITY, Json(body)).into_response()
}

fn svg(body: String) -> Response {
    ([(header::CONTENT_TYPE, "image/svg+xml")], body).into_response()
}

// ============================================================================
// Request bodies
// ============================================================================

/// Asset form body; numbers arrive as the raw text the user typed
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AssetRequest {
    #[serde(default)]
    name: String,
    #[serde(default)]
    value: serde_json::Value,
    #[serde(default)]
    is_home_equity: bool,
}

impl From<AssetRequest> for AssetForm {
    fn from(req: AssetRequest) -> Self {
        AssetForm {
            name: req.name,
            value: raw_number(&req.value),
            is_home_equity: req.is_home_equity,
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DebtRequest {
    #[serde(default)]
    name: String,
    #[serde(default)]
    balance: serde_json::Value,
    #[serde(default)]
    interest_rate: serde_json::Value,
}

impl From<DebtRequest> for DebtForm {
    fn from(req: DebtRequest) -> Self {
        DebtForm {
            name: req.name,
            balance: raw_number(&req.balance),
            interest_rate: raw_number(&req.interest_rate),
        }
    }
}

/// Accept either a JSON number or a string for numeric form fields
fn raw_number(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::Number(n) => n.to_string(),
        serde_json::Value::String(s) => s.clone(),
        _ => String::new(),
    }
}

#[derive(Deserialize)]
struct TransactionParams {
    sort: Option<SortField>,
    direction: Option<SortDirection>,
    category: Option<String>,
    search: Option<String>,
}

impl From<TransactionParams> for TransactionQuery {
    fn from(params: TransactionParams) -> Self {
        let defaults = TransactionQuery::default();
        TransactionQuery {
            sort_field: params.sort.unwrap_or(defaults.sort_field),
            direction: params.direction.unwrap_or(defaults.direction),
            category: params.category.filter(|c| !c.is_empty()),
            search: params.search.unwrap_or_default(),
        }
    }
}

#[derive(Deserialize)]
struct ChartParams {
    width: Option<f64>,
    height: Option<f64>,
}

impl ChartParams {
    fn dimensions(&self, base: Dimensions) -> Option<Dimensions> {
        let dims = Dimensions::new(self.width.unwrap_or(base.width), self.height.unwrap_or(base.height));
        (dims.width > 0.0 && dims.height > 0.0 && dims.width.is_finite() && dims.height.is_finite())
            .then_some(dims)
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ImportResponse {
    assets: Option<usize>,
    debts: Option<usize>,
    net_worth_snapshots: Option<usize>,
}

impl From<ImportSummary> for ImportResponse {
    fn from(summary: ImportSummary) -> Self {
        Self {
            assets: summary.assets,
            debts: summary.debts,
            net_worth_snapshots: summary.net_worth_snapshots,
        }
    }
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok("OK"))
}

/// GET /api/assets
async fn list_assets(State(state): State<AppState>) -> Response {
    ok(state.session().assets())
}

/// POST /api/assets
async fn create_asset(State(state): State<AppState>, Json(req): Json<AssetRequest>) -> Response {
    match state.session().save_asset_form(&req.into(), None) {
        Ok(asset) => (StatusCode::CREATED, Json(ApiResponse::ok(asset))).into_response(),
        Err(errors) => invalid(errors),
    }
}

/// PUT /api/assets/:id
async fn update_asset(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<AssetRequest>,
) -> Response {
    let mut session = state.session();
    if session.asset(&id).is_none() {
        return fail(StatusCode::NOT_FOUND, format!("No asset with id {}", id));
    }
    match session.save_asset_form(&req.into(), Some(&id)) {
        Ok(asset) => ok(asset),
        Err(errors) => invalid(errors),
    }
}

/// DELETE /api/assets/:id
async fn delete_asset(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    if state.session().remove_asset(&id) {
        ok(id)
    } else {
        fail(StatusCode::NOT_FOUND, format!("No asset with id {}", id))
    }
}

/// GET /api/debts
async fn list_debts(State(state): State<AppState>) -> Response {
    ok(state.session().debts())
}

/// POST /api/debts
async fn create_debt(State(state): State<AppState>, Json(req): Json<DebtRequest>) -> Response {
    match state.session().save_debt_form(&req.into(), None) {
        Ok(debt) => (StatusCode::CREATED, Json(ApiResponse::ok(debt))).into_response(),
        Err(errors) => invalid(errors),
    }
}

/// PUT /api/debts/:id
async fn update_debt(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<DebtRequest>,
) -> Response {
    let mut session = state.session();
    if session.debt(&id).is_none() {
        return fail(StatusCode::NOT_FOUND, format!("No debt with id {}", id));
    }
    match session.save_debt_form(&req.into(), Some(&id)) {
        Ok(debt) => ok(debt),
        Err(errors) => invalid(errors),
    }
}

/// DELETE /api/debts/:id
async fn delete_debt(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    if state.session().remove_debt(&id) {
        ok(id)
    } else {
        fail(StatusCode::NOT_FOUND, format!("No debt with id {}", id))
    }
}

/// GET /api/transactions?sort=amount&direction=asc&category=dining&search=tesco
async fn list_transactions(
    State(state): State<AppState>,
    Query(params): Query<TransactionParams>,
) -> Response {
    let query: TransactionQuery = params.into();
    let session = state.session();
    ok(session.ledger(&query))
}

/// GET /api/snapshots
async fn list_snapshots(State(state): State<AppState>) -> Response {
    ok(finance_buddy::net_worth::sort_by_date(state.session().snapshots()))
}

/// POST /api/snapshots - Reconcile today's snapshot
async fn record_snapshot(State(state): State<AppState>) -> Response {
    let mut session = state.session();
    session.record_snapshot();
    ok(finance_buddy::net_worth::latest_snapshot(session.snapshots()).cloned())
}

/// GET /api/summary
async fn get_summary(State(state): State<AppState>) -> Response {
    ok(state.session().dashboard())
}

/// GET /api/charts/trend.svg
async fn trend_svg(State(state): State<AppState>, Query(params): Query<ChartParams>) -> Response {
    match params.dimensions(state.config.charts.trend()) {
        Some(dims) => svg(state.session().trend_chart(dims).to_svg()),
        None => fail(StatusCode::BAD_REQUEST, "Chart size must be positive"),
    }
}

/// GET /api/charts/allocation.svg
async fn allocation_svg(State(state): State<AppState>, Query(params): Query<ChartParams>) -> Response {
    match params.dimensions(state.config.charts.allocation()) {
        Some(dims) => svg(state.session().allocation_chart(dims).to_svg()),
        None => fail(StatusCode::BAD_REQUEST, "Chart size must be positive"),
    }
}

/// GET /api/export - Download the export document
async fn export_data(State(state): State<AppState>) -> Response {
    let session = state.session();
    match session.export() {
        Ok(json) => {
            let filename = format!(
                "attachment; filename=\"finance-buddy-export-{}.json\"",
                session.now().format("%Y-%m-%d")
            );
            (
                [
                    (header::CONTENT_TYPE, "application/json".to_string()),
                    (header::CONTENT_DISPOSITION, filename),
                ],
                json,
            )
                .into_response()
        }
        Err(e) => {
            error!(error = %e, "export failed");
            fail(StatusCode::INTERNAL_SERVER_ERROR, "Export failed")
        }
    }
}

/// POST /api/import - Body is an export document
async fn import_data(State(state): State<AppState>, body: Bytes) -> Response {
    let json = match std::str::from_utf8(&body) {
        Ok(json) => json,
        Err(_) => return fail(StatusCode::BAD_REQUEST, "Import body must be UTF-8 JSON"),
    };

    match state.session().try_import(json) {
        Ok(summary) => ok(ImportResponse::from(summary)),
        Err(e) => fail(StatusCode::BAD_REQUEST, e.to_string()),
    }
}

/// GET / - Serve index.html
async fn serve_index() -> impl IntoResponse {
    Html(include_str!("../web/index.html"))
}

// ============================================================================
// Main Server
// ============================================================================

fn router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/assets", get(list_assets).post(create_asset))
        .route("/assets/:id", axum::routing::put(update_asset).delete(delete_asset))
        .route("/debts", get(list_debts).post(create_debt))
        .route("/debts/:id", axum::routing::put(update_debt).delete(delete_debt))
        .route("/transactions", get(list_transactions))
        .route("/snapshots", get(list_snapshots).post(record_snapshot))
        .route("/summary", get(get_summary))
        .route("/charts/trend.svg", get(trend_svg))
        .route("/charts/allocation.svg", get(allocation_svg))
        .route("/export", get(export_data))
        .route("/import", axum::routing::post(import_data))
        .with_state(state);

    Router::new()
        .route("/", get(serve_index))
        .nest("/api", api_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::load().context("loading configuration")?;
    logging::init_stderr(&config.log.filter);

    let db_path = &config.data.path;
    if let Some(dir) = db_path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir).with_context(|| format!("creating data directory {}", dir.display()))?;
    }
    let store = SqliteStore::open(db_path).with_context(|| format!("opening database {}", db_path.display()))?;
    info!(path = %db_path.display(), "database opened");

    let session = Session::load(Storage::new(store));
    let bind = config.server.bind.clone();

    // Create shared state
    let state = AppState {
        session: Arc::new(Mutex::new(session)),
        config: Arc::new(config),
    };

    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .with_context(|| format!("binding {}", bind))?;

    info!("server running on http://{}", bind);

    axum::serve(listener, app).await.context("serving")?;
    Ok(())
}
