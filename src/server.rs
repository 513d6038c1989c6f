use axum::{
    Json, Router,
    body::Bytes,
    extract::{Path, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use log::{error, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::config::AppConfig;
use crate::data::{ScheduleRequest, Timetable};
use crate::error::TimetableError;
use crate::solver::{self, SolverOptions};
use crate::upload;

pub type TimetableId = u64;

/// Most recent timetables, kept so clients can fetch or export them later.
#[derive(Debug)]
pub struct TimetableStore {
    entries: VecDeque<(TimetableId, Timetable)>,
    next_id: TimetableId,
    capacity: usize,
}

impl TimetableStore {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            next_id: 1,
            capacity: capacity.max(1),
        }
    }

    /// Stores a timetable, evicting the oldest one when full.
    pub fn insert(&mut self, timetable: Timetable) -> TimetableId {
        let id = self.next_id;
        self.next_id += 1;
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back((id, timetable));
        id
    }

    pub fn get(&self, id: TimetableId) -> Option<&Timetable> {
        self.entries
            .iter()
            .find(|(entry_id, _)| *entry_id == id)
            .map(|(_, timetable)| timetable)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Clone)]
pub struct AppState {
    store: Arc<Mutex<TimetableStore>>,
    solver: SolverOptions,
}

impl AppState {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            store: Arc::new(Mutex::new(TimetableStore::new(config.store_capacity))),
            solver: config.solver,
        }
    }

    fn store(&self) -> MutexGuard<'_, TimetableStore> {
        // a poisoned store is still consistent
        self.store.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Error body returned by every endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Debug)]
pub enum ApiError {
    Timetable(TimetableError),
    NotFound(TimetableId),
    Internal(String),
}

impl From<TimetableError> for ApiError {
    fn from(err: TimetableError) -> Self {
        ApiError::Timetable(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            ApiError::Timetable(err) => {
                let status = match err {
                    TimetableError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
                    TimetableError::SolverFailure(_) => StatusCode::INTERNAL_SERVER_ERROR,
                    ref e if e.is_validation() => StatusCode::BAD_REQUEST,
                    _ => StatusCode::UNPROCESSABLE_ENTITY,
                };
                (status, err.code().to_string(), err.to_string())
            }
            ApiError::NotFound(id) => (
                StatusCode::NOT_FOUND,
                "NOT_FOUND".to_string(),
                format!("No timetable with id {}", id),
            ),
            ApiError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL".to_string(),
                msg,
            ),
        };
        (status, Json(ApiErrorBody { code, message })).into_response()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateResponse {
    pub id: TimetableId,
    pub timetable: Timetable,
}

async fn generate(state: AppState, request: ScheduleRequest) -> Result<GenerateResponse, ApiError> {
    info!(
        "Generating timetable for {} courses, {} periods per day",
        request.courses.len(),
        request.constraints.periods_per_day
    );
    let options = state.solver;
    let result = tokio::task::spawn_blocking(move || {
        solver::schedule_with_options(&request.constraints, &request.courses, &options)
    })
    .await
    .map_err(|e| {
        error!("Solver task failed: {}", e);
        ApiError::Internal("timetable generation was interrupted".to_string())
    })?;

    let timetable = result.inspect_err(|e| warn!("Timetable generation failed: {}", e))?;
    let id = state.store().insert(timetable.clone());
    info!("Stored timetable {}", id);
    Ok(GenerateResponse { id, timetable })
}

async fn generate_handler(
    State(state): State<AppState>,
    Json(request): Json<ScheduleRequest>,
) -> Result<Json<GenerateResponse>, ApiError> {
    generate(state, request).await.map(Json)
}

async fn upload_handler(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<GenerateResponse>, ApiError> {
    let text = std::str::from_utf8(&body).map_err(|e| {
        warn!("Rejected upload of {} bytes: {}", body.len(), e);
        TimetableError::InvalidUpload("file is not valid UTF-8 text".to_string())
    })?;
    let request = upload::parse_schedule_csv(text)?;
    generate(state, request).await.map(Json)
}

fn csv_attachment(filename: &str, body: String) -> Response {
    (
        [
            (header::CONTENT_TYPE, "text/csv".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename={}", filename),
            ),
        ],
        body,
    )
        .into_response()
}

async fn template_handler() -> Response {
    csv_attachment("template.csv", upload::template_csv())
}

async fn timetable_handler(
    State(state): State<AppState>,
    Path(id): Path<TimetableId>,
) -> Result<Json<Timetable>, ApiError> {
    let timetable = state.store().get(id).cloned();
    timetable.map(Json).ok_or(ApiError::NotFound(id))
}

async fn export_handler(
    State(state): State<AppState>,
    Path(id): Path<TimetableId>,
) -> Result<Response, ApiError> {
    let csv = state
        .store()
        .get(id)
        .map(upload::timetable_to_csv)
        .ok_or(ApiError::NotFound(id))?;
    Ok(csv_attachment("timetable.csv", csv))
}

async fn health_handler() -> &'static str {
    "ok"
}

pub fn router(state: AppState) -> Router {
    let api_v1 = Router::new()
        .route("/timetable/generate", post(generate_handler))
        .route("/timetable/upload", post(upload_handler))
        .route("/timetable/template.csv", get(template_handler))
        .route("/timetable/:id", get(timetable_handler))
        .route("/timetable/:id/export.csv", get(export_handler));

    Router::new()
        .route("/health", get(health_handler))
        .nest("/v1", api_v1)
        .with_state(state)
}

pub async fn run_server(config: AppConfig) -> std::io::Result<()> {
    let app = router(AppState::new(&config));

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;

    info!("Server running at http://{}", listener.local_addr()?);

    axum::serve(listener, app).await
}
