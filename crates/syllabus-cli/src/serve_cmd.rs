use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use uuid::Uuid;

use syllabus_core::batch::{BatchOperation, BatchOperationResult};
use syllabus_core::entities::{ParticipantForm, PlanForm};
use syllabus_core::status::{self, StatusDisplay};
use syllabus_core::workbench::PlanWithStats;
use syllabus_core::{ErrorKind, Workbench, WorkbenchError};
use syllabus_db::models::{Participant, ParticipantTarget, Plan, Schedule};

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

pub struct AppError {
    status: StatusCode,
    kind: ErrorKind,
    message: String,
}

impl From<WorkbenchError> for AppError {
    fn from(err: WorkbenchError) -> Self {
        let kind = err.kind();
        let status = match kind {
            ErrorKind::ValidationError => StatusCode::UNPROCESSABLE_ENTITY,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::InvalidTransition
            | ErrorKind::DuplicateParticipant
            | ErrorKind::ConcurrentModification
            | ErrorKind::ConstraintViolation => StatusCode::CONFLICT,
            ErrorKind::Timeout => StatusCode::GATEWAY_TIMEOUT,
            ErrorKind::Cancelled | ErrorKind::Storage => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            tracing::error!(error = %err, kind = %kind, "request failed");
        }
        Self {
            status,
            kind,
            message: err.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let body = serde_json::json!({ "error": self.message, "kind": self.kind });
        (self.status, Json(body)).into_response()
    }
}

type ApiResult<T> = Result<T, AppError>;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct BatchRequest {
    pub operations: Vec<BatchOperation>,
}

#[derive(Debug, Serialize)]
pub struct RemovedResponse {
    pub removed: bool,
}

#[derive(Debug, Serialize)]
pub struct TriageEntry {
    #[serde(flatten)]
    pub schedule: Schedule,
    pub display: StatusDisplay,
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct AppState {
    workbench: Arc<Workbench>,
    /// Cancelled on shutdown; each batch runs under a child token.
    shutdown: CancellationToken,
}

pub fn build_router(workbench: Arc<Workbench>, shutdown: CancellationToken) -> Router {
    Router::new()
        .route("/api/plans", get(list_plans).post(create_plan))
        .route("/api/plans/{id}", get(get_plan).delete(delete_plan))
        .route("/api/plans/{id}/triage", get(triage))
        .route("/api/plans/{id}/schedules/batch", post(batch_schedule))
        .route("/api/plans/{id}/participants", post(assign_to_plan))
        .route(
            "/api/plans/{id}/participants/{participant_id}",
            delete(remove_from_plan),
        )
        .route("/api/schedules/{id}/participants", post(assign_to_schedule))
        .route(
            "/api/schedules/{id}/participants/{participant_id}",
            delete(remove_from_schedule),
        )
        .route("/api/schedules/{id}/roster", get(roster))
        .layer(CorsLayer::permissive())
        .with_state(AppState {
            workbench,
            shutdown,
        })
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub async fn run_serve(workbench: Workbench, bind: &str, port: u16) -> Result<()> {
    let shutdown = CancellationToken::new();
    let app = build_router(Arc::new(workbench), shutdown.clone());
    let addr: SocketAddr = format!("{bind}:{port}").parse()?;
    tracing::info!("syllabus serve listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown))
        .await?;
    tracing::info!("syllabus serve shut down");
    Ok(())
}

async fn shutdown_signal(shutdown: CancellationToken) {
    tokio::signal::ctrl_c().await.ok();
    shutdown.cancel();
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn list_plans(State(state): State<AppState>) -> ApiResult<Json<Vec<Plan>>> {
    Ok(Json(state.workbench.list_plans().await?))
}

async fn create_plan(
    State(state): State<AppState>,
    Json(form): Json<PlanForm>,
) -> ApiResult<(StatusCode, Json<PlanWithStats>)> {
    let created = state.workbench.create_plan(&form).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn get_plan(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<PlanWithStats>> {
    Ok(Json(state.workbench.get_plan_with_stats(id).await?))
}

async fn delete_plan(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<StatusCode> {
    state.workbench.delete_plan(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn triage(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Vec<TriageEntry>>> {
    let entries = state
        .workbench
        .triage(id)
        .await?
        .into_iter()
        .map(|schedule| TriageEntry {
            display: status::display(schedule.status),
            schedule,
        })
        .collect();
    Ok(Json(entries))
}

async fn batch_schedule(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<BatchRequest>,
) -> ApiResult<Json<BatchOperationResult>> {
    let cancel = state.shutdown.child_token();
    let result = state
        .workbench
        .batch_schedule(id, &request.operations, &cancel)
        .await?;
    Ok(Json(result))
}

async fn assign(
    state: &AppState,
    target: ParticipantTarget,
    form: &ParticipantForm,
) -> ApiResult<(StatusCode, Json<Participant>)> {
    let participant = state.workbench.assign_participant(target, form).await?;
    Ok((StatusCode::CREATED, Json(participant)))
}

async fn remove(
    state: &AppState,
    target: ParticipantTarget,
    participant_id: Uuid,
) -> ApiResult<Json<RemovedResponse>> {
    let removed = state
        .workbench
        .remove_participant(target, participant_id)
        .await?;
    Ok(Json(RemovedResponse { removed }))
}

async fn assign_to_plan(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(form): Json<ParticipantForm>,
) -> ApiResult<(StatusCode, Json<Participant>)> {
    assign(&state, ParticipantTarget::Plan(id), &form).await
}

async fn remove_from_plan(
    State(state): State<AppState>,
    Path((id, participant_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Json<RemovedResponse>> {
    remove(&state, ParticipantTarget::Plan(id), participant_id).await
}

async fn assign_to_schedule(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(form): Json<ParticipantForm>,
) -> ApiResult<(StatusCode, Json<Participant>)> {
    assign(&state, ParticipantTarget::Schedule(id), &form).await
}

async fn remove_from_schedule(
    State(state): State<AppState>,
    Path((id, participant_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Json<RemovedResponse>> {
    remove(&state, ParticipantTarget::Schedule(id), participant_id).await
}

async fn roster(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Vec<Participant>>> {
    Ok(Json(state.workbench.effective_roster(id).await?))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::{Value, json};
    use tokio_util::sync::CancellationToken;
    use tower::ServiceExt;

    use syllabus_core::Workbench;
    use syllabus_core::settings::Settings;
    use syllabus_db::store::{MemoryStore, PgStore, WorkbenchStore};
    use syllabus_test_utils::{create_test_db, drop_test_db};

    // -----------------------------------------------------------------------
    // HTTP helpers
    // -----------------------------------------------------------------------

    struct Api {
        workbench: Arc<Workbench>,
        shutdown: CancellationToken,
    }

    impl Api {
        fn over(store: Arc<dyn WorkbenchStore>) -> Self {
            Self {
                workbench: Arc::new(Workbench::new(store, Settings::default())),
                shutdown: CancellationToken::new(),
            }
        }

        fn memory() -> Self {
            Self::over(Arc::new(MemoryStore::new()))
        }

        async fn send(&self, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
            let app = super::build_router(self.workbench.clone(), self.shutdown.clone());
            let builder = Request::builder().method(method).uri(uri);
            let request = match body {
                Some(body) => builder
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
                None => builder.body(Body::empty()).unwrap(),
            };
            let response = app.oneshot(request).await.unwrap();
            let status = response.status();
            let bytes = axum::body::to_bytes(response.into_body(), 1_048_576)
                .await
                .unwrap();
            let json = if bytes.is_empty() {
                Value::Null
            } else {
                serde_json::from_slice(&bytes).unwrap()
            };
            (status, json)
        }

        async fn create_plan(&self) -> String {
            let (status, json) = self
                .send(
                    "POST",
                    "/api/plans",
                    Some(json!({ "title": "Thermodynamics", "owner": "registrar" })),
                )
                .await;
            assert_eq!(status, StatusCode::CREATED);
            json["plan"]["id"].as_str().unwrap().to_string()
        }
    }

    fn create_op(start: &str, end: &str) -> Value {
        json!({ "op": "create", "starts_at": start, "ends_at": end, "resource": "Hall A" })
    }

    // -----------------------------------------------------------------------
    // Tests
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn list_plans_empty() {
        let api = Api::memory();
        let (status, json) = api.send("GET", "/api/plans", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json, json!([]));
    }

    #[tokio::test]
    async fn create_and_fetch_plan() {
        let api = Api::memory();
        let id = api.create_plan().await;

        let (status, json) = api.send("GET", &format!("/api/plans/{id}"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["plan"]["title"], "Thermodynamics");
        assert_eq!(json["stats"]["total"], 0);
        assert_eq!(json["schedules"], json!([]));
    }

    #[tokio::test]
    async fn invalid_plan_is_unprocessable() {
        let api = Api::memory();
        let (status, json) = api
            .send("POST", "/api/plans", Some(json!({ "title": "  ", "owner": "x" })))
            .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(json["kind"], "validation_error");
    }

    #[tokio::test]
    async fn missing_plan_is_not_found() {
        let api = Api::memory();
        let uri = format!("/api/plans/{}", uuid::Uuid::new_v4());
        let (status, json) = api.send("GET", &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["kind"], "not_found");

        let (status, _) = api.send("DELETE", &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn batch_reports_each_item() {
        let api = Api::memory();
        let id = api.create_plan().await;

        let body = json!({
            "operations": [
                create_op("2026-10-14T09:00:00Z", "2026-10-14T10:00:00Z"),
                create_op("2026-10-14T11:00:00Z", "2026-10-14T10:30:00Z"),
            ]
        });
        let (status, json) = api
            .send("POST", &format!("/api/plans/{id}/schedules/batch"), Some(body))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["total"], 2);
        assert_eq!(json["succeeded"], 1);
        assert_eq!(json["failed"], 1);
        assert_eq!(json["items"][0]["outcome"], "success");
        assert_eq!(json["items"][1]["error_kind"], "validation_error");

        let (_, plan) = api.send("GET", &format!("/api/plans/{id}"), None).await;
        assert_eq!(plan["stats"]["counts"]["scheduled"], 1);
    }

    #[tokio::test]
    async fn batch_after_shutdown_is_cancelled() {
        let api = Api::memory();
        let id = api.create_plan().await;
        api.shutdown.cancel();

        let body = json!({
            "operations": [create_op("2026-10-14T09:00:00Z", "2026-10-14T10:00:00Z")]
        });
        let (status, json) = api
            .send("POST", &format!("/api/plans/{id}/schedules/batch"), Some(body))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["cancelled"], 1);
        assert_eq!(json["items"][0]["outcome"], "cancelled");
    }

    #[tokio::test]
    async fn duplicate_participant_conflicts() {
        let api = Api::memory();
        let id = api.create_plan().await;
        let uri = format!("/api/plans/{id}/participants");

        let (status, first) = api.send("POST", &uri, Some(json!({ "person": "kim" }))).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(first["level"], "plan");

        let (status, json) = api.send("POST", &uri, Some(json!({ "person": "kim" }))).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(json["kind"], "duplicate_participant");

        let pid = first["id"].as_str().unwrap();
        let (status, json) = api.send("DELETE", &format!("{uri}/{pid}"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["removed"], true);

        let (_, json) = api.send("DELETE", &format!("{uri}/{pid}"), None).await;
        assert_eq!(json["removed"], false);
    }

    #[tokio::test]
    async fn roster_and_triage() {
        let api = Api::memory();
        let id = api.create_plan().await;
        let body = json!({
            "operations": [create_op("2026-10-14T09:00:00Z", "2026-10-14T10:00:00Z")]
        });
        let (_, batch) = api
            .send("POST", &format!("/api/plans/{id}/schedules/batch"), Some(body))
            .await;
        let schedule_id = batch["items"][0]["created_id"].as_str().unwrap().to_string();

        api.send(
            "POST",
            &format!("/api/plans/{id}/participants"),
            Some(json!({ "person": "lee" })),
        )
        .await;
        let (status, _) = api
            .send(
                "POST",
                &format!("/api/schedules/{schedule_id}/participants"),
                Some(json!({ "person": "max" })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, roster) = api
            .send("GET", &format!("/api/schedules/{schedule_id}/roster"), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        let people: Vec<_> = roster
            .as_array()
            .unwrap()
            .iter()
            .map(|p| p["person"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(people, vec!["lee", "max"]);

        let (status, triage) = api.send("GET", &format!("/api/plans/{id}/triage"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(triage[0]["status"], "scheduled");
        assert_eq!(triage[0]["display"]["icon"], "calendar");
    }

    #[tokio::test]
    async fn postgres_round_trip() {
        let (pool, db_name) = create_test_db().await;
        let api = Api::over(Arc::new(PgStore::new(pool.clone())));

        let id = api.create_plan().await;
        let body = json!({
            "operations": [create_op("2026-10-14T09:00:00Z", "2026-10-14T10:00:00Z")]
        });
        let (status, json) = api
            .send("POST", &format!("/api/plans/{id}/schedules/batch"), Some(body))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["succeeded"], 1);

        let (status, _) = api.send("DELETE", &format!("/api/plans/{id}"), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (_, plans) = api.send("GET", "/api/plans", None).await;
        assert_eq!(plans, json!([]));

        pool.close().await;
        drop_test_db(&db_name).await;
    }
}
