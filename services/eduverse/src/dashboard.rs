//! Web dashboard with JSON API endpoints

use std::sync::Arc;

use askama::Template;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use tower_http::trace::TraceLayer;

use crate::controller::DashboardController;
use crate::error::{EduverseError, Result};
use crate::model::{CreateOutcome, HealthStatus, Institution, Plan};
use crate::state::{DashboardState, FormState};

const HEALTH_PLACEHOLDER: &str = "…";

const WHY_EDUVERSE: [&str; 4] = [
    "Real-time attendance with QR, GPS and manual modes",
    "Automated invoices, UPI/wallet/card payments and reminders",
    "Online tests with auto-grading and analytics",
    "Parent alerts and receipts, teacher portal and audit logs",
];

/// Dashboard application state
#[derive(Clone)]
pub struct DashboardAppState {
    pub controller: Arc<DashboardController>,
}

/// Body of `POST /api/institutions`; missing fields fall back to the stored form
#[derive(Debug, Deserialize)]
pub struct CreateInstitutionRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub subdomain: Option<String>,
}

/// Build the dashboard axum router
pub fn build_router(controller: Arc<DashboardController>) -> Router {
    let app_state = DashboardAppState { controller };

    Router::new()
        .route("/", get(index_handler))
        .route("/api/state", get(state_handler))
        .route("/api/institutions", post(create_institution_handler))
        .route("/api/demo-setup", post(demo_setup_handler))
        .route("/api/refresh", post(refresh_handler))
        .route("/health", get(health_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}

fn error_response(err: &EduverseError) -> Response {
    let status = match err {
        EduverseError::NoInstitutions => StatusCode::CONFLICT,
        EduverseError::Cancelled => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::BAD_GATEWAY,
    };
    let body = match err {
        EduverseError::DemoSetup { step, source } => serde_json::json!({
            "step": step,
            "error": source.to_string(),
        }),
        other => serde_json::json!({ "error": other.to_string() }),
    };
    (status, Json(body)).into_response()
}

async fn create_institution_handler(
    State(app): State<DashboardAppState>,
    Json(request): Json<CreateInstitutionRequest>,
) -> Response {
    match app
        .controller
        .try_submit_form(request.name, request.subdomain)
        .await
    {
        None => (
            StatusCode::CONFLICT,
            Json(serde_json::json!({ "error": "An institution is already being created" })),
        )
            .into_response(),
        Some(Ok(CreateOutcome::Created { id })) => {
            (StatusCode::CREATED, Json(serde_json::json!({ "id": id }))).into_response()
        }
        Some(Ok(CreateOutcome::MissingIdentifier)) => {
            (StatusCode::OK, Json(serde_json::json!({ "id": null }))).into_response()
        }
        Some(Err(e)) => error_response(&e),
    }
}

async fn demo_setup_handler(State(app): State<DashboardAppState>) -> Response {
    match app.controller.demo_setup().await {
        Ok(report) => (StatusCode::OK, Json(report)).into_response(),
        Err(e) => error_response(&e),
    }
}

async fn refresh_handler(State(app): State<DashboardAppState>) -> Response {
    match app.controller.refresh_institutions().await {
        Ok(()) => {
            let count = app.controller.state().read().await.institutions.len();
            Json(serde_json::json!({ "institutions": count })).into_response()
        }
        Err(e) => error_response(&e),
    }
}

async fn state_handler(State(app): State<DashboardAppState>) -> impl IntoResponse {
    Json(app.controller.snapshot().await)
}

async fn health_handler() -> impl IntoResponse {
    "OK"
}

async fn index_handler(State(app): State<DashboardAppState>) -> Response {
    match render_index(&app.controller.snapshot().await) {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            tracing::error!("Rendering dashboard failed: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}

struct StatTile {
    label: &'static str,
    value: String,
}

struct StudentRow {
    id: String,
    name: String,
}

#[derive(Template)]
#[template(path = "dashboard.html")]
struct DashboardPage<'a> {
    stats: Vec<StatTile>,
    notice: Option<&'a str>,
    form: &'a FormState,
    loading: bool,
    institutions: &'a [Institution],
    students: Vec<StudentRow>,
    why: &'static [&'static str],
    plans: &'static [Plan],
}

fn health_field(state: &DashboardState, field: impl Fn(&HealthStatus) -> &str) -> String {
    state
        .health
        .as_ref()
        .map(field)
        .filter(|value| !value.is_empty())
        .unwrap_or(HEALTH_PLACEHOLDER)
        .to_string()
}

/// Render the dashboard page from a state snapshot
pub fn render_index(state: &DashboardState) -> Result<String> {
    let stats = vec![
        StatTile {
            label: "Backend",
            value: health_field(state, |h| h.backend.as_str()),
        },
        StatTile {
            label: "Database",
            value: health_field(state, |h| h.database.as_str()),
        },
        StatTile {
            label: "Collections",
            value: state.collections_count().to_string(),
        },
        StatTile {
            label: "Institutions",
            value: state.institutions.len().to_string(),
        },
    ];

    let students = state
        .students
        .iter()
        .map(|s| StudentRow {
            id: s.id().unwrap_or_else(|| "-".to_string()),
            name: s
                .get("name")
                .and_then(|v| v.as_str())
                .unwrap_or("-")
                .to_string(),
        })
        .collect();

    let page = DashboardPage {
        stats,
        notice: state.notice.as_deref(),
        form: &state.form,
        loading: state.loading,
        institutions: &state.institutions,
        students,
        why: &WHY_EDUVERSE,
        plans: &Plan::ALL,
    };
    page.render()
        .map_err(|e| EduverseError::Dashboard(format!("Rendering dashboard failed: {}", e)))
}
