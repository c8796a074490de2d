use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::auth::AdminUser;
use crate::dashboard::render::{render_all, render_kind, DashboardSection, KindReport};
use crate::errors::AppError;
use crate::expiry::{build_report, AlertReport, KindSchema, RecordKind};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct DashboardQuery {
    /// Pins the evaluation date; defaults to the local calendar date.
    pub today: Option<NaiveDate>,
}

impl DashboardQuery {
    fn today(&self) -> NaiveDate {
        self.today.unwrap_or_else(|| Local::now().date_naive())
    }
}

#[derive(Serialize)]
pub struct DashboardResponse {
    pub today: NaiveDate,
    pub horizon_days: u32,
    pub sections: Vec<DashboardSection>,
}

fn resolve_schema<'a>(state: &'a AppState, kind: &str) -> Result<&'a KindSchema, AppError> {
    let kind: RecordKind = kind.parse().map_err(AppError::NotFound)?;
    state
        .schemas
        .get(kind)
        .ok_or_else(|| AppError::NotFound(format!("No schema configured for {kind}")))
}

/// GET /api/v1/dashboard
pub async fn handle_dashboard(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Query(params): Query<DashboardQuery>,
) -> Json<DashboardResponse> {
    let today = params.today();
    debug!("{} requested the combined dashboard for {}", admin.username, today);
    let settings = &state.config.expiry;
    let sections = render_all(state.source.as_ref(), &state.schemas, today, settings).await;

    Json(DashboardResponse {
        today,
        horizon_days: settings.horizon_days,
        sections,
    })
}

/// GET /api/v1/dashboard/:kind
pub async fn handle_kind_dashboard(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(kind): Path<String>,
    Query(params): Query<DashboardQuery>,
) -> Result<Json<KindReport>, AppError> {
    let schema = resolve_schema(&state, &kind)?;
    debug!("{} requested the {} dashboard", admin.username, schema.kind);
    let report = render_kind(
        state.source.as_ref(),
        schema,
        params.today(),
        &state.config.expiry,
    )
    .await?;
    Ok(Json(report))
}

/// GET /api/v1/dashboard/:kind/alerts
pub async fn handle_kind_alerts(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(kind): Path<String>,
    Query(params): Query<DashboardQuery>,
) -> Result<Json<AlertReport>, AppError> {
    let schema = resolve_schema(&state, &kind)?;
    debug!("{} requested {} alerts", admin.username, schema.kind);
    let records = state.source.fetch(schema).await?;
    Ok(Json(build_report(
        &records,
        schema,
        params.today(),
        &state.config.expiry,
    )))
}
