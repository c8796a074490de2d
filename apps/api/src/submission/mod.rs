//! Form submissions: validate a filled-in form and append it as a sheet row.
//!
//! Row layout: `[timestamp, submitted_by, form columns in sheet order...]`.
//! Optional columns left out of the form are written as empty cells.

use std::collections::HashMap;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::auth::CurrentUser;
use crate::errors::AppError;
use crate::expiry::dates::parse_date_str;
use crate::expiry::record::normalize_header;
use crate::expiry::{ExpirySettings, KindSchema, RecordKind};
use crate::state::AppState;

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Deserialize)]
pub struct SubmissionRequest {
    pub fields: HashMap<String, String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SubmissionResponse {
    pub kind: RecordKind,
    pub submitted_at: String,
    pub row: Vec<String>,
}

/// Submitted values keyed by normalized header. Two keys that only differ in
/// case or spacing are rejected rather than picking one at random.
fn normalize_fields(fields: &HashMap<String, String>) -> Result<HashMap<String, &str>, AppError> {
    let mut keys: Vec<&String> = fields.keys().collect();
    keys.sort();

    let mut normalized = HashMap::with_capacity(keys.len());
    for key in keys {
        let value = fields[key].trim();
        if normalized.insert(normalize_header(key), value).is_some() {
            return Err(AppError::Validation(format!(
                "'{}' was submitted more than once",
                key.trim()
            )));
        }
    }
    Ok(normalized)
}

/// Builds the row to append, or explains what the form is missing.
pub fn build_row(
    schema: &KindSchema,
    fields: &HashMap<String, String>,
    submitted_by: &str,
    now: NaiveDateTime,
    settings: &ExpirySettings,
) -> Result<Vec<String>, AppError> {
    let fields = normalize_fields(fields)?;
    let lookup = |name: &str| {
        fields
            .get(&normalize_header(name))
            .copied()
            .filter(|v| !v.is_empty())
    };

    let blank: Vec<&str> = schema
        .required_fields
        .iter()
        .filter(|f| lookup(f).is_none())
        .map(String::as_str)
        .collect();
    if !blank.is_empty() {
        return Err(AppError::Validation(format!(
            "Please fill out all fields: {}",
            blank.join(", ")
        )));
    }

    let mut row = vec![now.format(TIMESTAMP_FORMAT).to_string(), submitted_by.to_string()];
    for column in schema.form_columns() {
        let value = lookup(column).unwrap_or_default();
        if !value.is_empty()
            && schema.is_date_field(column)
            && parse_date_str(value, &settings.accepted_date_formats).is_none()
        {
            return Err(AppError::Validation(format!(
                "'{column}' is not a recognised date: {value}"
            )));
        }
        row.push(value.to_string());
    }
    Ok(row)
}

/// POST /api/v1/records/:kind
pub async fn handle_submit(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(kind): Path<String>,
    Json(req): Json<SubmissionRequest>,
) -> Result<(StatusCode, Json<SubmissionResponse>), AppError> {
    let kind: RecordKind = kind.parse().map_err(AppError::NotFound)?;
    let schema = state
        .schemas
        .get(kind)
        .ok_or_else(|| AppError::NotFound(format!("No schema configured for {kind}")))?;

    let now = Local::now().naive_local();
    let row = build_row(
        schema,
        &req.fields,
        &user.principal.username,
        now,
        &state.config.expiry,
    )?;
    state.source.append(schema, row.clone()).await?;
    info!("{} submitted a {} record", user.principal.username, kind);

    Ok((
        StatusCode::CREATED,
        Json(SubmissionResponse {
            kind,
            submitted_at: row[0].clone(),
            row,
        }),
    ))
}
