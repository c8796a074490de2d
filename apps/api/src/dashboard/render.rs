use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::expiry::{
    badge_table, build_report, AlertReport, BadgeTable, ExpirySettings, KindSchema, RecordKind,
    RecordSchemas,
};
use crate::source::{RecordSource, SourceError};

/// Everything the dashboard shows for one record kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KindReport {
    #[serde(flatten)]
    pub report: AlertReport,
    pub table: BadgeTable,
}

/// One dashboard tab. Exactly one of `report` / `error` is set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardSection {
    pub kind: RecordKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<KindReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Fetches a fresh snapshot and classifies it. A fetch failure returns
/// before any aggregation runs.
pub async fn render_kind(
    source: &dyn RecordSource,
    schema: &KindSchema,
    today: NaiveDate,
    settings: &ExpirySettings,
) -> Result<KindReport, SourceError> {
    let records = source.fetch(schema).await?;

    let report = build_report(&records, schema, today, settings);
    let table = badge_table(&records, schema, today, settings);

    info!(
        "Rendered {}: {} records, {} expired, {} expiring within {} days",
        schema.kind,
        report.summary.total,
        report.summary.expired,
        report.summary.expiring_soon,
        settings.horizon_days
    );

    Ok(KindReport { report, table })
}

/// Renders every configured kind in turn. A failing kind becomes an error
/// section; the others still render.
pub async fn render_all(
    source: &dyn RecordSource,
    schemas: &RecordSchemas,
    today: NaiveDate,
    settings: &ExpirySettings,
) -> Vec<DashboardSection> {
    let mut sections = Vec::new();
    for schema in schemas.iter() {
        let section = match render_kind(source, schema, today, settings).await {
            Ok(report) => DashboardSection {
                kind: schema.kind,
                report: Some(report),
                error: None,
            },
            Err(e) => {
                error!("Skipping {} section: {e}", schema.kind);
                DashboardSection {
                    kind: schema.kind,
                    report: None,
                    error: Some(format!("Could not load {} records: {e}", schema.tab)),
                }
            }
        };
        sections.push(section);
    }
    sections
}
