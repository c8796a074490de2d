use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::expiry::dates::parse_date;
use crate::expiry::record::{normalize_header, KindSchema, Record, RecordKind, TrackedRecord};
use crate::expiry::settings::ExpirySettings;
use crate::expiry::status::{badge, classify, display_date, ExpiryStatus};

/// One record + date field combination that is expired or about to be.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertEntry {
    pub row: usize,
    /// Aligned with `AlertReport::identifying_fields`.
    pub identity: Vec<String>,
    /// Field name with trailing "date"/"expiry" stripped, e.g. "Insurance".
    pub document_type: String,
    pub field: String,
    pub date: NaiveDate,
    pub expiry_date: String,
    pub status: ExpiryStatus,
    pub status_label: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertSummary {
    pub total: usize,
    /// Records with at least one expired field.
    pub expired: usize,
    /// Records with at least one field expiring within the horizon.
    pub expiring_soon: usize,
}

/// Per-field status counts for bar/pie charts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldTally {
    pub field: String,
    pub document_type: String,
    pub expired: usize,
    pub expiring_soon: usize,
    pub valid: usize,
    pub unset: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertReport {
    pub kind: RecordKind,
    pub today: NaiveDate,
    pub horizon_days: u32,
    pub identifying_fields: Vec<String>,
    pub alerts: Vec<AlertEntry>,
    pub summary: AlertSummary,
    pub tallies: Vec<FieldTally>,
}

/// Full record table with each date column rendered as a badge.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BadgeTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

const TRAILING_NOISE: &[&str] = &["date", "expiry"];

/// Strips trailing "date"/"expiry" tokens: "T.P Expiry date" → "T.P".
/// A name made only of such tokens keeps its first one.
pub fn humanize_field(field: &str) -> String {
    let mut tokens: Vec<&str> = field.split_whitespace().collect();
    while tokens.len() > 1
        && tokens
            .last()
            .is_some_and(|t| TRAILING_NOISE.contains(&t.to_lowercase().as_str()))
    {
        tokens.pop();
    }
    tokens.join(" ")
}

pub fn track_records(
    records: &[Record],
    schema: &KindSchema,
    settings: &ExpirySettings,
) -> Vec<TrackedRecord> {
    records
        .iter()
        .enumerate()
        .map(|(row, record)| {
            TrackedRecord::extract(row, record, schema, &settings.accepted_date_formats)
        })
        .collect()
}

/// Alert rows sorted expired-first, then by date; ties keep row/field order.
pub fn collect_alerts(
    tracked: &[TrackedRecord],
    today: NaiveDate,
    settings: &ExpirySettings,
) -> Vec<AlertEntry> {
    let mut alerts: Vec<AlertEntry> = tracked
        .iter()
        .flat_map(|record| {
            record.dates.iter().filter_map(move |tracked_date| {
                let date = tracked_date.date?;
                let status = classify(Some(date), today, settings.horizon_days);
                status.is_alert().then(|| AlertEntry {
                    row: record.row,
                    identity: record.identity.clone(),
                    document_type: humanize_field(&tracked_date.field),
                    field: tracked_date.field.clone(),
                    date,
                    expiry_date: display_date(date, &settings.display_format),
                    status,
                    status_label: status.label().to_string(),
                })
            })
        })
        .collect();

    alerts.sort_by(|a, b| {
        a.status
            .rank()
            .cmp(&b.status.rank())
            .then_with(|| a.date.cmp(&b.date))
    });
    alerts
}

/// Record-level counts: a record with several expired fields counts once.
pub fn summarize(tracked: &[TrackedRecord], today: NaiveDate, horizon_days: u32) -> AlertSummary {
    let mut summary = AlertSummary {
        total: tracked.len(),
        ..AlertSummary::default()
    };

    for record in tracked {
        let statuses: Vec<ExpiryStatus> = record
            .dates
            .iter()
            .map(|d| classify(d.date, today, horizon_days))
            .collect();
        if statuses.contains(&ExpiryStatus::Expired) {
            summary.expired += 1;
        }
        if statuses.contains(&ExpiryStatus::ExpiringSoon) {
            summary.expiring_soon += 1;
        }
    }
    summary
}

/// Status counts per configured date field, in schema order. Records that
/// lack the column entirely are not counted for it.
pub fn tally_by_field(
    tracked: &[TrackedRecord],
    schema: &KindSchema,
    today: NaiveDate,
    horizon_days: u32,
) -> Vec<FieldTally> {
    schema
        .date_fields
        .iter()
        .map(|field| {
            let mut tally = FieldTally {
                field: field.clone(),
                document_type: humanize_field(field),
                expired: 0,
                expiring_soon: 0,
                valid: 0,
                unset: 0,
            };
            let dates = tracked
                .iter()
                .flat_map(|r| r.dates.iter())
                .filter(|d| &d.field == field);
            for d in dates {
                match classify(d.date, today, horizon_days) {
                    ExpiryStatus::Expired => tally.expired += 1,
                    ExpiryStatus::ExpiringSoon => tally.expiring_soon += 1,
                    ExpiryStatus::Valid => tally.valid += 1,
                    ExpiryStatus::Unset => tally.unset += 1,
                }
            }
            tally
        })
        .collect()
}

/// Parses and classifies one snapshot of records. Pure: same inputs, same report.
pub fn build_report(
    records: &[Record],
    schema: &KindSchema,
    today: NaiveDate,
    settings: &ExpirySettings,
) -> AlertReport {
    let tracked = track_records(records, schema, settings);

    AlertReport {
        kind: schema.kind,
        today,
        horizon_days: settings.horizon_days,
        identifying_fields: schema.identifying_fields.clone(),
        alerts: collect_alerts(&tracked, today, settings),
        summary: summarize(&tracked, today, settings.horizon_days),
        tallies: tally_by_field(&tracked, schema, today, settings.horizon_days),
    }
}

/// Every record as display text, with configured date columns swapped for
/// badges. Columns are the union of headers in first-seen order.
pub fn badge_table(
    records: &[Record],
    schema: &KindSchema,
    today: NaiveDate,
    settings: &ExpirySettings,
) -> BadgeTable {
    let mut columns: Vec<String> = Vec::new();
    let mut seen: Vec<String> = Vec::new();
    for record in records {
        for (header, _) in record.cells() {
            let key = normalize_header(header);
            if !seen.contains(&key) {
                seen.push(key);
                columns.push(header.trim().to_string());
            }
        }
    }

    let rows = records
        .iter()
        .map(|record| {
            columns
                .iter()
                .map(|column| {
                    let cell = record.get(column);
                    if schema.is_date_field(column) {
                        let date =
                            cell.and_then(|v| parse_date(v, &settings.accepted_date_formats));
                        let status = classify(date, today, settings.horizon_days);
                        badge(date, status, &settings.display_format)
                    } else {
                        cell.map(|v| v.as_text()).unwrap_or_default()
                    }
                })
                .collect()
        })
        .collect();

    BadgeTable { columns, rows }
}
