//! Spreadsheet values API client. Reads whole tabs and appends single rows.
//!
//! Speaks the Google Sheets v4 `values` resource shape:
//! `{"values": [["header", ...], ["cell", ...], ...]}`.
//!
//! Tabs are read unformatted, so date-formatted cells arrive as serial day
//! numbers and are handed to the parser as native dates. Dates typed in as
//! plain text stay text.

use async_trait::async_trait;
use chrono::{Days, NaiveDate, NaiveTime};
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error};

use crate::expiry::{CellValue, KindSchema, Record};
use crate::source::{rows_to_records, RecordSource, SourceError};

pub const DEFAULT_SHEETS_API_BASE: &str = "https://sheets.googleapis.com/v4/spreadsheets";

/// Serial 2958465 is 9999-12-31.
const MAX_SERIAL_DATE: f64 = 2_958_466.0;

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

#[derive(Debug, Serialize)]
struct AppendBody {
    values: Vec<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct SheetsError {
    error: SheetsErrorBody,
}

#[derive(Debug, Deserialize)]
struct SheetsErrorBody {
    message: String,
}

#[derive(Clone)]
pub struct SheetsClient {
    client: Client,
    base_url: String,
    spreadsheet_id: String,
    token: String,
}

impl SheetsClient {
    pub fn new(base_url: String, spreadsheet_id: String, token: String) -> Result<Self, SourceError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()?;
        Ok(Self {
            client,
            base_url,
            spreadsheet_id,
            token,
        })
    }

    /// `{base}/{spreadsheet_id}/values/{segment}` with each part percent-encoded.
    fn values_url(&self, segment: &str) -> Result<Url, SourceError> {
        let mut url =
            Url::parse(&self.base_url).map_err(|e| SourceError::InvalidUrl(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| SourceError::InvalidUrl(self.base_url.clone()))?
            .pop_if_empty()
            .push(&self.spreadsheet_id)
            .push("values")
            .push(segment);
        Ok(url)
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, SourceError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<SheetsError>(&body)
            .map(|e| e.error.message)
            .unwrap_or(body);
        error!("Sheets API returned {}: {}", status, message);
        Err(SourceError::Api {
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl RecordSource for SheetsClient {
    async fn fetch(&self, schema: &KindSchema) -> Result<Vec<Record>, SourceError> {
        let mut url = self.values_url(&schema.tab)?;
        url.query_pairs_mut()
            .append_pair("valueRenderOption", "UNFORMATTED_VALUE")
            .append_pair("dateTimeRenderOption", "SERIAL_NUMBER");
        let response = self
            .client
            .get(url)
            .bearer_auth(&self.token)
            .send()
            .await?;
        let range: ValueRange = Self::check(response).await?.json().await?;

        let records = rows_to_records(decode_rows(range.values, schema));
        debug!("Fetched {} rows from tab '{}'", records.len(), schema.tab);
        Ok(records)
    }

    async fn append(&self, schema: &KindSchema, row: Vec<String>) -> Result<(), SourceError> {
        let mut url = self.values_url(&format!("{}:append", schema.tab))?;
        url.query_pairs_mut()
            .append_pair("valueInputOption", "USER_ENTERED");

        let response = self
            .client
            .post(url)
            .bearer_auth(&self.token)
            .json(&AppendBody { values: vec![row] })
            .send()
            .await?;
        Self::check(response).await?;
        debug!("Appended row to tab '{}'", schema.tab);
        Ok(())
    }
}

/// Decodes the header row, then each data row with the schema's date columns
/// marked so their serial numbers become dates.
fn decode_rows(values: Vec<Vec<Value>>, schema: &KindSchema) -> Vec<Vec<CellValue>> {
    let mut values = values.into_iter();
    let Some(header) = values.next() else {
        return Vec::new();
    };
    let header: Vec<CellValue> = header.iter().map(|v| cell_from_json(v, false)).collect();
    let date_columns: Vec<bool> = header
        .iter()
        .map(|h| schema.is_date_field(&h.as_text()))
        .collect();

    let rows = values.map(|row| {
        row.iter()
            .enumerate()
            .map(|(i, v)| cell_from_json(v, date_columns.get(i).copied().unwrap_or(false)))
            .collect()
    });
    std::iter::once(header).chain(rows).collect()
}

/// Sheets cells arrive as JSON scalars. Numbers in date columns are serial
/// dates; every other scalar is kept as text.
fn cell_from_json(value: &Value, date_column: bool) -> CellValue {
    match value {
        Value::Null => CellValue::Empty,
        Value::String(s) => CellValue::from(s.as_str()),
        Value::Number(n) if date_column => n
            .as_f64()
            .and_then(serial_date)
            .unwrap_or_else(|| CellValue::Text(n.to_string())),
        other => CellValue::Text(other.to_string()),
    }
}

/// Spreadsheet serial number (days since 1899-12-30, fraction = time of day).
fn serial_date(serial: f64) -> Option<CellValue> {
    if !(0.0..MAX_SERIAL_DATE).contains(&serial) {
        return None;
    }
    let days = serial.trunc();
    let date = NaiveDate::from_ymd_opt(1899, 12, 30)?.checked_add_days(Days::new(days as u64))?;
    let seconds = (((serial - days) * 86_400.0).round() as u32).min(86_399);
    if seconds == 0 {
        return Some(CellValue::from(date));
    }
    let time = NaiveTime::from_num_seconds_from_midnight_opt(seconds, 0)?;
    Some(CellValue::from(date.and_time(time)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base: &str) -> SheetsClient {
        SheetsClient::new(base.to_string(), "sheet-123".to_string(), "t".to_string()).unwrap()
    }

    #[test]
    fn test_values_url_encodes_tab() {
        let url = client("https://sheets.example.com/v4/spreadsheets")
            .values_url("Heavy Vehicles")
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://sheets.example.com/v4/spreadsheets/sheet-123/values/Heavy%20Vehicles"
        );
    }

    #[test]
    fn test_values_url_tolerates_trailing_slash() {
        let url = client("https://sheets.example.com/v4/spreadsheets/")
            .values_url("Permits:append")
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://sheets.example.com/v4/spreadsheets/sheet-123/values/Permits:append"
        );
    }

    #[test]
    fn test_values_url_rejects_garbage_base() {
        assert!(matches!(
            client("not a url").values_url("Permits"),
            Err(SourceError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_cell_from_json() {
        assert_eq!(cell_from_json(&Value::Null, false), CellValue::Empty);
        assert_eq!(cell_from_json(&serde_json::json!(""), true), CellValue::Empty);
        assert_eq!(
            cell_from_json(&serde_json::json!("05-Jan-2025"), true),
            CellValue::Text("05-Jan-2025".to_string())
        );
        assert_eq!(
            cell_from_json(&serde_json::json!(42), false),
            CellValue::Text("42".to_string())
        );
    }

    #[test]
    fn test_serial_numbers_in_date_columns_become_dates() {
        let date = NaiveDate::from_ymd_opt(2025, 6, 10).unwrap();
        assert_eq!(
            cell_from_json(&serde_json::json!(45818), true),
            CellValue::Date(date)
        );
        assert_eq!(
            cell_from_json(&serde_json::json!(45818.5), true),
            CellValue::DateTime(date.and_hms_opt(12, 0, 0).unwrap())
        );
        assert_eq!(
            cell_from_json(&serde_json::json!(-1), true),
            CellValue::Text("-1".to_string())
        );
    }

    #[test]
    fn test_decode_rows_marks_only_date_columns() {
        let schema = crate::expiry::KindSchema::default_for(crate::expiry::RecordKind::Permit);
        let values = serde_json::from_str::<ValueRange>(
            r#"{"values":[["Permit No","permit expiry DATE"],[45818,45818],["PTW-2"]]}"#,
        )
        .unwrap()
        .values;

        let rows = decode_rows(values, &schema);

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[1][0], CellValue::Text("45818".to_string()));
        assert_eq!(
            rows[1][1],
            CellValue::Date(NaiveDate::from_ymd_opt(2025, 6, 10).unwrap())
        );
        assert_eq!(rows[2], vec![CellValue::Text("PTW-2".to_string())]);
        assert!(decode_rows(Vec::new(), &schema).is_empty());
    }

    #[test]
    fn test_value_range_missing_values_is_empty() {
        let range: ValueRange = serde_json::from_str(r#"{"range":"Permits!A1:Z1000"}"#).unwrap();
        assert!(range.values.is_empty());
    }
}
