use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::expiry::dates::{parse_date, ParsedDate};
use crate::expiry::settings::DateFormats;

/// A raw spreadsheet cell as handed over by a record source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CellValue {
    Empty,
    Text(String),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
}

impl CellValue {
    /// Display text for tables. Native dates use ISO formatting.
    pub fn as_text(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::Text(s) => s.clone(),
            CellValue::Date(d) => d.format("%Y-%m-%d").to_string(),
            CellValue::DateTime(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }

    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        if s.is_empty() {
            CellValue::Empty
        } else {
            CellValue::Text(s.to_string())
        }
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        if s.is_empty() {
            CellValue::Empty
        } else {
            CellValue::Text(s)
        }
    }
}

impl From<NaiveDate> for CellValue {
    fn from(d: NaiveDate) -> Self {
        CellValue::Date(d)
    }
}

impl From<NaiveDateTime> for CellValue {
    fn from(dt: NaiveDateTime) -> Self {
        CellValue::DateTime(dt)
    }
}

/// Header normalization used for every column lookup: trimmed, lowercased,
/// inner whitespace collapsed. Header casing drifted across sheet revisions.
pub fn normalize_header(header: &str) -> String {
    header
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// One spreadsheet row: ordered header → cell pairs, exactly as fetched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    cells: Vec<(String, CellValue)>,
}

impl Record {
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<CellValue>,
    {
        Self {
            cells: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Case-insensitive, whitespace-tolerant column lookup. First match wins.
    pub fn get(&self, field: &str) -> Option<&CellValue> {
        let wanted = normalize_header(field);
        self.cells
            .iter()
            .find(|(header, _)| normalize_header(header) == wanted)
            .map(|(_, value)| value)
    }

    pub fn cells(&self) -> impl Iterator<Item = (&str, &CellValue)> {
        self.cells.iter().map(|(h, v)| (h.as_str(), v))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    Observation,
    Permit,
    HeavyEquipment,
    HeavyVehicle,
}

impl RecordKind {
    pub const ALL: [RecordKind; 4] = [
        RecordKind::Observation,
        RecordKind::Permit,
        RecordKind::HeavyEquipment,
        RecordKind::HeavyVehicle,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKind::Observation => "observation",
            RecordKind::Permit => "permit",
            RecordKind::HeavyEquipment => "heavy_equipment",
            RecordKind::HeavyVehicle => "heavy_vehicle",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase().replace('-', "_");
        RecordKind::ALL
            .into_iter()
            .find(|k| k.as_str() == wanted)
            .ok_or_else(|| format!("unknown record kind '{s}'"))
    }
}

/// Which columns of a kind's sheet carry expiry dates and which label a row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KindSchema {
    pub kind: RecordKind,
    /// Worksheet (tab) name in the spreadsheet.
    pub tab: String,
    pub date_fields: Vec<String>,
    pub identifying_fields: Vec<String>,
    /// Columns a submission must fill in. Their position in the appended row
    /// comes from `form_columns`, not from this list.
    #[serde(default)]
    pub required_fields: Vec<String>,
    /// Sheet columns after the timestamp and submitter, in sheet order.
    /// Empty means identifying, required, then date fields.
    #[serde(default)]
    pub columns: Vec<String>,
}

impl KindSchema {
    pub fn default_for(kind: RecordKind) -> Self {
        fn owned(fields: &[&str]) -> Vec<String> {
            fields.iter().map(|f| f.to_string()).collect()
        }

        match kind {
            RecordKind::Observation => Self {
                kind,
                tab: "Observations".to_string(),
                date_fields: owned(&["Target Closure date"]),
                identifying_fields: owned(&["Site", "Observation Type", "Reported By"]),
                required_fields: owned(&[
                    "Site",
                    "Observation Type",
                    "Reported By",
                    "Description",
                    "Target Closure date",
                ]),
                columns: owned(&[
                    "Site",
                    "Observation Type",
                    "Reported By",
                    "Description",
                    "Target Closure date",
                ]),
            },
            RecordKind::Permit => Self {
                kind,
                tab: "Permits".to_string(),
                date_fields: owned(&["Permit Expiry date"]),
                identifying_fields: owned(&["Permit No", "Permit Type", "Site"]),
                required_fields: owned(&[
                    "Permit No",
                    "Permit Type",
                    "Site",
                    "Issued To",
                    "Permit Expiry date",
                ]),
                columns: owned(&[
                    "Permit No",
                    "Permit Type",
                    "Site",
                    "Issued To",
                    "Permit Expiry date",
                ]),
            },
            RecordKind::HeavyEquipment => Self {
                kind,
                tab: "Heavy Equipment".to_string(),
                date_fields: owned(&[
                    "T.P Expiry date",
                    "Insurance expiry date",
                    "Operator Licence Expiry",
                ]),
                identifying_fields: owned(&["Equipment Type", "Asset No", "Owner"]),
                required_fields: owned(&[
                    "Equipment Type",
                    "Asset No",
                    "Owner",
                    "T.P Expiry date",
                    "Insurance expiry date",
                ]),
                columns: owned(&[
                    "Equipment Type",
                    "Asset No",
                    "Owner",
                    "T.P Expiry date",
                    "Insurance expiry date",
                    "Operator Licence Expiry",
                ]),
            },
            RecordKind::HeavyVehicle => Self {
                kind,
                tab: "Heavy Vehicles".to_string(),
                date_fields: owned(&[
                    "T.P Expiry date",
                    "Insurance expiry date",
                    "MVPI Expiry date",
                    "Licence Expiry",
                ]),
                identifying_fields: owned(&["Vehicle Type", "Plate No", "Owner"]),
                required_fields: owned(&[
                    "Vehicle Type",
                    "Plate No",
                    "Owner",
                    "Insurance expiry date",
                    "MVPI Expiry date",
                ]),
                columns: owned(&[
                    "Vehicle Type",
                    "Plate No",
                    "Owner",
                    "T.P Expiry date",
                    "Insurance expiry date",
                    "MVPI Expiry date",
                    "Licence Expiry",
                ]),
            },
        }
    }

    /// Columns a submitted row is written in. Required and date fields missing
    /// from `columns` are appended so nothing a form can carry is dropped.
    pub fn form_columns(&self) -> Vec<&str> {
        let mut seen = std::collections::HashSet::new();
        self.columns
            .iter()
            .chain(&self.identifying_fields)
            .chain(&self.required_fields)
            .chain(&self.date_fields)
            .filter(|c| seen.insert(normalize_header(c)))
            .map(String::as_str)
            .collect()
    }

    /// True when `header` names one of this kind's date columns.
    pub fn is_date_field(&self, header: &str) -> bool {
        let wanted = normalize_header(header);
        self.date_fields
            .iter()
            .any(|f| normalize_header(f) == wanted)
    }
}

/// Per-kind schemas, loaded once at startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordSchemas(Vec<KindSchema>);

impl RecordSchemas {
    /// Built-in schemas, overridden kind-by-kind by `overrides`.
    pub fn with_overrides(overrides: Vec<KindSchema>) -> Self {
        let mut schemas = Self::default();
        for schema in overrides {
            match schemas.0.iter_mut().find(|s| s.kind == schema.kind) {
                Some(slot) => *slot = schema,
                None => schemas.0.push(schema),
            }
        }
        schemas
    }

    pub fn get(&self, kind: RecordKind) -> Option<&KindSchema> {
        self.0.iter().find(|s| s.kind == kind)
    }

    pub fn iter(&self) -> impl Iterator<Item = &KindSchema> {
        self.0.iter()
    }
}

impl Default for RecordSchemas {
    fn default() -> Self {
        Self(RecordKind::ALL.into_iter().map(KindSchema::default_for).collect())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackedDate {
    /// Field name as configured in the schema (not as spelled in the sheet).
    pub field: String,
    pub date: ParsedDate,
}

/// Strongly-typed view of a record: identity labels plus parsed expiry dates.
/// Built once at the boundary so classification never touches raw cells.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackedRecord {
    /// Zero-based data row index (header excluded).
    pub row: usize,
    /// Values aligned with `KindSchema::identifying_fields`; missing → "".
    pub identity: Vec<String>,
    /// Only the configured date fields present on the record.
    pub dates: Vec<TrackedDate>,
}

impl TrackedRecord {
    pub fn extract(row: usize, record: &Record, schema: &KindSchema, formats: &DateFormats) -> Self {
        let identity = schema
            .identifying_fields
            .iter()
            .map(|f| {
                record
                    .get(f)
                    .map(|v| v.as_text().trim().to_string())
                    .unwrap_or_default()
            })
            .collect();

        let dates = schema
            .date_fields
            .iter()
            .filter_map(|f| {
                record.get(f).map(|value| TrackedDate {
                    field: f.clone(),
                    date: parse_date(value, formats),
                })
            })
            .collect();

        Self {
            row,
            identity,
            dates,
        }
    }
}
