use std::fmt::Write;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use chrono::format::{Item, StrftimeItems};
use chrono::NaiveDate;

use crate::auth::CredentialTable;
use crate::expiry::record::KindSchema;
use crate::expiry::settings::{DEFAULT_DISPLAY_FORMAT, DEFAULT_HORIZON_DAYS};
use crate::expiry::{DateFormats, ExpirySettings, RecordSchemas};
use crate::source::sheets::DEFAULT_SHEETS_API_BASE;

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub sheets_api_base: String,
    pub spreadsheet_id: String,
    pub sheets_api_token: String,
    pub credentials_path: PathBuf,
    pub record_schemas_path: Option<PathBuf>,
    pub expiry: ExpirySettings,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let require = |key: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .with_context(|| format!("Required environment variable '{key}' is not set"))
        };

        let accepted_date_formats = match lookup("ACCEPTED_DATE_FORMATS") {
            Some(raw) => DateFormats::from_delimited(&raw),
            None => DateFormats::default(),
        };
        if accepted_date_formats.is_empty() {
            bail!("ACCEPTED_DATE_FORMATS must list at least one format");
        }

        let horizon_days = match lookup("EXPIRY_HORIZON_DAYS") {
            Some(raw) => raw
                .trim()
                .parse::<u32>()
                .context("EXPIRY_HORIZON_DAYS must be a non-negative number of days")?,
            None => DEFAULT_HORIZON_DAYS,
        };

        let display_format =
            lookup("DATE_DISPLAY_FORMAT").unwrap_or_else(|| DEFAULT_DISPLAY_FORMAT.to_string());
        if StrftimeItems::new(&display_format).any(|item| matches!(item, Item::Error)) {
            bail!("DATE_DISPLAY_FORMAT '{display_format}' is not a valid strftime pattern");
        }
        // time and offset specifiers parse fine but cannot render a bare date
        let sample = NaiveDate::from_ymd_opt(2000, 1, 1).unwrap_or(NaiveDate::MIN);
        if write!(String::new(), "{}", sample.format(&display_format)).is_err() {
            bail!("DATE_DISPLAY_FORMAT '{display_format}' must only use date fields");
        }

        Ok(Config {
            sheets_api_base: lookup("SHEETS_API_BASE")
                .unwrap_or_else(|| DEFAULT_SHEETS_API_BASE.to_string()),
            spreadsheet_id: require("SHEETS_SPREADSHEET_ID")?,
            sheets_api_token: require("SHEETS_API_TOKEN")?,
            credentials_path: PathBuf::from(require("CREDENTIALS_PATH")?),
            record_schemas_path: lookup("RECORD_SCHEMAS_PATH")
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from),
            expiry: ExpirySettings {
                accepted_date_formats,
                horizon_days,
                display_format,
            },
            port: lookup("PORT")
                .unwrap_or_else(|| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: lookup("RUST_LOG").unwrap_or_else(|| "info".to_string()),
        })
    }

    pub fn load_credentials(&self) -> Result<CredentialTable> {
        let raw = std::fs::read_to_string(&self.credentials_path).with_context(|| {
            format!(
                "Failed to read credential table {}",
                self.credentials_path.display()
            )
        })?;
        let table = CredentialTable::from_json_str(&raw)?;
        if table.is_empty() {
            bail!("Credential table {} has no users", self.credentials_path.display());
        }
        Ok(table)
    }

    /// Built-in kind schemas, with any kinds named in the override file replaced.
    pub fn load_schemas(&self) -> Result<RecordSchemas> {
        let Some(path) = &self.record_schemas_path else {
            return Ok(RecordSchemas::default());
        };
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read record schemas {}", path.display()))?;
        let overrides: Vec<KindSchema> = serde_json::from_str(&raw)
            .with_context(|| format!("Invalid record schemas in {}", path.display()))?;
        Ok(RecordSchemas::with_overrides(overrides))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    use crate::auth::credentials::{entry, Role};
    use crate::expiry::RecordKind;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    const REQUIRED: &[(&str, &str)] = &[
        ("SHEETS_SPREADSHEET_ID", "sheet-1"),
        ("SHEETS_API_TOKEN", "token"),
        ("CREDENTIALS_PATH", "/etc/inspect/credentials.json"),
    ];

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup_from(REQUIRED)).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.expiry.horizon_days, 30);
        assert_eq!(config.expiry.display_format, "%Y-%m-%d");
        assert_eq!(config.expiry.accepted_date_formats, DateFormats::default());
        assert_eq!(config.sheets_api_base, DEFAULT_SHEETS_API_BASE);
        assert!(config.record_schemas_path.is_none());
    }

    #[test]
    fn test_missing_required_variable() {
        let err = Config::from_lookup(lookup_from(&REQUIRED[..2])).unwrap_err();
        assert!(err.to_string().contains("CREDENTIALS_PATH"));
    }

    #[test]
    fn test_expiry_overrides() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("EXPIRY_HORIZON_DAYS", "10"));
        pairs.push(("ACCEPTED_DATE_FORMATS", "%d/%m/%Y|%Y-%m-%d"));
        pairs.push(("DATE_DISPLAY_FORMAT", "%d-%b-%Y"));
        let config = Config::from_lookup(lookup_from(&pairs)).unwrap();

        assert_eq!(config.expiry.horizon_days, 10);
        assert_eq!(
            config.expiry.accepted_date_formats,
            DateFormats::new(["%d/%m/%Y", "%Y-%m-%d"])
        );
        assert_eq!(config.expiry.display_format, "%d-%b-%Y");
    }

    #[test]
    fn test_rejects_bad_horizon_and_empty_formats() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("EXPIRY_HORIZON_DAYS", "-3"));
        assert!(Config::from_lookup(lookup_from(&pairs)).is_err());

        let mut pairs = REQUIRED.to_vec();
        pairs.push(("ACCEPTED_DATE_FORMATS", " | "));
        assert!(Config::from_lookup(lookup_from(&pairs)).is_err());

        let mut pairs = REQUIRED.to_vec();
        pairs.push(("DATE_DISPLAY_FORMAT", "%Y-%Q"));
        assert!(Config::from_lookup(lookup_from(&pairs)).is_err());
    }

    #[test]
    fn test_rejects_display_format_with_time_fields() {
        for format in ["%Y-%m-%d %H:%M", "%d/%m/%Y %z", "%T"] {
            let mut pairs = REQUIRED.to_vec();
            pairs.push(("DATE_DISPLAY_FORMAT", format));
            let err = Config::from_lookup(lookup_from(&pairs)).unwrap_err();
            assert!(err.to_string().contains("date fields"), "{format}: {err}");
        }
    }

    #[test]
    fn test_env_example_parses() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/.env.example");
        let pairs: Vec<(String, String)> = dotenvy::from_path_iter(path)
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();
        let vars: HashMap<String, String> = pairs.into_iter().collect();

        assert_eq!(
            DateFormats::from_delimited(&vars["ACCEPTED_DATE_FORMATS"]),
            DateFormats::default()
        );

        let mut lookup: Vec<(&str, &str)> = vars
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .filter(|(_, v)| !v.is_empty())
            .collect();
        lookup.extend_from_slice(&REQUIRED[..2]);
        let config = Config::from_lookup(lookup_from(&lookup)).unwrap();
        assert_eq!(config.expiry.display_format, "%Y-%m-%d");
        assert_eq!(config.expiry.horizon_days, 30);
    }

    #[test]
    fn test_load_credentials_and_schemas_from_files() {
        let mut creds = tempfile::NamedTempFile::new().unwrap();
        let table = vec![entry("admin", Role::Admin, "pw")];
        write!(creds, "{}", serde_json::to_string(&table).unwrap()).unwrap();

        let mut schemas = tempfile::NamedTempFile::new().unwrap();
        write!(
            schemas,
            r#"[{{"kind":"permit","tab":"PTW 2025","date_fields":["Valid To"],"identifying_fields":["PTW No"]}}]"#
        )
        .unwrap();

        let mut config = Config::from_lookup(lookup_from(REQUIRED)).unwrap();
        config.credentials_path = creds.path().to_path_buf();
        config.record_schemas_path = Some(schemas.path().to_path_buf());

        let credentials = config.load_credentials().unwrap();
        assert!(credentials.verify("admin", "pw").is_some());

        let schemas = config.load_schemas().unwrap();
        assert_eq!(schemas.get(RecordKind::Permit).unwrap().tab, "PTW 2025");
        assert_eq!(
            schemas.get(RecordKind::HeavyVehicle).unwrap().tab,
            "Heavy Vehicles"
        );
    }

    #[test]
    fn test_empty_credential_table_rejected() {
        let mut creds = tempfile::NamedTempFile::new().unwrap();
        write!(creds, "[]").unwrap();
        let mut config = Config::from_lookup(lookup_from(REQUIRED)).unwrap();
        config.credentials_path = creds.path().to_path_buf();
        assert!(config.load_credentials().is_err());
    }
}
