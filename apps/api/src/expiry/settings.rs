use serde::{Deserialize, Serialize};

/// Formats tried, in order, when no override is configured.
pub const DEFAULT_DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d-%b-%Y", "%d/%m/%Y", "%d %B %Y"];
pub const DEFAULT_DISPLAY_FORMAT: &str = "%Y-%m-%d";
pub const DEFAULT_HORIZON_DAYS: u32 = 30;

/// Ordered list of accepted textual date formats (chrono `strftime` syntax).
/// Earlier entries win when an input matches more than one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DateFormats(Vec<String>);

impl DateFormats {
    pub fn new<I, S>(formats: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(formats.into_iter().map(Into::into).collect())
    }

    /// Parses a `|`-separated list, skipping blank segments.
    pub fn from_delimited(raw: &str) -> Self {
        Self::new(
            raw.split('|')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string),
        )
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for DateFormats {
    fn default() -> Self {
        Self::new(DEFAULT_DATE_FORMATS.iter().copied())
    }
}

/// Knobs for the parse → classify → badge pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpirySettings {
    pub accepted_date_formats: DateFormats,
    /// Days past today still counted as "expiring soon".
    pub horizon_days: u32,
    pub display_format: String,
}

impl Default for ExpirySettings {
    fn default() -> Self {
        Self {
            accepted_date_formats: DateFormats::default(),
            horizon_days: DEFAULT_HORIZON_DAYS,
            display_format: DEFAULT_DISPLAY_FORMAT.to_string(),
        }
    }
}
