use std::fmt::Write;

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::expiry::dates::ParsedDate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpiryStatus {
    Unset,
    Expired,
    ExpiringSoon,
    Valid,
}

impl ExpiryStatus {
    /// Plain label used in alert tables.
    pub fn label(&self) -> &'static str {
        match self {
            ExpiryStatus::Unset => "Not Set",
            ExpiryStatus::Expired => "Expired",
            ExpiryStatus::ExpiringSoon => "Expiring Soon",
            ExpiryStatus::Valid => "Valid",
        }
    }

    pub fn is_alert(&self) -> bool {
        matches!(self, ExpiryStatus::Expired | ExpiryStatus::ExpiringSoon)
    }

    /// Sort rank for alert lists: expired first.
    pub(crate) fn rank(&self) -> u8 {
        match self {
            ExpiryStatus::Expired => 0,
            ExpiryStatus::ExpiringSoon => 1,
            ExpiryStatus::Valid => 2,
            ExpiryStatus::Unset => 3,
        }
    }
}

/// Classifies `date` against `today`.
///
/// - unset                         → `Unset`
/// - `date < today`                → `Expired`
/// - `date <= today + horizon`     → `ExpiringSoon` (both ends inclusive)
/// - otherwise                     → `Valid`
pub fn classify(date: ParsedDate, today: NaiveDate, horizon_days: u32) -> ExpiryStatus {
    let Some(date) = date else {
        return ExpiryStatus::Unset;
    };

    if date < today {
        return ExpiryStatus::Expired;
    }

    match today.checked_add_days(Days::new(u64::from(horizon_days))) {
        Some(limit) if date > limit => ExpiryStatus::Valid,
        // horizon runs past the end of the calendar
        _ => ExpiryStatus::ExpiringSoon,
    }
}

/// Formats `date` with `display_format`, falling back to ISO when the pattern
/// needs fields a calendar date does not have (`%H`, `%z`, ...).
pub fn display_date(date: NaiveDate, display_format: &str) -> String {
    let mut shown = String::new();
    if write!(shown, "{}", date.format(display_format)).is_err() {
        return date.format("%Y-%m-%d").to_string();
    }
    shown
}

/// Display badge: status icon and label, with the date when one is set.
pub fn badge(date: ParsedDate, status: ExpiryStatus, display_format: &str) -> String {
    let Some(date) = date else {
        return "⚪ Not Set".to_string();
    };
    let shown = display_date(date, display_format);

    match status {
        ExpiryStatus::Unset => "⚪ Not Set".to_string(),
        ExpiryStatus::Expired => format!("🚨 Expired ({shown})"),
        ExpiryStatus::ExpiringSoon => format!("⚠️ Expires Soon ({shown})"),
        ExpiryStatus::Valid => format!("✅ Valid ({shown})"),
    }
}
