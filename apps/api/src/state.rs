use std::sync::Arc;

use crate::auth::{CredentialTable, SessionStore};
use crate::config::Config;
use crate::expiry::RecordSchemas;
use crate::source::RecordSource;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Pluggable record source. Default: `SheetsClient`.
    pub source: Arc<dyn RecordSource>,
    pub credentials: Arc<CredentialTable>,
    pub schemas: Arc<RecordSchemas>,
    pub sessions: SessionStore,
}
