use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::expiry::{KindSchema, Record, RecordKind};
use crate::source::{RecordSource, SourceError};

/// Test double: fixed rows per kind, optional forced failures, captured appends.
#[derive(Default)]
pub struct InMemorySource {
    records: HashMap<RecordKind, Vec<Record>>,
    failing: HashSet<RecordKind>,
    appended: RwLock<Vec<(RecordKind, Vec<String>)>>,
}

impl InMemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(mut self, kind: RecordKind, records: Vec<Record>) -> Self {
        self.records.insert(kind, records);
        self
    }

    pub fn failing(mut self, kind: RecordKind) -> Self {
        self.failing.insert(kind);
        self
    }

    fn offline(schema: &KindSchema) -> SourceError {
        SourceError::Api {
            status: 503,
            message: format!("tab '{}' offline", schema.tab),
        }
    }

    pub async fn appended(&self) -> Vec<(RecordKind, Vec<String>)> {
        self.appended.read().await.clone()
    }
}

#[async_trait]
impl RecordSource for InMemorySource {
    async fn fetch(&self, schema: &KindSchema) -> Result<Vec<Record>, SourceError> {
        if self.failing.contains(&schema.kind) {
            return Err(Self::offline(schema));
        }
        Ok(self.records.get(&schema.kind).cloned().unwrap_or_default())
    }

    async fn append(&self, schema: &KindSchema, row: Vec<String>) -> Result<(), SourceError> {
        if self.failing.contains(&schema.kind) {
            return Err(Self::offline(schema));
        }
        self.appended.write().await.push((schema.kind, row));
        Ok(())
    }
}
