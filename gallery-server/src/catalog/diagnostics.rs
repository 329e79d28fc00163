//! Read failure diagnostics
//!
//! Reads swallow backing-store failures; the last one is kept here so
//! `/health` can report it.

use chrono::{DateTime, Utc};
use gallery_common::Error;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

/// One swallowed read failure
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadDiagnostic {
    pub operation: String,
    pub kind: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Default)]
pub struct Diagnostics {
    last: Mutex<Option<ReadDiagnostic>>,
    count: AtomicU64,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, operation: &str, error: &Error) {
        tracing::warn!(
            operation,
            kind = error.kind(),
            error = %error,
            "Catalog read failed, serving empty result"
        );

        let diagnostic = ReadDiagnostic {
            operation: operation.to_string(),
            kind: error.kind().to_string(),
            message: error.to_string(),
            timestamp: Utc::now(),
        };
        *self.last.lock().unwrap_or_else(|e| e.into_inner()) = Some(diagnostic);
        self.count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn last(&self) -> Option<ReadDiagnostic> {
        self.last.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Failures recorded since process start
    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }
}
