use async_trait::async_trait;
use log::{debug, warn};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

use super::data_loader::SheetRow;
use crate::error::LookupError;

pub const DEFAULT_SHEET_TTL: Duration = Duration::from_secs(5 * 60);

/// Read-only access to the user's reference sheet.
#[async_trait]
pub trait SheetSource: Send + Sync {
    async fn rows(&self) -> Result<Arc<Vec<SheetRow>>, LookupError>;
}

/// Rows already in memory, e.g. loaded from a local CSV.
pub struct StaticSheet {
    rows: Arc<Vec<SheetRow>>,
}

impl StaticSheet {
    pub fn new(rows: Vec<SheetRow>) -> Self {
        Self { rows: Arc::new(rows) }
    }
}

#[async_trait]
impl SheetSource for StaticSheet {
    async fn rows(&self) -> Result<Arc<Vec<SheetRow>>, LookupError> {
        Ok(self.rows.clone())
    }
}

pub const DEFAULT_SHEET_RETRY: Duration = Duration::from_secs(30);

enum Loaded {
    Rows(Arc<Vec<SheetRow>>),
    Failed(String),
}

/// Keeps the last successful load of `inner` for `ttl`. A failed load is
/// remembered for `retry_after`, so lookups queued behind it get the same
/// failure instead of each repeating the load.
///
/// The lock is held across the load: concurrent callers wait for the one
/// load in flight and then read its outcome.
pub struct CachedSheet<S> {
    inner: S,
    ttl: Duration,
    retry_after: Duration,
    cached: Mutex<Option<(Instant, Loaded)>>,
}

impl<S: SheetSource> CachedSheet<S> {
    pub fn new(inner: S, ttl: Duration) -> Self {
        Self {
            inner,
            ttl,
            retry_after: DEFAULT_SHEET_RETRY,
            cached: Mutex::new(None),
        }
    }

    pub fn with_retry_after(mut self, retry_after: Duration) -> Self {
        self.retry_after = retry_after;
        self
    }
}

#[async_trait]
impl<S: SheetSource> SheetSource for CachedSheet<S> {
    async fn rows(&self) -> Result<Arc<Vec<SheetRow>>, LookupError> {
        let mut cached = self.cached.lock().await;
        if let Some((loaded_at, loaded)) = cached.as_ref() {
            match loaded {
                Loaded::Rows(rows) if loaded_at.elapsed() < self.ttl => return Ok(rows.clone()),
                Loaded::Failed(reason) if loaded_at.elapsed() < self.retry_after => {
                    return Err(LookupError::Sheet(reason.clone()));
                }
                _ => debug!("Reference sheet cache expired"),
            }
        }

        match self.inner.rows().await {
            Ok(rows) => {
                *cached = Some((Instant::now(), Loaded::Rows(rows.clone())));
                Ok(rows)
            }
            Err(e) => {
                warn!("Reference sheet load failed, retrying after {:?}: {}", self.retry_after, e);
                let reason = match &e {
                    LookupError::Sheet(reason) => reason.clone(),
                    other => other.to_string(),
                };
                *cached = Some((Instant::now(), Loaded::Failed(reason)));
                Err(e)
            }
        }
    }
}
