//! Remembers the last calendar day a safety tip was shown, so the tip appears at most once a day.

use chrono::NaiveDate;
use shora_core::{Result, ShoraError};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, warn};

const DATE_FORMAT: &str = "%Y-%m-%d";

pub trait TipLedger: Send + Sync {
    fn last_shown(&self) -> Result<Option<NaiveDate>>;

    fn record(&self, day: NaiveDate) -> Result<()>;

    /// Records `today` and returns true unless a tip was already shown today.
    fn claim(&self, today: NaiveDate) -> Result<bool> {
        if self.last_shown()? == Some(today) {
            debug!(%today, "daily tip already shown");
            return Ok(false);
        }
        self.record(today)?;
        Ok(true)
    }
}

/// Ledger stored as a single `YYYY-MM-DD` line.
#[derive(Debug, Clone)]
pub struct FileTipLedger {
    path: PathBuf,
}

impl FileTipLedger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TipLedger for FileTipLedger {
    fn last_shown(&self) -> Result<Option<NaiveDate>> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let line = content.trim();
        match NaiveDate::parse_from_str(line, DATE_FORMAT) {
            Ok(day) => Ok(Some(day)),
            Err(e) => {
                // an unreadable ledger only means the tip may show again
                warn!(path = %self.path.display(), error = %e, "ignoring corrupt tip ledger");
                Ok(None)
            }
        }
    }

    fn record(&self, day: NaiveDate) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| {
                    ShoraError::Ledger(format!("cannot create {}: {}", parent.display(), e))
                })?;
            }
        }
        fs::write(&self.path, format!("{}\n", day.format(DATE_FORMAT)))?;
        Ok(())
    }
}

/// In-process ledger.
#[derive(Debug, Default)]
pub struct MemoryTipLedger {
    day: Mutex<Option<NaiveDate>>,
}

impl MemoryTipLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_day(day: NaiveDate) -> Self {
        Self {
            day: Mutex::new(Some(day)),
        }
    }
}

impl TipLedger for MemoryTipLedger {
    fn last_shown(&self) -> Result<Option<NaiveDate>> {
        let day = self
            .day
            .lock()
            .map_err(|_| ShoraError::Ledger("tip ledger lock poisoned".to_string()))?;
        Ok(*day)
    }

    fn record(&self, day: NaiveDate) -> Result<()> {
        let mut slot = self
            .day
            .lock()
            .map_err(|_| ShoraError::Ledger("tip ledger lock poisoned".to_string()))?;
        *slot = Some(day);
        Ok(())
    }
}
