//! Cosmetic token ledger, durable across invocations.
//!
//! The balance is a demo affordance mirrored nowhere on the backend; it is
//! debited by a fixed cost whenever a churn response reports AI usage, and
//! topped up on request. The stored balance is always clamped to >= 0.

use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
};

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use crate::{ChurnError, Result};

/// On-disk shape of the ledger: two fixed keys.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
struct LedgerFile {
    balance: f64,
    used: f64,
}

/// File-backed token balance and cumulative spend counter
pub struct TokenLedger {
    path: PathBuf,
    state: LedgerFile,
}

impl TokenLedger {
    /// Opens the ledger at `path`, defaulting both counters to 0 when the
    /// file is missing or unreadable.
    pub fn open(path: PathBuf) -> Result<Self> {
        let state = match fs::read_to_string(&path) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(state) => state,
                Err(e) => {
                    warn!("Ledger file {} is corrupt ({}), resetting", path.display(), e);
                    LedgerFile::default()
                }
            },
            Err(_) => {
                debug!("No ledger file at {}, starting at zero", path.display());
                LedgerFile::default()
            }
        };
        Ok(TokenLedger { path, state })
    }

    pub fn balance(&self) -> f64 {
        self.state.balance
    }

    /// Total tokens ever debited for AI answers
    pub fn used(&self) -> f64 {
        self.state.used
    }

    /// Stores `max(0, v)` and persists.
    pub fn set_balance(&mut self, v: f64) -> Result<()> {
        self.state.balance = v.max(0.0);
        self.persist()
    }

    pub fn add(&mut self, v: f64) -> Result<()> {
        info!("Crediting {:.2} tokens", v);
        let balance = self.state.balance;
        self.set_balance(balance + v)
    }

    /// Debits `v` tokens (floored at zero) and accrues the used counter.
    pub fn spend(&mut self, v: f64) -> Result<()> {
        info!("Debiting {:.2} tokens", v);
        self.state.used += v;
        let balance = self.state.balance;
        self.set_balance(balance - v)
    }

    /// Writes the ledger atomically: temp file in the same directory, then
    /// rename into place.
    fn persist(&self) -> Result<()> {
        let dir = self.path.parent().unwrap_or_else(|| Path::new("."));
        if !dir.exists() {
            fs::create_dir_all(dir).map_err(|_| ChurnError::DirectoryError {
                path: dir.to_path_buf(),
            })?;
        }

        let mut temp_file = NamedTempFile::new_in(dir)?;
        let json = serde_json::to_string_pretty(&self.state)?;
        temp_file.write_all(json.as_bytes())?;
        temp_file
            .persist(&self.path)
            .map_err(|e| ChurnError::Io(e.error))?;

        debug!("Ledger persisted to {}", self.path.display());
        Ok(())
    }
}
