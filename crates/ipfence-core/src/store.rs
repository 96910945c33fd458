// ── Tracked state ──
//
// The set of rules this tool put on each account, persisted as JSON so
// later runs know which remote rules they own.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use ipfence_api::IpRule;

use crate::error::CoreError;

const STATE_VERSION: u32 = 1;

/// What is known about one managed account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackedAccount {
    pub resource_id: String,
    pub rules: Vec<IpRule>,
    pub updated_at: DateTime<Utc>,
}

impl TrackedAccount {
    pub fn new(resource_id: impl Into<String>, rules: Vec<IpRule>) -> Self {
        Self {
            resource_id: resource_id.into(),
            rules,
            updated_at: Utc::now(),
        }
    }
}

/// On-disk layout: account id → tracked entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackedState {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub accounts: BTreeMap<String, TrackedAccount>,
}

fn default_version() -> u32 {
    STATE_VERSION
}

/// JSON-file backed tracked state.
///
/// Mutations are in memory until [`save`](Self::save).
#[derive(Debug)]
pub struct StateStore {
    path: PathBuf,
    state: TrackedState,
}

impl StateStore {
    /// Load from `path`. A missing file is an empty state.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, CoreError> {
        let path = path.into();
        let state = match std::fs::read(&path) {
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|e| state_error(&path, &e))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no state file yet");
                TrackedState {
                    version: STATE_VERSION,
                    ..TrackedState::default()
                }
            }
            Err(e) => return Err(state_error(&path, &e)),
        };
        Ok(Self { path, state })
    }

    pub fn get(&self, account_id: &str) -> Option<&TrackedAccount> {
        self.state.accounts.get(account_id)
    }

    pub fn put(&mut self, account_id: impl Into<String>, entry: TrackedAccount) {
        self.state.accounts.insert(account_id.into(), entry);
    }

    pub fn remove(&mut self, account_id: &str) -> Option<TrackedAccount> {
        self.state.accounts.remove(account_id)
    }

    pub fn accounts(&self) -> impl Iterator<Item = (&str, &TrackedAccount)> {
        self.state.accounts.iter().map(|(id, entry)| (id.as_str(), entry))
    }

    /// Persist atomically: write a sibling temp file, then rename it over
    /// the real one.
    pub fn save(&self) -> Result<(), CoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| state_error(&self.path, &e))?;
        }
        let json =
            serde_json::to_vec_pretty(&self.state).map_err(|e| state_error(&self.path, &e))?;

        let tmp = temp_path(&self.path);
        std::fs::write(&tmp, json).map_err(|e| state_error(&tmp, &e))?;
        std::fs::rename(&tmp, &self.path).map_err(|e| state_error(&self.path, &e))?;

        debug!(path = %self.path.display(), accounts = self.state.accounts.len(), "state saved");
        Ok(())
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

fn state_error(path: &Path, err: &dyn std::fmt::Display) -> CoreError {
    CoreError::State {
        path: path.display().to_string(),
        reason: err.to_string(),
    }
}
