//! checkpoints — снимки содержимого записи (point-in-time), подключаемый бэкенд.
//!
//! All paths handed to a backend are normalized API paths that the manager has
//! already validated against the sandbox.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;

pub mod file;

pub use file::{FileCheckpoints, CHECKPOINT_DIR};

/// Default (and, with `max_checkpoints = 1`, only) checkpoint id.
pub const DEFAULT_CHECKPOINT_ID: &str = "checkpoint";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckpointModel {
    pub id: String,
    pub last_modified: DateTime<Utc>,
}

pub trait Checkpoints: Send + Sync {
    /// Snapshot the current bytes of `path`.
    fn create_checkpoint(&self, path: &str) -> Result<CheckpointModel>;

    /// Checkpoints of `path`, oldest first.
    fn list_checkpoints(&self, path: &str) -> Result<Vec<CheckpointModel>>;

    /// Copy a snapshot back over the live entry.
    fn restore_checkpoint(&self, checkpoint_id: &str, path: &str) -> Result<()>;

    fn delete_checkpoint(&self, checkpoint_id: &str, path: &str) -> Result<()>;

    fn rename_checkpoint(&self, checkpoint_id: &str, old_path: &str, new_path: &str) -> Result<()>;

    fn rename_all_checkpoints(&self, old_path: &str, new_path: &str) -> Result<()> {
        for cp in self.list_checkpoints(old_path)? {
            self.rename_checkpoint(&cp.id, old_path, new_path)?;
        }
        Ok(())
    }

    fn delete_all_checkpoints(&self, path: &str) -> Result<()> {
        for cp in self.list_checkpoints(path)? {
            self.delete_checkpoint(&cp.id, path)?;
        }
        Ok(())
    }

    /// Called after a directory moved. Backends that keep snapshots inside the
    /// contents tree get this for free.
    fn rename_directory(&self, _old_path: &str, _new_path: &str) -> Result<()> {
        Ok(())
    }

    /// Called after a directory was removed.
    fn delete_directory(&self, _path: &str) -> Result<()> {
        Ok(())
    }
}
