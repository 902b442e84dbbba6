//! manager/checkpoint_ops — проверка пути и делегирование бэкенду контрольных точек.

use crate::checkpoints::CheckpointModel;
use crate::error::Result;

use super::core::ContentsManager;

impl ContentsManager {
    fn checkpoint_target(&self, path: &str) -> Result<String> {
        let r = self.sandbox.resolve(path)?;
        self.sandbox.deny_hidden_read(&r)?;
        Ok(r.api)
    }

    pub fn create_checkpoint(&self, path: &str) -> Result<CheckpointModel> {
        let api = self.checkpoint_target(path)?;
        self.checkpoints.create_checkpoint(&api)
    }

    pub fn list_checkpoints(&self, path: &str) -> Result<Vec<CheckpointModel>> {
        let api = self.checkpoint_target(path)?;
        self.checkpoints.list_checkpoints(&api)
    }

    pub fn restore_checkpoint(&self, checkpoint_id: &str, path: &str) -> Result<()> {
        let api = self.checkpoint_target(path)?;
        self.checkpoints.restore_checkpoint(checkpoint_id, &api)
    }

    pub fn delete_checkpoint(&self, checkpoint_id: &str, path: &str) -> Result<()> {
        let api = self.checkpoint_target(path)?;
        self.checkpoints.delete_checkpoint(checkpoint_id, &api)
    }
}
