use anyhow::Result;

use QuiverContents::ContentsManager;

use super::cli::CheckpointAction;

/// create / list / restore / delete checkpoints of one file.
pub fn exec(cm: &ContentsManager, action: CheckpointAction, path: &str, id: &str) -> Result<()> {
    match action {
        CheckpointAction::Create => {
            let cp = cm.create_checkpoint(path)?;
            println!("checkpoint '{}' of {} at {}", cp.id, path, cp.last_modified.to_rfc3339());
        }
        CheckpointAction::List => {
            let cps = cm.list_checkpoints(path)?;
            if cps.is_empty() {
                println!("no checkpoints for {}", path);
            }
            for cp in cps {
                println!("{:<16} {}", cp.id, cp.last_modified.to_rfc3339());
            }
        }
        CheckpointAction::Restore => {
            cm.restore_checkpoint(id, path)?;
            println!("restored '{}' over {}", id, path);
        }
        CheckpointAction::Delete => {
            cm.delete_checkpoint(id, path)?;
            println!("deleted checkpoint '{}' of {}", id, path);
        }
    }
    Ok(())
}
