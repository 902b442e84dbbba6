//! manager/trust — связка с нотариусом.

use log::warn;

use crate::entry::{Content, Entry, EntryType, Model};
use crate::error::{ContentsError, Result};
use crate::notebook::Notebook;

use super::core::ContentsManager;

impl ContentsManager {
    /// Explicitly trust the notebook at `path`: mark every cell, sign, save.
    pub fn trust_notebook(&self, path: &str) -> Result<Entry> {
        let entry = self.get(path, true, Some(EntryType::Notebook), None)?;
        let mut nb = match entry.content {
            Content::Notebook(Some(nb)) => nb,
            _ => return Err(ContentsError::bad_request(format!("{path} is not a notebook"))),
        };
        warn!("Trusting notebook {}", entry.path);
        self.notary.mark_cells(&mut nb, true);
        self.save(Model::notebook(nb), &entry.path)
    }

    /// Mark cells according to the stored signature.
    pub fn mark_trusted_cells(&self, nb: &mut Notebook, path: &str) {
        let trusted = self.notary.check_signature(nb);
        if !trusted {
            warn!("Notebook {} is not trusted", path);
        }
        self.notary.mark_cells(nb, trusted);
    }

    /// Sign `nb` if every cell is trusted.
    pub fn check_and_sign(&self, nb: &mut Notebook, path: &str) {
        if self.notary.check_cells(nb) {
            if let Err(e) = self.notary.sign(nb) {
                warn!("Failed to sign notebook {}: {}", path, e);
            }
        } else {
            warn!("Notebook {} is not trusted", path);
        }
    }
}
