//! notary — доверие к ноутбукам через HMAC-SHA256 подпись содержимого.
//!
//! The signature lives in the notebook itself: `metadata.signature =
//! "sha256:<hex>"`. It covers the canonical JSON of the notebook (sorted keys,
//! compact) with the `signature` key and every cell's runtime `trusted` flag
//! removed, so marking cells or re-signing never changes what is signed.
//!
//! Trust rules for a loaded notebook:
//! - valid signature → every code cell is trusted;
//! - otherwise a code cell is trusted only if it has no rich
//!   (`execute_result` / `display_data`) output carrying anything beyond
//!   `output_type`, `execution_count` and `metadata`.

use hmac::{Hmac, Mac};
use log::debug;
use serde_json::Value;
use sha2::Sha256;

use crate::config::ContentsConfig;
use crate::error::{ContentsError, Result};
use crate::metrics::{record_notebook_signed, record_signature_check};
use crate::notebook::{Cell, Notebook};

pub mod secret;

pub use secret::Secret;

type HmacSha256 = Hmac<Sha256>;

pub const SIGNATURE_KEY: &str = "signature";
pub const SIGNATURE_SCHEME: &str = "sha256";

const SAFE_OUTPUT_KEYS: &[&str] = &["output_type", "execution_count", "metadata"];

#[derive(Debug)]
pub struct NotebookNotary {
    secret: Secret,
}

impl NotebookNotary {
    pub fn new(secret: Secret) -> Self {
        Self { secret }
    }

    pub fn from_config(cfg: &ContentsConfig) -> Self {
        Self::new(Secret::from_config(cfg))
    }

    /// Hex HMAC of the canonical form of `nb`.
    pub fn compute_signature(&self, nb: &Notebook) -> Result<String> {
        let payload = canonical_bytes(nb)?;
        let mut mac = HmacSha256::new_from_slice(self.secret.as_bytes())
            .map_err(|e| ContentsError::Internal(anyhow::anyhow!("notary key: {}", e)))?;
        mac.update(&payload);
        Ok(hex::encode(mac.finalize().into_bytes()))
    }

    /// True if `nb` carries a signature made with our key over its current content.
    pub fn check_signature(&self, nb: &Notebook) -> bool {
        let ok = match stored_signature(nb) {
            Some(stored) => match self.compute_signature(nb) {
                Ok(calc) => constant_time_eq(stored.as_bytes(), calc.as_bytes()),
                Err(e) => {
                    debug!("notary: cannot compute signature: {}", e);
                    false
                }
            },
            None => false,
        };
        record_signature_check(ok);
        ok
    }

    pub fn sign(&self, nb: &mut Notebook) -> Result<()> {
        let sig = self.compute_signature(nb)?;
        nb.metadata.insert(
            SIGNATURE_KEY.to_string(),
            Value::String(format!("{SIGNATURE_SCHEME}:{sig}")),
        );
        record_notebook_signed();
        Ok(())
    }

    pub fn unsign(&self, nb: &mut Notebook) {
        nb.metadata.remove(SIGNATURE_KEY);
    }

    /// Whether every code cell would be safe to show without a signature.
    pub fn check_cells(&self, nb: &Notebook) -> bool {
        // no short-circuit: every cell is inspected
        nb.cells
            .iter()
            .filter(|c| c.is_code())
            .fold(true, |acc, c| check_cell(c) && acc)
    }

    /// Set the runtime `trusted` mark on every code cell.
    pub fn mark_cells(&self, nb: &mut Notebook, trusted: bool) {
        for cell in nb.cells.iter_mut().filter(|c| c.is_code()) {
            cell.set_trusted(trusted);
        }
    }
}

fn check_cell(cell: &Cell) -> bool {
    if !cell.is_code() || cell.trusted() == Some(true) {
        return true;
    }
    let outputs = match &cell.outputs {
        Some(o) => o,
        None => return true,
    };
    outputs.iter().all(|out| {
        let rich = matches!(
            out.get("output_type").and_then(Value::as_str),
            Some("execute_result") | Some("display_data")
        );
        !rich || out.keys().all(|k| SAFE_OUTPUT_KEYS.contains(&k.as_str()))
    })
}

/// `metadata.signature` without its scheme prefix, if the scheme is ours.
fn stored_signature(nb: &Notebook) -> Option<&str> {
    let raw = nb.metadata.get(SIGNATURE_KEY)?.as_str()?;
    let (scheme, sig) = raw.split_once(':')?;
    if scheme != SIGNATURE_SCHEME {
        return None;
    }
    Some(sig)
}

fn canonical_bytes(nb: &Notebook) -> Result<Vec<u8>> {
    let mut clean = nb.clone();
    clean.metadata.remove(SIGNATURE_KEY);
    clean.strip_transient();
    let value = clean.to_value()?;
    serde_json::to_vec(&value)
        .map_err(|e| ContentsError::Internal(anyhow::Error::new(e).context("canonical notebook json")))
}

#[inline]
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut acc = 0u8;
    for i in 0..a.len() {
        acc |= a[i] ^ b[i];
    }
    acc == 0
}
