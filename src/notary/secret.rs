//! notary/secret — ключ HMAC нотариуса.
//!
//! Sources, first hit wins:
//! 1. inline bytes from the config;
//! 2. the secret file (`notary_secret_file` or `<data_dir>/notebook_secret`),
//!    created on first use with 1024 random bits, base64, mode 0600, under an
//!    exclusive fs2 lock so concurrent processes agree on one key;
//! 3. an in-memory random key (signatures then only live as long as the process).
//!
//! Ключ обнуляется (zeroize) при Drop.

use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use base64::engine::general_purpose::STANDARD as B64;
use base64::Engine;
use fs2::FileExt;
use log::{debug, info, warn};
use rand::RngCore;
use zeroize::Zeroize;

use crate::config::ContentsConfig;

/// 1024 bits.
const SECRET_BYTES: usize = 128;

pub struct Secret(Vec<u8>);

impl Secret {
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self(bytes.to_vec())
    }

    /// Fresh random key, base64 text as key material (same form as the file).
    pub fn random() -> Self {
        let mut raw = [0u8; SECRET_BYTES];
        rand::rngs::OsRng.fill_bytes(&mut raw);
        let encoded = B64.encode(raw).into_bytes();
        raw.zeroize();
        Self(encoded)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Resolve the key for a store configured by `cfg`. Never fails: an
    /// unusable secret file degrades to an in-memory key with a warning.
    pub fn from_config(cfg: &ContentsConfig) -> Self {
        if let Some(bytes) = &cfg.notary_secret {
            debug!("notary: using inline secret");
            return Self::from_bytes(bytes);
        }
        match cfg.secret_file_path() {
            Some(path) => match load_or_create(&path) {
                Ok(s) => s,
                Err(e) => {
                    warn!(
                        "notary: cannot use secret file {}: {:#}; falling back to an in-memory secret",
                        path.display(),
                        e
                    );
                    Self::random()
                }
            },
            None => {
                info!("notary: no data dir configured, signatures will not survive a restart");
                Self::random()
            }
        }
    }
}

impl Drop for Secret {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Secret(<{} bytes>)", self.0.len())
    }
}

fn lock_path(path: &Path) -> PathBuf {
    let mut s = path.as_os_str().to_os_string();
    s.push(".lock");
    PathBuf::from(s)
}

fn lock_secret(path: &Path) -> Result<File> {
    let lp = lock_path(path);
    let f = OpenOptions::new()
        .create(true)
        .read(true)
        .write(true)
        .open(&lp)
        .with_context(|| format!("open lock {}", lp.display()))?;
    f.lock_exclusive()
        .with_context(|| format!("lock_exclusive {}", lp.display()))?;
    Ok(f)
}

/// Read the secret file, creating it first if needed.
pub fn load_or_create(path: &Path) -> Result<Secret> {
    if path.exists() {
        return read_secret(path);
    }
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("create secret dir {}", parent.display()))?;
        }
    }

    let lk = lock_secret(path)?;
    // another process may have won the race while we waited for the lock
    if path.exists() {
        let s = read_secret(path);
        let _ = fs2::FileExt::unlock(&lk);
        return s;
    }

    let secret = Secret::random();
    let tmp = {
        let mut s = path.as_os_str().to_os_string();
        s.push(".tmp");
        PathBuf::from(s)
    };
    {
        let mut opts = OpenOptions::new();
        opts.create(true).write(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            opts.mode(0o600);
        }
        let mut f = opts
            .open(&tmp)
            .with_context(|| format!("open {}", tmp.display()))?;
        f.write_all(secret.as_bytes())
            .with_context(|| format!("write {}", tmp.display()))?;
        f.sync_all()
            .with_context(|| format!("fsync {}", tmp.display()))?;
    }
    fs::rename(&tmp, path)
        .with_context(|| format!("rename {} -> {}", tmp.display(), path.display()))?;
    let _ = fs2::FileExt::unlock(&lk);

    info!("notary: created secret file {}", path.display());
    Ok(secret)
}

fn read_secret(path: &Path) -> Result<Secret> {
    let mut raw = fs::read(path).with_context(|| format!("read {}", path.display()))?;
    let start = raw.iter().position(|b| !b.is_ascii_whitespace()).unwrap_or(raw.len());
    let end = raw.iter().rposition(|b| !b.is_ascii_whitespace()).map_or(start, |i| i + 1);
    let trimmed: Vec<u8> = raw[start..end].to_vec();
    raw.zeroize();
    if trimmed.is_empty() {
        return Err(anyhow!("secret file {} is empty", path.display()));
    }
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if let Ok(md) = fs::metadata(path) {
            if md.permissions().mode() & 0o077 != 0 {
                warn!("notary: secret file {} is readable by others", path.display());
            }
        }
    }
    debug!("notary: loaded secret from {}", path.display());
    Ok(Secret(trimmed))
}
