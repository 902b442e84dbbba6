//! util — общие утилиты (время, права доступа).
//!
//! Содержит:
//! - system_time_utc(): SystemTime -> DateTime<Utc> (эпоха при ошибке).
//! - modified_utc()/created_utc(): метки времени из metadata (ctime на unix, как stat).
//! - is_writable(): проверка записи через access(W_OK) на unix.

use std::fs::Metadata;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use chrono::{DateTime, Utc};
use log::warn;

/// Convert a SystemTime to UTC; pre-epoch or unrepresentable times become the epoch.
pub fn system_time_utc(t: SystemTime) -> DateTime<Utc> {
    match t.duration_since(UNIX_EPOCH) {
        Ok(d) => DateTime::<Utc>::from_timestamp(d.as_secs() as i64, d.subsec_nanos())
            .unwrap_or(DateTime::<Utc>::UNIX_EPOCH),
        Err(_) => DateTime::<Utc>::UNIX_EPOCH,
    }
}

/// mtime as UTC.
pub fn modified_utc(md: &Metadata, what: &Path) -> DateTime<Utc> {
    match md.modified() {
        Ok(t) => system_time_utc(t),
        Err(e) => {
            warn!("invalid mtime for {}: {}", what.display(), e);
            DateTime::<Utc>::UNIX_EPOCH
        }
    }
}

/// "created" the way stat reports it: ctime on unix, birth time elsewhere.
#[cfg(unix)]
pub fn created_utc(md: &Metadata, what: &Path) -> DateTime<Utc> {
    use std::os::unix::fs::MetadataExt;
    match DateTime::<Utc>::from_timestamp(md.ctime(), md.ctime_nsec().clamp(0, 999_999_999) as u32) {
        Some(t) => t,
        None => {
            warn!("invalid ctime for {}", what.display());
            DateTime::<Utc>::UNIX_EPOCH
        }
    }
}

#[cfg(not(unix))]
pub fn created_utc(md: &Metadata, what: &Path) -> DateTime<Utc> {
    match md.created().or_else(|_| md.modified()) {
        Ok(t) => system_time_utc(t),
        Err(e) => {
            warn!("invalid ctime for {}: {}", what.display(), e);
            DateTime::<Utc>::UNIX_EPOCH
        }
    }
}

/// Whether the current process may write `path` (follows symlinks).
#[cfg(unix)]
pub fn is_writable(path: &Path) -> bool {
    use std::ffi::CString;
    use std::os::unix::ffi::OsStrExt;

    let c = match CString::new(path.as_os_str().as_bytes()) {
        Ok(c) => c,
        Err(_) => return false,
    };
    // access(2) с W_OK: учитывает euid, ACL и read-only mounts
    unsafe { libc::access(c.as_ptr(), libc::W_OK) == 0 }
}

#[cfg(not(unix))]
pub fn is_writable(path: &Path) -> bool {
    std::fs::metadata(path)
        .map(|m| !m.permissions().readonly())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn epoch_for_pre_epoch_times() {
        let t = UNIX_EPOCH - Duration::from_secs(10);
        assert_eq!(system_time_utc(t), DateTime::<Utc>::UNIX_EPOCH);
    }

    #[test]
    fn keeps_subsecond_precision() {
        let t = UNIX_EPOCH + Duration::new(1_700_000_000, 123_456_789);
        let dt = system_time_utc(t);
        assert_eq!(dt.timestamp(), 1_700_000_000);
        assert_eq!(dt.timestamp_subsec_nanos(), 123_456_789);
    }
}
