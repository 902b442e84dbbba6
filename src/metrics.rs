//! Lightweight global metrics for QuiverContents.
//!
//! Потокобезопасные атомарные счётчики для подсистем:
//! - Writer (atomic / in-place)
//! - CRUD (get / save / rename / delete / copy)
//! - Checkpoints
//! - Notary

use std::sync::atomic::{AtomicU64, Ordering};

// ----- Writer -----
static ATOMIC_WRITES: AtomicU64 = AtomicU64::new(0);
static INPLACE_WRITES: AtomicU64 = AtomicU64::new(0);
static BYTES_WRITTEN: AtomicU64 = AtomicU64::new(0);

// ----- CRUD -----
static GETS: AtomicU64 = AtomicU64::new(0);
static SAVES: AtomicU64 = AtomicU64::new(0);
static RENAMES: AtomicU64 = AtomicU64::new(0);
static DELETES: AtomicU64 = AtomicU64::new(0);
static COPIES: AtomicU64 = AtomicU64::new(0);
static LISTING_SKIPPED: AtomicU64 = AtomicU64::new(0);

// ----- Checkpoints -----
static CHECKPOINTS_CREATED: AtomicU64 = AtomicU64::new(0);
static CHECKPOINTS_RESTORED: AtomicU64 = AtomicU64::new(0);
static CHECKPOINTS_EVICTED: AtomicU64 = AtomicU64::new(0);

// ----- Notary -----
static NOTEBOOKS_SIGNED: AtomicU64 = AtomicU64::new(0);
static SIGNATURE_CHECKS: AtomicU64 = AtomicU64::new(0);
static SIGNATURE_MISMATCHES: AtomicU64 = AtomicU64::new(0);

#[derive(Debug, Clone, Default)]
pub struct MetricsSnapshot {
    // Writer
    pub atomic_writes: u64,
    pub inplace_writes: u64,
    pub bytes_written: u64,

    // CRUD
    pub gets: u64,
    pub saves: u64,
    pub renames: u64,
    pub deletes: u64,
    pub copies: u64,
    /// Listing entries dropped (cyclic/escaping symlinks, special files).
    pub listing_skipped: u64,

    // Checkpoints
    pub checkpoints_created: u64,
    pub checkpoints_restored: u64,
    pub checkpoints_evicted: u64,

    // Notary
    pub notebooks_signed: u64,
    pub signature_checks: u64,
    pub signature_mismatches: u64,
}

impl MetricsSnapshot {
    pub fn total_writes(&self) -> u64 {
        self.atomic_writes + self.inplace_writes
    }

    /// Доля проверок подписи, завершившихся несовпадением.
    pub fn untrusted_ratio(&self) -> f64 {
        if self.signature_checks == 0 {
            0.0
        } else {
            self.signature_mismatches as f64 / self.signature_checks as f64
        }
    }
}

// ----- Recorders (Writer) -----
pub fn record_atomic_write(bytes: u64) {
    ATOMIC_WRITES.fetch_add(1, Ordering::Relaxed);
    BYTES_WRITTEN.fetch_add(bytes, Ordering::Relaxed);
}

pub fn record_inplace_write(bytes: u64) {
    INPLACE_WRITES.fetch_add(1, Ordering::Relaxed);
    BYTES_WRITTEN.fetch_add(bytes, Ordering::Relaxed);
}

// ----- Recorders (CRUD) -----
pub fn record_get() {
    GETS.fetch_add(1, Ordering::Relaxed);
}
pub fn record_save() {
    SAVES.fetch_add(1, Ordering::Relaxed);
}
pub fn record_rename() {
    RENAMES.fetch_add(1, Ordering::Relaxed);
}
pub fn record_delete() {
    DELETES.fetch_add(1, Ordering::Relaxed);
}
pub fn record_copy() {
    COPIES.fetch_add(1, Ordering::Relaxed);
}
pub fn record_listing_skip() {
    LISTING_SKIPPED.fetch_add(1, Ordering::Relaxed);
}

// ----- Recorders (Checkpoints) -----
pub fn record_checkpoint_created() {
    CHECKPOINTS_CREATED.fetch_add(1, Ordering::Relaxed);
}
pub fn record_checkpoint_restored() {
    CHECKPOINTS_RESTORED.fetch_add(1, Ordering::Relaxed);
}
pub fn record_checkpoint_evicted() {
    CHECKPOINTS_EVICTED.fetch_add(1, Ordering::Relaxed);
}

// ----- Recorders (Notary) -----
pub fn record_notebook_signed() {
    NOTEBOOKS_SIGNED.fetch_add(1, Ordering::Relaxed);
}

pub fn record_signature_check(matched: bool) {
    SIGNATURE_CHECKS.fetch_add(1, Ordering::Relaxed);
    if !matched {
        SIGNATURE_MISMATCHES.fetch_add(1, Ordering::Relaxed);
    }
}

// ----- Snapshot / Reset -----
pub fn snapshot() -> MetricsSnapshot {
    MetricsSnapshot {
        atomic_writes: ATOMIC_WRITES.load(Ordering::Relaxed),
        inplace_writes: INPLACE_WRITES.load(Ordering::Relaxed),
        bytes_written: BYTES_WRITTEN.load(Ordering::Relaxed),

        gets: GETS.load(Ordering::Relaxed),
        saves: SAVES.load(Ordering::Relaxed),
        renames: RENAMES.load(Ordering::Relaxed),
        deletes: DELETES.load(Ordering::Relaxed),
        copies: COPIES.load(Ordering::Relaxed),
        listing_skipped: LISTING_SKIPPED.load(Ordering::Relaxed),

        checkpoints_created: CHECKPOINTS_CREATED.load(Ordering::Relaxed),
        checkpoints_restored: CHECKPOINTS_RESTORED.load(Ordering::Relaxed),
        checkpoints_evicted: CHECKPOINTS_EVICTED.load(Ordering::Relaxed),

        notebooks_signed: NOTEBOOKS_SIGNED.load(Ordering::Relaxed),
        signature_checks: SIGNATURE_CHECKS.load(Ordering::Relaxed),
        signature_mismatches: SIGNATURE_MISMATCHES.load(Ordering::Relaxed),
    }
}

pub fn reset() {
    ATOMIC_WRITES.store(0, Ordering::Relaxed);
    INPLACE_WRITES.store(0, Ordering::Relaxed);
    BYTES_WRITTEN.store(0, Ordering::Relaxed);

    GETS.store(0, Ordering::Relaxed);
    SAVES.store(0, Ordering::Relaxed);
    RENAMES.store(0, Ordering::Relaxed);
    DELETES.store(0, Ordering::Relaxed);
    COPIES.store(0, Ordering::Relaxed);
    LISTING_SKIPPED.store(0, Ordering::Relaxed);

    CHECKPOINTS_CREATED.store(0, Ordering::Relaxed);
    CHECKPOINTS_RESTORED.store(0, Ordering::Relaxed);
    CHECKPOINTS_EVICTED.store(0, Ordering::Relaxed);

    NOTEBOOKS_SIGNED.store(0, Ordering::Relaxed);
    SIGNATURE_CHECKS.store(0, Ordering::Relaxed);
    SIGNATURE_MISMATCHES.store(0, Ordering::Relaxed);
}
