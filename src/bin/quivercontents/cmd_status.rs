use anyhow::Result;
use serde_json::json;

use QuiverContents::metrics;
use QuiverContents::ContentsManager;

pub fn exec(cm: &ContentsManager, json: bool) -> Result<()> {
    let cfg = cm.config();
    let ms = metrics::snapshot();
    if json {
        let v = json!({
            "root_dir": cm.root_dir().display().to_string(),
            "use_atomic_writing": cfg.use_atomic_writing,
            "allow_hidden": cfg.allow_hidden,
            "hide_globs": cfg.hide_globs,
            "checkpoint_root": cfg.checkpoint_root.as_ref().map(|p| p.display().to_string()),
            "max_checkpoints": cfg.max_checkpoints,
            "metrics": {
                "atomic_writes": ms.atomic_writes,
                "inplace_writes": ms.inplace_writes,
                "bytes_written": ms.bytes_written,
                "gets": ms.gets,
                "saves": ms.saves,
                "listing_skipped": ms.listing_skipped,
                "checkpoints_created": ms.checkpoints_created,
                "checkpoints_evicted": ms.checkpoints_evicted,
                "notebooks_signed": ms.notebooks_signed,
                "signature_checks": ms.signature_checks,
                "untrusted_ratio": ms.untrusted_ratio(),
            }
        });
        println!("{}", serde_json::to_string_pretty(&v)?);
        return Ok(());
    }
    println!("{}", cfg);
    println!("root (canonical): {}", cm.root_dir().display());
    println!(
        "metrics: writes={} (atomic={}, in-place={}), bytes={}",
        ms.total_writes(),
        ms.atomic_writes,
        ms.inplace_writes,
        ms.bytes_written
    );
    println!(
        "notary: checks={}, mismatches={} ({:.1}%)",
        ms.signature_checks,
        ms.signature_mismatches,
        ms.untrusted_ratio() * 100.0
    );
    Ok(())
}
