use anyhow::Result;

use QuiverContents::ContentsManager;

pub fn exec(cm: &ContentsManager, path: &str) -> Result<()> {
    cm.delete(path)?;
    println!("DELETED '{}'", path);
    Ok(())
}
