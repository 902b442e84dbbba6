use anyhow::Result;

use QuiverContents::ContentsManager;

pub fn exec(cm: &ContentsManager, from: &str, to: Option<&str>) -> Result<()> {
    let entry = cm.copy(from, to)?;
    println!("COPIED '{}' -> '{}'", from, entry.path);
    Ok(())
}
