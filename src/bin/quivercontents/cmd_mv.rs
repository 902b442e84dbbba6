use anyhow::Result;

use QuiverContents::{ContentsManager, Model};

pub fn exec(cm: &ContentsManager, from: &str, to: &str) -> Result<()> {
    let entry = cm.update(Model::moved_to(to), from)?;
    println!("MOVED '{}' -> '{}'", from, entry.path);
    Ok(())
}
