use anyhow::{anyhow, Result};
use base64::engine::general_purpose::STANDARD as B64;
use base64::Engine;

use QuiverContents::{ContentsManager, Model, Notebook};

use super::util::decode_value_arg;

pub fn exec(cm: &ContentsManager, path: &str, value: &str) -> Result<()> {
    let (bytes, src) = decode_value_arg(value)?;
    let len = bytes.len();

    let model = if path.ends_with(".ipynb") {
        let nb: Notebook = serde_json::from_slice(&bytes)
            .map_err(|e| anyhow!("{} is not a notebook document: {}", path, e))?;
        Model::notebook(nb)
    } else {
        match String::from_utf8(bytes) {
            Ok(text) => Model::text(text),
            Err(e) => Model::base64(B64.encode(e.into_bytes())),
        }
    };

    let entry = cm.save(model, path)?;
    println!("SAVED '{}' ({} B from {})", entry.path, len, src);
    if let Some(msg) = entry.message {
        println!("warning: {}", msg);
    }
    Ok(())
}
