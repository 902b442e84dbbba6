use anyhow::{anyhow, Result};
use base64::engine::general_purpose::STANDARD as B64;
use base64::Engine;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

use QuiverContents::{Content, ContentsManager, Format};

use super::util::{parse_format, parse_type};

pub fn exec(
    cm: &ContentsManager,
    path: &str,
    format: Option<String>,
    type_: Option<String>,
    out: Option<PathBuf>,
) -> Result<()> {
    let format = parse_format(format)?;
    let type_ = parse_type(type_)?;
    let entry = cm.get(path, true, type_, format)?;

    if let Some(msg) = &entry.message {
        eprintln!("warning: {}", msg);
    }

    match (&entry.content, out) {
        (Content::File(Some(text)), Some(out_path)) => {
            let bytes = match entry.format {
                Some(Format::Base64) => B64.decode(text.as_bytes())?,
                _ => text.clone().into_bytes(),
            };
            if let Some(parent) = out_path.parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)?;
                }
            }
            let mut f = OpenOptions::new()
                .create(true)
                .truncate(true)
                .write(true)
                .open(&out_path)?;
            f.write_all(&bytes)?;
            f.sync_all()?;
            println!("{}: {} B -> wrote to {}", entry.path, bytes.len(), out_path.display());
        }
        (Content::File(Some(text)), None) => {
            print!("{}", text);
            if !text.ends_with('\n') {
                println!();
            }
        }
        (Content::Notebook(Some(nb)), _) => {
            println!("{}", serde_json::to_string_pretty(nb)?);
        }
        (Content::Directory(_), _) => {
            return Err(anyhow!("{} is a directory (use ls)", entry.path));
        }
        _ => return Err(anyhow!("{}: no content", entry.path)),
    }
    Ok(())
}
