//! notebook — дерево документа ноутбука и его (де)сериализация.
//!
//! On-disk form: JSON, keys sorted, 1-space indent, trailing newline. The
//! per-cell `metadata.trusted` flag is a runtime mark and never reaches disk.
//! Unknown keys on cells are kept verbatim (`Cell::extra`).

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{ContentsError, Result};

pub const NBFORMAT: u32 = 4;
pub const NBFORMAT_MINOR: u32 = 5;

const CELL_TYPES: &[&str] = &["code", "markdown", "raw"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notebook {
    pub nbformat: u32,
    pub nbformat_minor: u32,
    #[serde(default)]
    pub metadata: Map<String, Value>,
    #[serde(default)]
    pub cells: Vec<Cell>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    pub cell_type: String,
    #[serde(default)]
    pub metadata: Map<String, Value>,
    #[serde(default)]
    pub source: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outputs: Option<Vec<Map<String, Value>>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Cell {
    pub fn code(source: impl Into<String>) -> Self {
        let mut extra = Map::new();
        extra.insert("execution_count".into(), Value::Null);
        Self {
            cell_type: "code".into(),
            metadata: Map::new(),
            source: Value::String(source.into()),
            outputs: Some(Vec::new()),
            extra,
        }
    }

    pub fn markdown(source: impl Into<String>) -> Self {
        Self {
            cell_type: "markdown".into(),
            metadata: Map::new(),
            source: Value::String(source.into()),
            outputs: None,
            extra: Map::new(),
        }
    }

    pub fn is_code(&self) -> bool {
        self.cell_type == "code"
    }

    /// Runtime trust mark (`metadata.trusted`).
    pub fn trusted(&self) -> Option<bool> {
        self.metadata.get("trusted").and_then(Value::as_bool)
    }

    pub fn set_trusted(&mut self, trusted: bool) {
        self.metadata.insert("trusted".into(), Value::Bool(trusted));
    }

    pub fn clear_trusted(&mut self) {
        self.metadata.remove("trusted");
    }
}

impl Default for Notebook {
    fn default() -> Self {
        Self::new()
    }
}

impl Notebook {
    /// Empty notebook, current format.
    pub fn new() -> Self {
        Self {
            nbformat: NBFORMAT,
            nbformat_minor: NBFORMAT_MINOR,
            metadata: Map::new(),
            cells: Vec::new(),
        }
    }

    pub fn with_cells(cells: Vec<Cell>) -> Self {
        Self {
            cells,
            ..Self::new()
        }
    }

    /// Drop runtime-only marks before persisting.
    pub fn strip_transient(&mut self) {
        for cell in &mut self.cells {
            cell.clear_trusted();
        }
    }

    /// Light structural check. Returns a human-readable message on failure.
    pub fn validate(&self) -> Option<String> {
        let mut problems: Vec<String> = Vec::new();
        if self.nbformat != NBFORMAT {
            problems.push(format!(
                "unsupported nbformat {} (expected {})",
                self.nbformat, NBFORMAT
            ));
        }
        for (i, cell) in self.cells.iter().enumerate() {
            if !CELL_TYPES.contains(&cell.cell_type.as_str()) {
                problems.push(format!("cell {}: unknown cell_type '{}'", i, cell.cell_type));
            } else if cell.is_code() && cell.outputs.is_none() {
                problems.push(format!("cell {}: code cell without 'outputs'", i));
            }
            if !(cell.source.is_string() || cell.source.is_array()) {
                problems.push(format!("cell {}: 'source' must be a string or a list", i));
            }
        }
        if problems.is_empty() {
            None
        } else {
            Some(format!("Notebook validation failed: {}", problems.join("; ")))
        }
    }

    /// Notebook as a sorted-key JSON value.
    pub fn to_value(&self) -> Result<Value> {
        serde_json::to_value(self)
            .map_err(|e| ContentsError::Internal(anyhow::Error::new(e).context("serialize notebook")))
    }
}

/// Parse notebook bytes. Anything that is not a notebook JSON document is a 400.
pub fn read_notebook(bytes: &[u8], what: &str) -> Result<Notebook> {
    serde_json::from_slice::<Notebook>(bytes)
        .map_err(|e| ContentsError::bad_request(format!("Unreadable Notebook: {what} {e}")))
}

/// Serialize for disk: trusted marks stripped, 1-space indent, trailing newline.
pub fn write_notebook(nb: &Notebook) -> Result<Vec<u8>> {
    let mut clean = nb.clone();
    clean.strip_transient();
    // through Value so object keys come out sorted
    let value = clean.to_value()?;

    let mut out = Vec::with_capacity(4096);
    let fmt = serde_json::ser::PrettyFormatter::with_indent(b" ");
    let mut ser = serde_json::Serializer::with_formatter(&mut out, fmt);
    value
        .serialize(&mut ser)
        .map_err(|e| ContentsError::Internal(anyhow::Error::new(e).context("write notebook json")))?;
    out.push(b'\n');
    Ok(out)
}
