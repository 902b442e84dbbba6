use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Операторский CLI поверх QuiverContents
#[derive(Parser, Debug)]
#[command(name = "quivercontents", version, about = "QuiverContents CLI")]
pub struct Cli {
    /// Contents root (overrides QC_ROOT_DIR)
    #[arg(long, global = true)]
    pub root: Option<PathBuf>,

    /// Write in place instead of temp file + rename
    #[arg(long, global = true, default_value_t = false)]
    pub no_atomic: bool,

    /// Serve and accept dot-prefixed names
    #[arg(long, global = true, default_value_t = false)]
    pub allow_hidden: bool,

    #[command(subcommand)]
    pub cmd: Cmd,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum CheckpointAction {
    Create,
    List,
    Restore,
    Delete,
}

#[derive(Subcommand, Debug)]
pub enum Cmd {
    /// List a directory (or stat a file)
    Ls {
        /// API path ("" = root)
        #[arg(default_value = "")]
        path: String,
        /// JSON output (full entry)
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Print file/notebook content
    Cat {
        path: String,
        /// text | base64 (files only)
        #[arg(long)]
        format: Option<String>,
        /// Force interpretation: file | notebook
        #[arg(long = "type")]
        type_: Option<String>,
        /// Write raw bytes of the file here instead of printing
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Save a file. Value: literal, @file, "-" (stdin) or hex:..
    ///
    /// `.ipynb` targets are parsed and saved as notebooks.
    Put {
        path: String,
        value: String,
    },
    /// Create an Untitled file/notebook/folder in a directory
    New {
        #[arg(default_value = "")]
        dir: String,
        /// file | notebook | directory
        #[arg(long = "type")]
        type_: Option<String>,
        #[arg(long, default_value = "")]
        ext: String,
    },
    /// Create a directory
    Mkdir {
        path: String,
    },
    /// Rename / move
    Mv {
        from: String,
        to: String,
    },
    /// Copy a file or notebook (into a directory with -Copy numbering, or to an exact path)
    Cp {
        from: String,
        to: Option<String>,
    },
    /// Delete a file or a directory (recursively)
    Rm {
        path: String,
    },
    /// Manage checkpoints of a file
    Checkpoint {
        #[arg(value_enum)]
        action: CheckpointAction,
        path: String,
        /// Checkpoint id (restore/delete)
        #[arg(long, default_value = "checkpoint")]
        id: String,
    },
    /// Trust (sign) a notebook, or only report its status with --check
    Trust {
        path: String,
        #[arg(long, default_value_t = false)]
        check: bool,
    },
    /// Print effective configuration and metrics
    Status {
        #[arg(long, default_value_t = false)]
        json: bool,
    },
}
