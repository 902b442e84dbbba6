use anyhow::Result;
use clap::Parser;
use env_logger::{Builder, Env};
use log::error;

use QuiverContents::{ContentsConfig, ContentsManager};

mod cli;
mod util;
mod cmd_ls;
mod cmd_cat;
mod cmd_put;
mod cmd_new;
mod cmd_mv;
mod cmd_cp;
mod cmd_rm;
mod cmd_checkpoint;
mod cmd_trust;
mod cmd_status;

fn init_logger() {
    // Уровень берём из RUST_LOG, иначе дефолт — info.
    // Пример: RUST_LOG=debug quivercontents ls
    Builder::from_env(Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();
}

fn main() {
    init_logger();

    if let Err(e) = run() {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

fn open(cli: &cli::Cli) -> Result<ContentsManager> {
    let mut cfg = ContentsConfig::from_env();
    if cli.allow_hidden {
        cfg = cfg.with_allow_hidden(true);
    }
    if let Some(root) = &cli.root {
        cfg = cfg.with_root_dir(root.clone());
    }
    if cli.no_atomic {
        cfg = cfg.with_atomic_writing(false);
    }
    Ok(ContentsManager::open(cfg)?)
}

fn run() -> Result<()> {
    let cli = cli::Cli::parse();
    let cm = open(&cli)?;
    match cli.cmd {
        cli::Cmd::Ls { path, json } =>
            cmd_ls::exec(&cm, &path, json),

        cli::Cmd::Cat { path, format, type_, out } =>
            cmd_cat::exec(&cm, &path, format, type_, out),

        cli::Cmd::Put { path, value } =>
            cmd_put::exec(&cm, &path, &value),

        cli::Cmd::New { dir, type_, ext } =>
            cmd_new::exec_untitled(&cm, &dir, type_, &ext),

        cli::Cmd::Mkdir { path } =>
            cmd_new::exec_mkdir(&cm, &path),

        cli::Cmd::Mv { from, to } =>
            cmd_mv::exec(&cm, &from, &to),

        cli::Cmd::Cp { from, to } =>
            cmd_cp::exec(&cm, &from, to.as_deref()),

        cli::Cmd::Rm { path } =>
            cmd_rm::exec(&cm, &path),

        cli::Cmd::Checkpoint { action, path, id } =>
            cmd_checkpoint::exec(&cm, action, &path, &id),

        cli::Cmd::Trust { path, check } =>
            cmd_trust::exec(&cm, &path, check),

        cli::Cmd::Status { json } =>
            cmd_status::exec(&cm, json),
    }
}
