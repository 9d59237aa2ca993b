use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::BacktraceMode;

pub mod admin;

/// Open-handle monitor CLI
#[derive(Parser, Debug)]
#[command(name = "handlemon", version, about = "Track and report open read handles")]
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Cmd,
}

#[derive(Subcommand, Debug)]
pub enum Cmd {
    /// Open and read files through a monitored filesystem, then report what stays open
    Scan {
        /// Filesystem root; FILE arguments are relative to it
        #[arg(long)]
        root: PathBuf,
        /// Files to open (relative to --root)
        #[arg(required = true)]
        files: Vec<String>,
        /// Keep the last N streams open while reporting
        #[arg(long, default_value_t = 0)]
        keep: usize,
        /// Print the report as one JSON object instead of a log dump
        #[arg(long)]
        json: bool,
        /// Creation-context capture: off|env|always (default: HANDLEMON_BACKTRACE or env)
        #[arg(long)]
        backtrace: Option<BacktraceMode>,
    },
    /// Delete a file through the monitored filesystem
    Rm {
        #[arg(long)]
        root: PathBuf,
        /// File to delete (relative to --root)
        file: String,
        /// Hold an open stream on the file while deleting
        #[arg(long)]
        hold: bool,
        /// Refuse to delete while streams are open
        #[arg(long)]
        strict: bool,
    },
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    match cli.cmd {
        Cmd::Scan { root, files, keep, json, backtrace } =>
            admin::cmd_scan(root, files, keep, json, backtrace),

        Cmd::Rm { root, file, hold, strict } =>
            admin::cmd_rm(root, file, hold, strict),
    }
}
