use anyhow::{bail, Context, Result};
use log::info;
use std::io::Read;
use std::path::PathBuf;

use crate::config::{BacktraceMode, MonitorConfig};
use crate::fs::LocalFileSystem;
use crate::source::ReadSource;

pub fn cmd_scan(
    root: PathBuf,
    files: Vec<String>,
    keep: usize,
    json: bool,
    backtrace: Option<BacktraceMode>,
) -> Result<()> {
    let mut cfg = MonitorConfig::from_env().with_enabled(true);
    if let Some(mode) = backtrace {
        cfg = cfg.with_backtrace(mode);
    }
    info!("scan: {}", cfg);

    let fs = LocalFileSystem::new(&root, cfg);
    scan_files(&fs, &files, keep, json)
}

/// Open and read `files`, close all but the last `keep`, report, close the rest.
/// Fails if anything is still reported open at the end.
pub fn scan_files(fs: &LocalFileSystem, files: &[String], keep: usize, json: bool) -> Result<()> {
    let monitor = fs
        .monitor()
        .cloned()
        .context("monitor must be enabled for scan")?;

    // Открываем и вычитываем все файлы; потоки пока держим
    let mut streams: Vec<Box<dyn ReadSource>> = Vec::with_capacity(files.len());
    for rel in files {
        let mut s = fs
            .get_input_stream(rel)
            .with_context(|| format!("open {}", fs.resolve(rel).display()))?;
        let mut buf = Vec::new();
        let n = s
            .read_to_end(&mut buf)
            .with_context(|| format!("read {}", fs.resolve(rel).display()))?;
        info!("read {} B from {}", n, rel);
        streams.push(s);
    }

    // Закрываем всё, кроме последних `keep`
    let close_n = streams.len().saturating_sub(keep);
    for mut s in streams.drain(..close_n) {
        s.close().context("close stream")?;
    }

    if json {
        let report = monitor.report(true);
        println!("{}", serde_json::to_string(&report).context("serialize report")?);
    } else {
        fs.dump();
        for rel in files.iter().rev().take(keep) {
            monitor.dump_path(fs.resolve(rel));
        }
    }

    for mut s in streams {
        s.close().context("close kept stream")?;
    }

    let left = monitor.report(false);
    if !left.is_empty() {
        bail!("{} file(s) still reported open after closing all streams", left.open_files);
    }
    let m = monitor.metrics();
    info!(
        "scan done: opened={}, closed={}, close_errors={}",
        m.streams_opened, m.streams_closed, m.close_errors
    );
    Ok(())
}

pub fn cmd_rm(root: PathBuf, file: String, hold: bool, strict: bool) -> Result<()> {
    let cfg = MonitorConfig::from_env()
        .with_enabled(true)
        .with_block_busy_ops(strict);
    let fs = LocalFileSystem::new(&root, cfg);
    rm_file(&fs, &file, hold)
}

/// Delete `file`, optionally holding an open stream on it across the delete.
/// The HandleError of a refused delete stays reachable via `downcast_ref`.
pub fn rm_file(fs: &LocalFileSystem, file: &str, hold: bool) -> Result<()> {
    let held = if hold {
        Some(
            fs.get_input_stream(file)
                .with_context(|| format!("open {}", fs.resolve(file).display()))?,
        )
    } else {
        None
    };

    let res = fs.delete_file(file);
    drop(held);
    res.with_context(|| format!("delete {}", fs.resolve(file).display()))?;

    println!("deleted {}", fs.resolve(file).display());
    Ok(())
}
