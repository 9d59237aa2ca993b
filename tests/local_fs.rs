// tests/local_fs.rs
//
// LocalFileSystem как хозяин монитора:
// - без enabled монитора нет, потоки не отслеживаются;
// - delete/rename занятого файла: warn + детальный dump; в strict-режиме — отказ StillOpen;
// - отсутствующий файл -> NotFound.

mod common;

use std::io::Read;

use anyhow::Result;
use handlemon::{HandleError, HandleMonitor, LocalFileSystem, LocalOpener};

use common::{quiet_config, unique_root, write_file, CollectingSink};

fn monitored_fs(prefix: &str, strict: bool) -> (LocalFileSystem, std::sync::Arc<CollectingSink>) {
    let root = unique_root(prefix);
    std::fs::create_dir_all(&root).unwrap();
    let sink = CollectingSink::new();
    let cfg = quiet_config().with_enabled(true).with_block_busy_ops(strict);
    let m = HandleMonitor::with_parts(cfg, Box::new(LocalOpener), sink.clone());
    (LocalFileSystem::with_monitor(root, m), sink)
}

#[test]
fn disabled_monitor_hands_out_untracked_streams() -> Result<()> {
    let root = unique_root("fs-off");
    write_file(&root, "plain.txt", b"plain")?;
    let fs = LocalFileSystem::new(&root, quiet_config());
    assert!(fs.monitor().is_none());

    let mut s = fs.get_input_stream("/plain.txt")?;
    let mut out = String::new();
    s.read_to_string(&mut out)?;
    assert_eq!(out, "plain");
    assert!(!fs.is_open("plain.txt"));
    s.close()?;

    assert!(fs.get_input_stream("nope").err().is_some_and(|e| e.is_not_found()));
    Ok(())
}

#[test]
fn enabled_config_creates_monitor() -> Result<()> {
    let root = unique_root("fs-on");
    write_file(&root, "t", b"t")?;
    let fs = LocalFileSystem::new(&root, quiet_config().with_enabled(true));
    assert!(fs.monitor().is_some());

    let s = fs.get_input_stream("t")?;
    assert!(fs.is_open("t"));
    assert!(fs.is_open("/t"), "leading slash resolves to the same path");
    drop(s);
    assert!(!fs.is_open("t"));
    Ok(())
}

#[test]
fn delete_of_busy_file_reports_open_streams() -> Result<()> {
    let (fs, sink) = monitored_fs("fs-del", false);
    write_file(fs.root(), "busy.bin", b"busy")?;

    let s = fs.get_input_stream("busy.bin")?;
    sink.take();

    fs.delete_file("busy.bin")?;
    assert!(!fs.exists("busy.bin"));

    // Детальный dump: заголовок + один "opened by"
    let lines = sink.take();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].message.ends_with("busy.bin, 1"));
    assert!(lines[1].stream_id.is_some());

    // Поток всё ещё учтён, пока не закрыт
    assert!(fs.is_open("busy.bin"));
    drop(s);
    assert!(!fs.is_open("busy.bin"));
    Ok(())
}

#[test]
fn strict_mode_refuses_busy_delete_and_rename() -> Result<()> {
    let (fs, sink) = monitored_fs("fs-strict", true);
    write_file(fs.root(), "locked", b"locked")?;

    let mut s1 = fs.get_input_stream("locked")?;
    let s2 = fs.get_input_stream("locked")?;

    match fs.delete_file("locked") {
        Err(HandleError::StillOpen { count, .. }) => assert_eq!(count, 2),
        other => panic!("expected StillOpen, got {other:?}"),
    }
    assert!(fs.exists("locked"));
    assert!(matches!(
        fs.rename("locked", "moved"),
        Err(HandleError::StillOpen { count: 2, .. })
    ));
    assert!(!sink.take().is_empty(), "refusal must be accompanied by a dump");

    s1.close()?;
    drop(s2);

    fs.rename("locked", "moved")?;
    assert!(fs.exists("moved"));
    fs.delete_file("moved")?;
    assert!(!fs.exists("moved"));
    assert!(sink.take().is_empty(), "no diagnostics for idle files");
    Ok(())
}

#[test]
fn delete_missing_file_is_not_found() -> Result<()> {
    let (fs, _sink) = monitored_fs("fs-missing", false);
    let e = fs.delete_file("ghost").unwrap_err();
    assert!(e.is_not_found());
    let e = fs.rename("ghost", "ghost2").unwrap_err();
    assert!(e.is_not_found());
    Ok(())
}
