// tests/cli_commands.rs
//
// Команды CLI, вызванные как библиотечные функции:
// - scan: открыть/прочитать файлы, закрыть всё кроме keep, отчёт, закрыть остальное;
//   после команды монитор пуст при любом keep;
// - rm --hold --strict: отказ с HandleError::StillOpen, файл на месте;
// - rm без hold: файл удалён.
//
// Запуск:
//   cargo test --test cli_commands -- --nocapture

mod common;

use anyhow::Result;
use handlemon::cli::admin::{cmd_rm, rm_file, scan_files};
use handlemon::{HandleError, HandleMonitor, LocalFileSystem, LocalOpener};

use common::{quiet_config, unique_root, write_file, CollectingSink};

fn scan_fs(prefix: &str) -> Result<(LocalFileSystem, std::sync::Arc<HandleMonitor>)> {
    let root = unique_root(prefix);
    write_file(&root, "a.txt", b"alpha")?;
    write_file(&root, "b.txt", b"bravo")?;
    write_file(&root, "c.txt", b"charlie")?;
    let m = HandleMonitor::with_parts(
        quiet_config().with_enabled(true),
        Box::new(LocalOpener),
        CollectingSink::new(),
    );
    Ok((LocalFileSystem::with_monitor(root, m.clone()), m))
}

fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

#[test]
fn scan_without_kept_streams_leaves_nothing_open() -> Result<()> {
    let (fs, m) = scan_fs("scan-keep0")?;
    scan_files(&fs, &names(&["a.txt", "b.txt", "/c.txt"]), 0, false)?;

    assert!(m.report(false).is_empty());
    let metrics = m.metrics();
    assert_eq!(metrics.streams_opened, 3);
    assert_eq!(metrics.streams_closed, 3);
    assert_eq!(metrics.groups_removed, 3);
    Ok(())
}

#[test]
fn scan_with_kept_stream_closes_it_after_report() -> Result<()> {
    let (fs, m) = scan_fs("scan-keep1")?;
    // Один путь дважды: группа живёт до закрытия последнего потока
    scan_files(&fs, &names(&["a.txt", "b.txt", "b.txt"]), 1, true)?;

    assert!(m.report(false).is_empty());
    assert!(m.tracked_paths().is_empty());
    assert_eq!(m.metrics().streams_closed, 3);
    assert_eq!(m.metrics().groups_created, 2);
    Ok(())
}

#[test]
fn scan_keep_larger_than_file_count_is_fine() -> Result<()> {
    let (fs, m) = scan_fs("scan-keep-all")?;
    scan_files(&fs, &names(&["a.txt"]), 5, false)?;
    assert!(m.report(false).is_empty());
    Ok(())
}

#[test]
fn scan_of_missing_file_fails_and_releases_opened_streams() -> Result<()> {
    let (fs, m) = scan_fs("scan-missing")?;
    let err = scan_files(&fs, &names(&["a.txt", "nope.txt"]), 0, false).unwrap_err();

    let he = err.downcast_ref::<HandleError>().expect("typed error behind context");
    assert!(he.is_not_found());
    // Уже открытые потоки закрылись через Drop
    assert!(m.report(false).is_empty());
    Ok(())
}

#[test]
fn scan_requires_enabled_monitor() -> Result<()> {
    let root = unique_root("scan-off");
    write_file(&root, "a.txt", b"a")?;
    let fs = LocalFileSystem::new(&root, quiet_config());
    assert!(scan_files(&fs, &names(&["a.txt"]), 0, false).is_err());
    Ok(())
}

#[test]
fn rm_hold_strict_is_refused_and_file_stays() -> Result<()> {
    let root = unique_root("rm-strict");
    let p = write_file(&root, "held.bin", b"held")?;

    let err = cmd_rm(root.clone(), "held.bin".to_string(), true, true).unwrap_err();
    match err.downcast_ref::<HandleError>() {
        Some(HandleError::StillOpen { count, .. }) => assert_eq!(*count, 1),
        other => panic!("expected StillOpen, got {other:?}"),
    }
    assert!(p.exists(), "refused delete must leave the file in place");
    Ok(())
}

#[test]
fn rm_without_hold_deletes_file() -> Result<()> {
    let root = unique_root("rm-plain");
    let p = write_file(&root, "gone.bin", b"gone")?;

    cmd_rm(root.clone(), "gone.bin".to_string(), false, true)?;
    assert!(!p.exists());

    // Второй раз: файла уже нет
    let err = cmd_rm(root, "gone.bin".to_string(), false, false).unwrap_err();
    assert!(err
        .downcast_ref::<HandleError>()
        .is_some_and(|e| e.is_not_found()));
    Ok(())
}

#[test]
fn rm_with_held_stream_releases_it() -> Result<()> {
    let root = unique_root("rm-hold");
    write_file(&root, "h.bin", b"h")?;
    let m = HandleMonitor::with_parts(
        quiet_config().with_enabled(true),
        Box::new(LocalOpener),
        CollectingSink::new(),
    );
    let fs = LocalFileSystem::with_monitor(&root, m.clone());

    rm_file(&fs, "h.bin", true)?;
    assert!(!fs.exists("h.bin"));
    assert!(!fs.is_open("h.bin"), "held stream must be closed after rm");
    assert_eq!(m.metrics().streams_closed, 1);
    Ok(())
}
