//! Connection registry behaviour: one writer per path, also under
//! concurrent first access.

use std::sync::{Arc, Barrier};
use std::thread;

use chrono::Utc;
use loglake::{record_with_timestamp, ConnectionRegistry, Record, Value};
use tempfile::TempDir;

fn sample_record() -> Record {
    record_with_timestamp(
        Utc::now(),
        Record::from([("title".to_string(), Value::Text("hello".to_string()))]),
    )
}

#[test]
fn creates_a_working_writer_and_parent_directories() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("deep").join("store.db");
    let registry = ConnectionRegistry::new();

    let writer = registry.get_or_create(&path).unwrap();
    writer.write("timeline", sample_record()).unwrap();

    assert!(path.exists());
    drop(writer);
    registry.close_all();
}

#[test]
fn same_path_returns_the_same_writer() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("store.db");
    let registry = ConnectionRegistry::new();

    let first = registry.get_or_create(&path).unwrap();
    let second = registry.get_or_create(&path).unwrap();
    assert!(Arc::ptr_eq(&first, &second));

    drop((first, second));
    registry.close_all();
}

#[test]
fn different_paths_get_different_writers() {
    let dir = TempDir::new().unwrap();
    let registry = ConnectionRegistry::new();

    let a = registry.get_or_create(dir.path().join("a.db")).unwrap();
    let b = registry.get_or_create(dir.path().join("b.db")).unwrap();
    assert!(!Arc::ptr_eq(&a, &b));

    drop((a, b));
    registry.close_all();
}

#[test]
fn concurrent_first_access_opens_one_writer() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("store.db");
    let registry = ConnectionRegistry::new();
    let barrier = Barrier::new(8);

    let writers: Vec<_> = thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|_| {
                scope.spawn(|| {
                    barrier.wait();
                    registry.get_or_create(&path).unwrap()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    for writer in &writers[1..] {
        assert!(Arc::ptr_eq(&writers[0], writer));
    }

    drop(writers);
    registry.close_all();
}

#[test]
fn concurrent_writes_through_a_shared_writer_succeed() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("store.db");
    let registry = ConnectionRegistry::new();

    // Prime the table; concurrent CREATE TABLE is not part of the contract
    registry
        .get_or_create(&path)
        .unwrap()
        .write("timeline", sample_record())
        .unwrap();

    thread::scope(|scope| {
        for _ in 0..4 {
            scope.spawn(|| {
                let writer = registry.get_or_create(&path).unwrap();
                for _ in 0..5 {
                    writer.write("timeline", sample_record()).unwrap();
                }
            });
        }
    });

    let writer = registry.get_or_create(&path).unwrap();
    writer.write("timeline", sample_record()).unwrap();
    drop(writer);
    registry.close_all();
}

#[test]
fn close_removes_the_entry_and_allows_reopening() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("store.db");
    let registry = ConnectionRegistry::new();

    let writer = registry.get_or_create(&path).unwrap();
    writer.write("timeline", sample_record()).unwrap();
    drop(writer);
    registry.close(&path);

    // A fresh writer opens against the same file
    let reopened = registry.get_or_create(&path).unwrap();
    reopened.write("timeline", sample_record()).unwrap();
    drop(reopened);
    registry.close_all();
}

#[test]
fn close_all_empties_the_pool() {
    let dir = TempDir::new().unwrap();
    let registry = ConnectionRegistry::new();

    let a = registry.get_or_create(dir.path().join("a.db")).unwrap();
    let b = registry.get_or_create(dir.path().join("b.db")).unwrap();
    drop((a, b));
    registry.close_all();

    // The pool repopulates from scratch afterwards
    let a_again = registry.get_or_create(dir.path().join("a.db")).unwrap();
    a_again.write("timeline", sample_record()).unwrap();
    drop(a_again);
    registry.close_all();
}

#[test]
fn process_global_registry_is_shared() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("global.db");

    let writer = loglake::registry().get_or_create(&path).unwrap();
    let again = loglake::registry().get_or_create(&path).unwrap();
    assert!(Arc::ptr_eq(&writer, &again));

    writer.write("timeline", sample_record()).unwrap();
    drop((writer, again));
    loglake::registry().close(&path);
}
