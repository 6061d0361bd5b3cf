//! Corrupted or missing cache content degrades to defaults

use crate::common::*;

fn blob_of(app: &TestApp, store: &str) -> std::path::PathBuf {
    let entry = app.cache.manifest().unwrap().get(store).cloned().unwrap();
    app.cache.paths().blob(&entry.filename)
}

#[test]
fn corrupted_blob_leaves_defaults_and_purges_entry() {
    let app = TestApp::new();
    let folder = app.store::<Folder>();
    folder.set("TEMP", Value::from(&["tmp"][..])).unwrap();
    app.cache.dump_all(&app.ctx).unwrap();

    let blob = blob_of(&app, "Folder");
    let mut bytes = std::fs::read(&blob).unwrap();
    let last = bytes.len() - 1;
    bytes[last] ^= 0xff;
    std::fs::write(&blob, bytes).unwrap();

    let ctx = app.restart();
    let report = app.cache.load_all(&ctx).unwrap();
    assert_eq!(report.purged, vec!["Folder"]);

    let folder = ctx.store::<Folder>().unwrap();
    assert!(!folder.contains("TEMP"));
    assert_eq!(folder.len(), 3);
    assert!(app.cache.manifest().unwrap().get("Folder").is_none());
    assert!(!blob.exists());
}

#[test]
fn hand_edited_hash_is_a_cache_miss() {
    let app = TestApp::new();
    app.store::<LogName>().set("main", "main.log").unwrap();
    app.cache.dump_all(&app.ctx).unwrap();

    let mut manifest = app.cache.manifest().unwrap();
    let mut entry = manifest.get("LogName").cloned().unwrap();
    entry.hash_check = "0".repeat(64);
    manifest.insert("LogName", entry);
    manifest.write(&app.cache.paths().manifest(), true).unwrap();

    let ctx = app.restart();
    let report = app.cache.load_all(&ctx).unwrap();
    assert_eq!(report.purged, vec!["LogName"]);
    assert!(ctx.store::<LogName>().unwrap().is_empty());
}

#[test]
fn unreadable_manifest_resets_directory() {
    let app = TestApp::new();
    app.cache.dump_all(&app.ctx).unwrap();
    std::fs::write(app.cache.paths().manifest(), "{{{").unwrap();

    let ctx = app.restart();
    let report = app.cache.load_all(&ctx).unwrap();
    assert!(report.reset);
    let files: Vec<_> = std::fs::read_dir(app.dir.path()).unwrap().collect();
    assert_eq!(files.len(), 1);

    // the next dump starts over cleanly
    app.cache.dump_all(&ctx).unwrap();
    assert_eq!(app.cache.manifest().unwrap().len(), 4);
}
