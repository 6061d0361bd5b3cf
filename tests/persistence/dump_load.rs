//! Dump then load restores every persisted store

use crate::common::*;

#[test]
fn dump_then_load_restores_values() {
    let app = TestApp::new();
    let folder = app.store::<Folder>();
    folder.set_readonly("LOGS", false).unwrap();
    folder.set("LOGS", Value::from(&["var", "log"][..])).unwrap();
    folder.set("TEMP", Value::from(&["tmp"][..])).unwrap();
    app.store::<LogName>().set("main", "main.log").unwrap();
    app.store::<RunInfo>().set("STARTED", 1.5).unwrap();

    let before_folder = contents(&folder);
    let before_logs = contents(&app.store::<LogName>());
    let before_run = contents(&app.store::<RunInfo>());

    app.cache.dump_all(&app.ctx).unwrap();

    let ctx = app.restart();
    let report = app.cache.load_all(&ctx).unwrap();
    assert!(report.purged.is_empty());
    assert_eq!(report.restored.len(), 4);

    assert_eq!(contents(&ctx.store::<Folder>().unwrap()), before_folder);
    assert_eq!(contents(&ctx.store::<LogName>().unwrap()), before_logs);
    assert_eq!(contents(&ctx.store::<RunInfo>().unwrap()), before_run);
    assert_eq!(
        ctx.store::<Folder>().unwrap().get("LOGS").unwrap(),
        Value::from("var/log")
    );
}

#[test]
fn double_dump_then_load_is_idempotent() {
    let app = TestApp::new();
    app.store::<LogName>().set("audit", "audit.log").unwrap();

    app.cache.dump_all(&app.ctx).unwrap();
    app.cache.dump_all(&app.ctx).unwrap();

    // one blob per store plus the manifest
    let files = std::fs::read_dir(app.dir.path()).unwrap().count();
    assert_eq!(files, 4 + 1);

    let ctx = app.restart();
    app.cache.load_all(&ctx).unwrap();
    assert_eq!(
        ctx.store::<LogName>().unwrap().get("audit").unwrap(),
        Value::from("audit.log")
    );
}

#[test]
fn restored_fence_and_flags() {
    let app = TestApp::new();
    app.store::<LogName>().set("main", "main.log").unwrap();
    app.cache.dump_all(&app.ctx).unwrap();

    let ctx = app.restart();
    app.cache.load_all(&ctx).unwrap();

    let logs = ctx.store::<LogName>().unwrap();
    assert_eq!(logs.fence(), Some(ValueKind::String));
    assert!(logs.set("count", 3).is_err());

    let folder = ctx.store::<Folder>().unwrap();
    assert!(folder.is_readonly("CACHE").unwrap());
}

#[test]
fn removed_fields_stay_removed() {
    let app = TestApp::new();
    app.store::<RunInfo>().remove("PID").unwrap();
    app.cache.dump_all(&app.ctx).unwrap();

    let ctx = app.restart();
    app.cache.load_all(&ctx).unwrap();
    let run = ctx.store::<RunInfo>().unwrap();
    assert!(!run.contains("PID"));
    assert_eq!(run.names(), vec!["SYSTEM"]);
}

#[test]
fn registry_membership_survives_restart() {
    let app = TestApp::new();
    app.cache.dump_all(&app.ctx).unwrap();

    // the new process only registers the kinds, it does not persist them
    let ctx = AppContext::new().unwrap();
    ctx.stores().register::<Folder>().unwrap();
    ctx.stores().register::<RunInfo>().unwrap();
    ctx.stores().register::<LogName>().unwrap();
    app.cache.load_all(&ctx).unwrap();

    let mut names: Vec<String> = ctx.persisted().into_iter().map(|(n, _)| n).collect();
    names.sort();
    assert_eq!(names, vec!["Dump", "Folder", "LogName", "RunInfo"]);
    assert!(ctx.dump_registry().is_readonly("Dump").unwrap());
}
