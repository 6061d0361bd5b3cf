//! `start` runs registration, persistence and loading in order

use crate::common::*;
use strataconf::start;

#[test]
fn start_loads_previous_session() {
    let dir = tempfile::TempDir::new().unwrap();

    let first = start(dir.path(), |ctx| {
        ctx.persist::<LogName>()?;
        Ok(())
    })
    .unwrap();
    assert!(first.report.restored.is_empty());
    first
        .context
        .store::<LogName>()
        .unwrap()
        .set("main", "main.log")
        .unwrap();
    first.cache.dump_all(&first.context).unwrap();

    let second = start(dir.path(), |ctx| {
        ctx.persist::<LogName>()?;
        Ok(())
    })
    .unwrap();
    assert_eq!(second.report.restored, vec!["Dump", "LogName"]);
    assert_eq!(
        second.context.store::<LogName>().unwrap().get("main").unwrap(),
        Value::from("main.log")
    );
}

#[test]
fn start_keeps_stores_new_since_last_dump() {
    let dir = tempfile::TempDir::new().unwrap();

    let first = start(dir.path(), |ctx| {
        ctx.persist::<LogName>()?;
        Ok(())
    })
    .unwrap();
    first.cache.dump_all(&first.context).unwrap();

    let second = start(dir.path(), |ctx| {
        ctx.persist::<LogName>()?;
        ctx.persist::<RunInfo>()?;
        Ok(())
    })
    .unwrap();
    assert!(second.context.dump_registry().contains("RunInfo"));
    second
        .context
        .store::<RunInfo>()
        .unwrap()
        .set("STARTED", 2.5)
        .unwrap();
    let dumped = second.cache.dump_all(&second.context).unwrap();
    assert!(dumped.written.iter().any(|name| name == "RunInfo"));

    let third = start(dir.path(), |ctx| {
        ctx.persist::<LogName>()?;
        ctx.persist::<RunInfo>()?;
        Ok(())
    })
    .unwrap();
    assert_eq!(
        third.context.store::<RunInfo>().unwrap().get("STARTED").unwrap(),
        Value::Float(2.5)
    );
}
