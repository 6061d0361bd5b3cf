//! Regenerating a hand-edited file from its source

use strataconf::ini::{create, fix, reconcile_str, TABLE_COMMENT_ROW};
use strataconf::{IniError, MemorySource, Row};
use tempfile::TempDir;

fn schema_v1() -> MemorySource {
    let mut source = MemorySource::new();
    source
        .add_row("Global", Row::new(TABLE_COMMENT_ROW, None, Some("global settings")))
        .add_row("Global", Row::new("debug", Some("false"), Some("enable debug mode")))
        .add_row("Global", Row::new("theme", Some("light"), None))
        .add_row("Legacy", Row::new("mode", Some("1"), None));
    source
}

fn schema_v2() -> MemorySource {
    let mut source = schema_v1();
    source.remove_table("Legacy");
    source
        .add_row("Global", Row::new("theme", Some("light"), Some("ui theme")))
        .add_row("Global", Row::new("lang", Some("en"), None));
    source
}

#[test]
fn upgrade_keeps_user_values_and_adopts_new_schema() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("ADM.ini");
    create(&schema_v1(), &path, &[], false).unwrap();

    // user edits
    let edited = std::fs::read_to_string(&path)
        .unwrap()
        .replace("theme = light", "theme = dark")
        .replace("mode = 1", "mode = 2");
    std::fs::write(&path, edited).unwrap();

    let merged = fix(&schema_v2(), &path, &[]).unwrap();
    assert_eq!(merged.get("Global", "theme").unwrap(), Some("dark"));
    assert_eq!(merged.get("Global", "lang").unwrap(), Some("en"));
    assert_eq!(merged.get("Global", "debug").unwrap(), Some("false"));
    assert_eq!(merged.comment("Global", "theme").unwrap(), "ui theme");
    assert!(!merged.has_section("Legacy"));

    assert_eq!(
        std::fs::read_to_string(&path).unwrap(),
        "; global settings\n[Global]\n; enable debug mode\ndebug = false\n\
         ; ui theme\ntheme = dark\nlang = en\n"
    );
}

#[test]
fn fix_is_stable() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("ADM.ini");
    create(&schema_v1(), &path, &[], false).unwrap();

    fix(&schema_v1(), &path, &[]).unwrap();
    let once = std::fs::read_to_string(&path).unwrap();
    fix(&schema_v1(), &path, &[]).unwrap();
    assert_eq!(std::fs::read_to_string(&path).unwrap(), once);
}

#[test]
fn fresh_text_must_be_well_formed() {
    let err = reconcile_str("[A]\n[A]\n", "").unwrap_err();
    assert!(matches!(err, IniError::DuplicateSection { .. }));
}

#[test]
fn fix_without_file_fails_untouched() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("ADM.ini");
    assert!(matches!(
        fix(&schema_v1(), &path, &[]),
        Err(IniError::SourceUnreadable { .. })
    ));
    assert!(!path.exists());
}
