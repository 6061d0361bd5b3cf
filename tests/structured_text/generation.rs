//! Rendering relational sources as INI files

use strataconf::ini::{create, generate, ini_path_for, TABLE_COMMENT_ROW};
use strataconf::{CommentedIni, MemorySource, Row};
use tempfile::TempDir;

fn adm() -> MemorySource {
    let mut source = MemorySource::new();
    source
        .add_row("Paths", Row::new("assets", Some("core/assets"), None))
        .add_row("Global", Row::new(TABLE_COMMENT_ROW, None, Some("global settings")))
        .add_row("Global", Row::new("debug", Some("false"), Some("enable debug mode")))
        .add_row("Global", Row::new("user", None, None));
    source
}

#[test]
fn generated_text_parses_back() {
    let text = generate(&adm(), &["Global"]).unwrap();
    assert_eq!(
        text,
        "; global settings\n[Global]\n; enable debug mode\ndebug = false\nuser = \n\n\
         [Paths]\nassets = core/assets\n"
    );

    let mut ini = CommentedIni::new();
    ini.read_str(&text).unwrap();
    assert_eq!(ini.sections(), vec!["Global", "Paths"]);
    assert_eq!(ini.section_comment("Global").unwrap(), "global settings");
    assert_eq!(ini.comment("Global", "debug").unwrap(), "enable debug mode");
    assert_eq!(ini.get("Global", "user").unwrap(), Some(""));
    assert_eq!(ini.to_string(), text);
}

#[test]
fn create_writes_next_to_config_dir() {
    let dir = TempDir::new().unwrap();
    let path = ini_path_for("core/assets/ADM.db", dir.path().join("config"));
    assert!(path.ends_with("config/ADM.ini"));

    assert!(create(&adm(), &path, &[], false).unwrap());
    assert!(!create(&adm(), &path, &[], false).unwrap());

    let text = std::fs::read_to_string(&path).unwrap();
    assert!(text.starts_with("[Paths]\n"));
}

#[cfg(feature = "sqlite")]
mod sqlite {
    use super::*;
    use rusqlite::Connection;
    use strataconf::SqliteSource;

    fn database(dir: &TempDir) -> std::path::PathBuf {
        let path = dir.path().join("ADM.db");
        let conn = Connection::open(&path).unwrap();
        conn.execute_batch(
            "CREATE TABLE Global (name TEXT, value, comment TEXT);
             INSERT INTO Global VALUES ('__table_comment', NULL, 'global settings');
             INSERT INTO Global VALUES ('debug', 'false', 'enable debug mode');
             INSERT INTO Global VALUES ('retries', 3, '');
             CREATE TABLE Window (name TEXT, value, comment TEXT);
             INSERT INTO Window VALUES ('width', 800, NULL);",
        )
        .unwrap();
        path
    }

    #[test]
    fn generate_from_database() {
        let dir = TempDir::new().unwrap();
        let source = SqliteSource::open(database(&dir)).unwrap();

        let text = generate(&source, &["Window"]).unwrap();
        assert_eq!(
            text,
            "[Window]\nwidth = 800\n\n\
             ; global settings\n[Global]\n; enable debug mode\ndebug = false\nretries = 3\n"
        );
    }

    #[test]
    fn create_from_database_path() {
        let dir = TempDir::new().unwrap();
        let db = database(&dir);
        let source = SqliteSource::open(&db).unwrap();
        let path = ini_path_for(&db, dir.path().join("config"));

        assert!(create(&source, &path, &[], false).unwrap());
        let mut ini = CommentedIni::new();
        ini.read_path(&path).unwrap();
        assert_eq!(ini.get("Global", "retries").unwrap(), Some("3"));
        assert!(!ini.has_comment("Global", "retries"));
    }
}
