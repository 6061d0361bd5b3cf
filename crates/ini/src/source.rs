//! Relational sources
//!
//! The generator reads tables of `(name, value, comment)` rows. Each table
//! becomes a section and each row an option; a row named
//! [`TABLE_COMMENT_ROW`] carries the section comment instead.

use indexmap::IndexMap;

use crate::error::{IniError, Result};

/// Row whose comment is the comment of its whole table
pub const TABLE_COMMENT_ROW: &str = "__table_comment";

/// One row of a relational table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    /// Option name
    pub name: String,
    /// Option value; `None` for NULL
    pub value: Option<String>,
    /// Comment shown above the option
    pub comment: Option<String>,
}

impl Row {
    /// Build a row
    pub fn new(name: &str, value: Option<&str>, comment: Option<&str>) -> Self {
        Row {
            name: name.to_string(),
            value: value.map(str::to_string),
            comment: comment.map(str::to_string),
        }
    }
}

/// Read-only view of a relational database
pub trait RelationalSource {
    /// Table names, in the order the engine returns them
    fn tables(&self) -> Result<Vec<String>>;

    /// Row names of a table, in the order the engine returns them
    fn row_names(&self, table: &str) -> Result<Vec<String>>;

    /// Value and comment of a row
    fn row(&self, table: &str, name: &str) -> Result<Row>;
}

// =============================================================================
// In-memory source
// =============================================================================

/// Ordered in-memory tables
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    tables: IndexMap<String, IndexMap<String, Row>>,
}

impl MemorySource {
    /// Empty source
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an empty table, keeping it if it exists
    pub fn add_table(&mut self, table: &str) -> &mut Self {
        self.tables.entry(table.to_string()).or_default();
        self
    }

    /// Add or replace a row, creating the table if needed
    pub fn add_row(&mut self, table: &str, row: Row) -> &mut Self {
        self.tables
            .entry(table.to_string())
            .or_default()
            .insert(row.name.clone(), row);
        self
    }

    /// Drop a table
    pub fn remove_table(&mut self, table: &str) -> bool {
        self.tables.shift_remove(table).is_some()
    }

    fn table(&self, table: &str) -> Result<&IndexMap<String, Row>> {
        self.tables
            .get(table)
            .ok_or_else(|| IniError::Source(format!("no such table: {}", table)))
    }
}

impl RelationalSource for MemorySource {
    fn tables(&self) -> Result<Vec<String>> {
        Ok(self.tables.keys().cloned().collect())
    }

    fn row_names(&self, table: &str) -> Result<Vec<String>> {
        Ok(self.table(table)?.keys().cloned().collect())
    }

    fn row(&self, table: &str, name: &str) -> Result<Row> {
        self.table(table)?
            .get(name)
            .cloned()
            .ok_or_else(|| IniError::Source(format!("no row '{}' in table {}", name, table)))
    }
}

// =============================================================================
// SQLite source
// =============================================================================

#[cfg(feature = "sqlite")]
pub use self::sqlite::SqliteSource;

#[cfg(feature = "sqlite")]
mod sqlite {
    use rusqlite::types::ValueRef;
    use rusqlite::{params, Connection, OpenFlags, OptionalExtension};
    use std::path::{Path, PathBuf};

    use super::{RelationalSource, Row};
    use crate::error::{IniError, Result};

    /// SQLite database whose tables have `name`, `value` and `comment` columns
    pub struct SqliteSource {
        conn: Connection,
        path: Option<PathBuf>,
    }

    impl SqliteSource {
        /// Open an existing database read-only.
        ///
        /// # Errors
        ///
        /// `SourceUnreadable` if the file is missing or is not a database.
        pub fn open(path: impl AsRef<Path>) -> Result<Self> {
            let path = path.as_ref();
            let unreadable = |message: String| IniError::SourceUnreadable {
                path: path.to_path_buf(),
                message,
            };
            if !path.is_file() {
                return Err(unreadable("no such file".to_string()));
            }
            let conn = Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY)
                .map_err(|e| unreadable(e.to_string()))?;
            // Opening is lazy; touch the schema so a non-database fails here
            conn.query_row("SELECT count(*) FROM sqlite_master", [], |row| {
                row.get::<_, i64>(0)
            })
            .map_err(|e| unreadable(e.to_string()))?;
            Ok(SqliteSource {
                conn,
                path: Some(path.to_path_buf()),
            })
        }

        /// Wrap an open connection
        pub fn from_connection(conn: Connection) -> Self {
            SqliteSource { conn, path: None }
        }

        /// Path the database was opened from
        pub fn path(&self) -> Option<&Path> {
            self.path.as_deref()
        }
    }

    fn quote(table: &str) -> String {
        format!("\"{}\"", table.replace('"', "\"\""))
    }

    fn render(value: ValueRef<'_>) -> Option<String> {
        match value {
            ValueRef::Null => None,
            ValueRef::Integer(i) => Some(i.to_string()),
            ValueRef::Real(f) => Some(f.to_string()),
            ValueRef::Text(t) | ValueRef::Blob(t) => Some(String::from_utf8_lossy(t).into_owned()),
        }
    }

    impl RelationalSource for SqliteSource {
        fn tables(&self) -> Result<Vec<String>> {
            let mut stmt = self.conn.prepare(
                "SELECT tbl_name FROM sqlite_master \
                 WHERE type = 'table' AND tbl_name NOT LIKE 'sqlite_%'",
            )?;
            let names = stmt
                .query_map([], |row| row.get::<_, String>(0))?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(names)
        }

        fn row_names(&self, table: &str) -> Result<Vec<String>> {
            let mut stmt = self
                .conn
                .prepare(&format!("SELECT name FROM {}", quote(table)))?;
            let names = stmt
                .query_map([], |row| Ok(render(row.get_ref(0)?).unwrap_or_default()))?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(names)
        }

        fn row(&self, table: &str, name: &str) -> Result<Row> {
            let sql = format!(
                "SELECT value, comment FROM {} WHERE name = ?1",
                quote(table)
            );
            let found = self
                .conn
                .query_row(&sql, params![name], |row| {
                    Ok(Row {
                        name: name.to_string(),
                        value: render(row.get_ref(0)?),
                        comment: render(row.get_ref(1)?),
                    })
                })
                .optional()?;
            found.ok_or_else(|| IniError::Source(format!("no row '{}' in table {}", name, table)))
        }
    }

}
