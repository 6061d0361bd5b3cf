//! Structured-text configuration files for strataconf
//!
//! - CommentedIni: INI documents that keep single-line comments attached to
//!   sections and options
//! - RelationalSource: tables of `(name, value, comment)` rows, in memory or
//!   in SQLite (`sqlite` feature)
//! - generate / create: render a source as an INI file
//! - fix: regenerate a file from its source while keeping edited values

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod generate;
pub mod parser;
pub mod reconcile;
pub mod source;

pub use error::{IniError, Result};
pub use generate::{create, generate, ini_path_for};
pub use parser::{CommentedIni, COMMENT_PREFIX};
pub use reconcile::{fix, reconcile_str};
#[cfg(feature = "sqlite")]
pub use source::SqliteSource;
pub use source::{MemorySource, RelationalSource, Row, TABLE_COMMENT_ROW};
