//! Structured-text generation from a relational source
//!
//! Every table becomes a section, every row an option. Tables are ordered by
//! their position in the caller's sort order; unlisted tables follow in the
//! order the source returns them.

use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::Result;
use crate::parser::{check_option_name, check_section_name, check_text, COMMENT_PREFIX};
use crate::source::{RelationalSource, TABLE_COMMENT_ROW};

/// Render the whole source as INI text.
///
/// NULL values render as an empty value (`name = `). Rows with an empty or
/// NULL comment get no comment line.
///
/// # Errors
///
/// `InvalidText` for a line break in a value or comment and `InvalidName` for
/// a table or row name that would not read back unchanged. Nothing is
/// rendered in either case.
pub fn generate(source: &dyn RelationalSource, sort_order: &[&str]) -> Result<String> {
    let mut tables = source.tables()?;
    // sort_by_key is stable, so unlisted tables keep their relative order
    tables.sort_by_key(|table| {
        sort_order
            .iter()
            .position(|listed| listed == table)
            .unwrap_or(sort_order.len())
    });

    let mut sections = Vec::with_capacity(tables.len());
    for table in &tables {
        let mut lines = Vec::new();
        let mut names = source.row_names(table)?;

        check_section_name(table)?;
        if let Some(pos) = names.iter().position(|n| n == TABLE_COMMENT_ROW) {
            names.remove(pos);
            let row = source.row(table, TABLE_COMMENT_ROW)?;
            if let Some(comment) = row.comment.filter(|c| !c.is_empty()) {
                check_text(&format!("comment of table {}", table), &comment)?;
                lines.push(format!("{}{}", COMMENT_PREFIX, comment));
            }
        }
        lines.push(format!("[{}]", table));

        for name in &names {
            check_option_name(name)?;
            let row = source.row(table, name)?;
            if let Some(comment) = row.comment.filter(|c| !c.is_empty()) {
                check_text(&format!("comment of {}.{}", table, name), &comment)?;
                lines.push(format!("{}{}", COMMENT_PREFIX, comment));
            }
            let value = row.value.unwrap_or_default();
            check_text(&format!("value of {}.{}", table, name), &value)?;
            lines.push(format!("{} = {}", name, value));
        }
        debug!(target: "strataconf::ini", table = %table, options = names.len(), "Rendered section");
        sections.push(lines.join("\n"));
    }

    if sections.is_empty() {
        return Ok(String::new());
    }
    let mut text = sections.join("\n\n");
    text.push('\n');
    Ok(text)
}

/// Generate `path` from the source.
///
/// An existing file is left alone unless `overwrite` is set, since
/// regenerating discards every edit made to it. Returns whether the file was
/// written.
pub fn create(
    source: &dyn RelationalSource,
    path: impl AsRef<Path>,
    sort_order: &[&str],
    overwrite: bool,
) -> Result<bool> {
    let path = path.as_ref();
    if !overwrite && path.is_file() {
        debug!(target: "strataconf::ini", path = %path.display(), "File exists, not regenerating");
        return Ok(false);
    }
    let text = generate(source, sort_order)?;
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    std::fs::write(path, text)?;
    info!(target: "strataconf::ini", path = %path.display(), "Generated file");
    Ok(true)
}

/// `<config_dir>/<stem>.ini` for a database at `db_path`
pub fn ini_path_for(db_path: impl AsRef<Path>, config_dir: impl AsRef<Path>) -> PathBuf {
    let stem = db_path
        .as_ref()
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    config_dir.as_ref().join(format!("{}.ini", stem))
}
