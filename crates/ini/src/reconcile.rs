//! Repair of generated files
//!
//! The relational schema decides which sections and options exist; the
//! previous file decides the values of the ones that survive. Options the
//! schema no longer has are dropped.

use std::path::Path;
use tracing::info;

use crate::error::{IniError, Result};
use crate::generate::generate;
use crate::parser::CommentedIni;
use crate::source::RelationalSource;

/// Merge a freshly generated document with a previous one.
///
/// The previous text is read leniently, so a damaged file still donates
/// whatever values can be recovered from it.
pub fn reconcile_str(fresh: &str, previous: &str) -> Result<CommentedIni> {
    let mut merged = CommentedIni::new();
    merged.read_str(fresh)?;

    merged.set_lenient(true);
    let overlaid = merged.overlay_str(previous);
    merged.set_lenient(false);
    overlaid?;
    Ok(merged)
}

/// Rebuild `path` from the source, keeping the values edited into it.
///
/// # Errors
///
/// `SourceUnreadable` if `path` cannot be read. The file is only rewritten
/// once the merge has succeeded; on any error it is left untouched.
pub fn fix(
    source: &dyn RelationalSource,
    path: impl AsRef<Path>,
    sort_order: &[&str],
) -> Result<CommentedIni> {
    let path = path.as_ref();
    let previous = std::fs::read_to_string(path).map_err(|e| IniError::SourceUnreadable {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let fresh = generate(source, sort_order)?;
    let merged = reconcile_str(&fresh, &previous)?;
    merged.write_path(path)?;
    info!(target: "strataconf::ini", path = %path.display(), sections = merged.sections().len(), "Repaired file");
    Ok(merged)
}
