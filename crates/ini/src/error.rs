//! Error types for structured-text documents

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for document operations
pub type Result<T> = std::result::Result<T, IniError>;

fn at_line(line: &Option<usize>) -> String {
    match line {
        Some(n) => format!(" (line {})", n),
        None => String::new(),
    }
}

/// Structured-text errors
#[derive(Debug, Error)]
pub enum IniError {
    /// The section does not exist
    #[error("no section '{0}'")]
    NoSuchSection(String),

    /// The option does not exist in the section
    #[error("no option '{option}' in section '{section}'")]
    NoSuchOption {
        /// Section name
        section: String,
        /// Option name
        option: String,
    },

    /// The option has no comment attached
    #[error("option '{option}' in section '{section}' has no comment")]
    NoComment {
        /// Section name
        section: String,
        /// Option name
        option: String,
    },

    /// The section has no comment attached
    #[error("section '{0}' has no comment")]
    NoSectionComment(String),

    /// The section appears twice
    #[error("section '{section}' already exists{}", at_line(.line))]
    DuplicateSection {
        /// Section name
        section: String,
        /// Line of the second header, when parsing
        line: Option<usize>,
    },

    /// The option appears twice in one section of one source
    #[error("option '{option}' in section '{section}' already exists{}", at_line(.line))]
    DuplicateOption {
        /// Section name
        section: String,
        /// Option name
        option: String,
        /// Line of the second assignment, when parsing
        line: Option<usize>,
    },

    /// An option precedes the first section header
    #[error("option outside of any section at line {line}")]
    MissingSectionHeader {
        /// Offending line
        line: usize,
    },

    /// An indented line continues the previous value
    #[error("values cannot span lines (line {line})")]
    MultilineValue {
        /// Offending line
        line: usize,
    },

    /// A line is neither a header, an option nor a comment
    #[error("malformed line {line}: '{content}'")]
    Malformed {
        /// Offending line
        line: usize,
        /// Line content
        content: String,
    },

    /// A name, value or comment contains a line break
    #[error("line break in {0}")]
    InvalidText(String),

    /// A section or option name would not read back as the same name
    #[error("'{name}' is not a valid {what}")]
    InvalidName {
        /// Kind of name
        what: &'static str,
        /// Rejected name
        name: String,
    },

    /// A file or relational source could not be read
    #[error("cannot read {path}: {message}")]
    SourceUnreadable {
        /// File or database path
        path: PathBuf,
        /// Underlying error message
        message: String,
    },

    /// The relational source failed a query
    #[error("relational source error: {0}")]
    Source(String),

    /// Writing a document failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(feature = "sqlite")]
impl From<rusqlite::Error> for IniError {
    fn from(e: rusqlite::Error) -> Self {
        IniError::Source(e.to_string())
    }
}

impl IniError {
    /// Lookup failure on a section, option or comment
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            IniError::NoSuchSection(_)
                | IniError::NoSuchOption { .. }
                | IniError::NoComment { .. }
                | IniError::NoSectionComment(_)
        )
    }
}
