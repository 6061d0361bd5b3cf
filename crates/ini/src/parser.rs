//! Comment-preserving INI documents
//!
//! [`CommentedIni`] keeps two indexes: the sections with their options, and a
//! shadow index of single-line comments attached to sections and options.
//!
//! ## Format
//!
//! ```text
//! ; section comment
//! [section]
//! ; option comment
//! option = value
//! bare_option
//! ```
//!
//! - Names are case-sensitive.
//! - `=` is the only delimiter; a line without one is a bare option with no value.
//! - A `"; "` line attaches to the header or option on the very next line.
//!   Other lines starting with `;` or `#` are ignored.
//! - Indented lines would continue a value and are rejected.
//! - Options before the first header are rejected.
//!
//! Reading several sources into one document merges them: later values and
//! comments replace earlier ones. Within a single source a repeated section
//! or option is an error unless the document is lenient.

use indexmap::IndexMap;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::io::Write;
use std::path::Path;
use tracing::warn;

use crate::error::{IniError, Result};

/// Prefix of attachable comment lines
pub const COMMENT_PREFIX: &str = "; ";

type Options = IndexMap<String, Option<String>>;

/// INI document with a shadow comment index
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommentedIni {
    sections: IndexMap<String, Options>,
    section_comments: HashMap<String, String>,
    option_comments: HashMap<String, HashMap<String, String>>,
    lenient: bool,
}

#[derive(Clone, Copy)]
enum ReadMode {
    /// Add everything the source contains
    Merge,
    /// Only update sections and options that already exist
    Overlay,
}

impl CommentedIni {
    /// Empty, strict document
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty document that skips malformed lines instead of failing
    pub fn lenient() -> Self {
        CommentedIni {
            lenient: true,
            ..Self::default()
        }
    }

    /// Whether malformed lines are skipped
    pub fn is_lenient(&self) -> bool {
        self.lenient
    }

    /// Switch between failing on and skipping malformed lines
    pub fn set_lenient(&mut self, lenient: bool) {
        self.lenient = lenient;
    }

    // =========================================================================
    // Sections and options
    // =========================================================================

    /// Add a section, with an optional comment. An empty comment adds none.
    pub fn add_section(&mut self, section: &str, comment: &str) -> Result<()> {
        check_section_name(section)?;
        check_text("comment", comment)?;
        if self.sections.contains_key(section) {
            return Err(IniError::DuplicateSection {
                section: section.to_string(),
                line: None,
            });
        }
        self.sections.insert(section.to_string(), Options::new());
        if !comment.is_empty() {
            self.section_comments
                .insert(section.to_string(), comment.to_string());
        }
        Ok(())
    }

    /// Set an option, creating it if needed.
    ///
    /// `comment` replaces the option's comment when given; an empty string
    /// clears it.
    pub fn set(
        &mut self,
        section: &str,
        option: &str,
        value: Option<&str>,
        comment: Option<&str>,
    ) -> Result<()> {
        check_option_name(option)?;
        if let Some(value) = value {
            check_text("value", value)?;
        }
        let options = self
            .sections
            .get_mut(section)
            .ok_or_else(|| IniError::NoSuchSection(section.to_string()))?;
        options.insert(option.to_string(), value.map(str::to_string));
        if let Some(comment) = comment {
            self.set_comment(section, option, comment)?;
        }
        Ok(())
    }

    /// Value of an option; `None` for a bare option
    pub fn get(&self, section: &str, option: &str) -> Result<Option<&str>> {
        self.options_of(section)?
            .get(option)
            .map(|v| v.as_deref())
            .ok_or_else(|| no_such_option(section, option))
    }

    /// Section names in document order
    pub fn sections(&self) -> Vec<&str> {
        self.sections.keys().map(String::as_str).collect()
    }

    /// Option names of a section in document order
    pub fn options(&self, section: &str) -> Result<Vec<&str>> {
        Ok(self.options_of(section)?.keys().map(String::as_str).collect())
    }

    /// Whether a section exists
    pub fn has_section(&self, section: &str) -> bool {
        self.sections.contains_key(section)
    }

    /// Whether an option exists in a section
    pub fn has_option(&self, section: &str, option: &str) -> bool {
        self.sections
            .get(section)
            .map_or(false, |options| options.contains_key(option))
    }

    /// Remove an option and its comment. Returns whether it existed.
    pub fn remove_option(&mut self, section: &str, option: &str) -> Result<bool> {
        self.remove_comment(section, option)?;
        let options = self
            .sections
            .get_mut(section)
            .ok_or_else(|| IniError::NoSuchSection(section.to_string()))?;
        Ok(options.shift_remove(option).is_some())
    }

    /// Remove a section and every comment in it. Returns whether it existed.
    pub fn remove_section(&mut self, section: &str) -> bool {
        self.section_comments.remove(section);
        self.option_comments.remove(section);
        self.sections.shift_remove(section).is_some()
    }

    fn options_of(&self, section: &str) -> Result<&Options> {
        self.sections
            .get(section)
            .ok_or_else(|| IniError::NoSuchSection(section.to_string()))
    }

    // =========================================================================
    // Comments
    // =========================================================================

    /// Whether a section has a comment. Does not check the section exists.
    pub fn has_section_comment(&self, section: &str) -> bool {
        self.section_comments.contains_key(section)
    }

    /// Comment of a section
    pub fn section_comment(&self, section: &str) -> Result<&str> {
        self.section_comments
            .get(section)
            .map(String::as_str)
            .ok_or_else(|| IniError::NoSectionComment(section.to_string()))
    }

    /// Whether an option has a comment
    pub fn has_comment(&self, section: &str, option: &str) -> bool {
        self.option_comments
            .get(section)
            .map_or(false, |comments| comments.contains_key(option))
    }

    /// Comment of an option
    pub fn comment(&self, section: &str, option: &str) -> Result<&str> {
        self.options_of(section)?;
        self.option_comments
            .get(section)
            .and_then(|comments| comments.get(option))
            .map(String::as_str)
            .ok_or_else(|| IniError::NoComment {
                section: section.to_string(),
                option: option.to_string(),
            })
    }

    /// Options of a section that carry a comment, in document order
    pub fn options_with_comment(&self, section: &str) -> Vec<&str> {
        let (Some(options), Some(comments)) =
            (self.sections.get(section), self.option_comments.get(section))
        else {
            return Vec::new();
        };
        options
            .keys()
            .filter(|option| comments.contains_key(*option))
            .map(String::as_str)
            .collect()
    }

    /// Set or clear (with an empty string) a section comment
    pub fn set_section_comment(&mut self, section: &str, comment: &str) -> Result<()> {
        check_text("comment", comment)?;
        if !self.sections.contains_key(section) {
            return Err(IniError::NoSuchSection(section.to_string()));
        }
        if comment.is_empty() {
            self.section_comments.remove(section);
        } else {
            self.section_comments
                .insert(section.to_string(), comment.to_string());
        }
        Ok(())
    }

    /// Set or clear (with an empty string) an option comment
    pub fn set_comment(&mut self, section: &str, option: &str, comment: &str) -> Result<()> {
        check_text("comment", comment)?;
        if !self.options_of(section)?.contains_key(option) {
            return Err(no_such_option(section, option));
        }
        if comment.is_empty() {
            self.drop_option_comment(section, option);
        } else {
            self.option_comments
                .entry(section.to_string())
                .or_default()
                .insert(option.to_string(), comment.to_string());
        }
        Ok(())
    }

    /// Remove an option comment. Returns whether there was one.
    pub fn remove_comment(&mut self, section: &str, option: &str) -> Result<bool> {
        self.options_of(section)?;
        Ok(self.drop_option_comment(section, option))
    }

    /// Remove a section comment. Returns whether there was one.
    pub fn remove_section_comment(&mut self, section: &str) -> bool {
        self.section_comments.remove(section).is_some()
    }

    fn drop_option_comment(&mut self, section: &str, option: &str) -> bool {
        let Some(comments) = self.option_comments.get_mut(section) else {
            return false;
        };
        let removed = comments.remove(option).is_some();
        if comments.is_empty() {
            self.option_comments.remove(section);
        }
        removed
    }

    // =========================================================================
    // Reading
    // =========================================================================

    /// Merge a document from text
    pub fn read_str(&mut self, text: &str) -> Result<()> {
        self.read_with(text, ReadMode::Merge)
    }

    /// Merge a document from a file
    pub fn read_path(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| IniError::SourceUnreadable {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        self.read_str(&text)
    }

    /// Read `text` but only update what this document already has.
    ///
    /// Values and comments of existing options are replaced; sections and
    /// options unknown to this document are dropped.
    pub fn overlay_str(&mut self, text: &str) -> Result<()> {
        self.read_with(text, ReadMode::Overlay)
    }

    fn read_with(&mut self, text: &str, mode: ReadMode) -> Result<()> {
        let mut pending: Option<String> = None;
        let mut section: Option<String> = None;
        let mut in_option = false;
        let mut seen_sections = HashSet::new();
        let mut seen_options: HashSet<(String, String)> = HashSet::new();

        for (index, raw) in text.lines().enumerate() {
            let line_no = index + 1;
            let line = raw.trim_end();

            if let Some(comment) = line.strip_prefix(COMMENT_PREFIX) {
                pending = Some(comment.to_string());
                continue;
            }
            let comment = pending.take();

            if line.is_empty() || line.starts_with(';') || line.starts_with('#') {
                continue;
            }

            if in_option && line.starts_with(char::is_whitespace) {
                self.reject(IniError::MultilineValue { line: line_no })?;
                continue;
            }
            let line = line.trim_start();

            if let Some(name) = header_name(line) {
                in_option = false;
                if !seen_sections.insert(name.to_string()) {
                    self.reject(IniError::DuplicateSection {
                        section: name.to_string(),
                        line: Some(line_no),
                    })?;
                }
                match mode {
                    ReadMode::Overlay if !self.sections.contains_key(name) => {
                        section = None;
                        continue;
                    }
                    _ => {
                        self.sections.entry(name.to_string()).or_default();
                    }
                }
                if let Some(comment) = comment {
                    self.section_comments.insert(name.to_string(), comment);
                }
                section = Some(name.to_string());
                continue;
            }

            if seen_sections.is_empty() {
                self.reject(IniError::MissingSectionHeader { line: line_no })?;
                continue;
            }
            // Inside a section this document does not take
            let Some(current) = section.as_deref() else {
                continue;
            };

            let (key, value) = match line.split_once('=') {
                Some((key, value)) => (key.trim(), Some(value.trim())),
                None => (line, None),
            };
            if key.is_empty() {
                self.reject(IniError::Malformed {
                    line: line_no,
                    content: raw.to_string(),
                })?;
                continue;
            }
            in_option = true;

            if !seen_options.insert((current.to_string(), key.to_string())) {
                self.reject(IniError::DuplicateOption {
                    section: current.to_string(),
                    option: key.to_string(),
                    line: Some(line_no),
                })?;
            }

            let Some(options) = self.sections.get_mut(current) else {
                continue;
            };
            if matches!(mode, ReadMode::Overlay) && !options.contains_key(key) {
                continue;
            }
            options.insert(key.to_string(), value.map(str::to_string));
            if let Some(comment) = comment {
                self.option_comments
                    .entry(current.to_string())
                    .or_default()
                    .insert(key.to_string(), comment);
            }
        }
        Ok(())
    }

    /// Fail in strict mode, log and carry on in lenient mode
    fn reject(&self, err: IniError) -> Result<()> {
        if self.lenient {
            warn!(target: "strataconf::ini", error = %err, "Skipping malformed line");
            Ok(())
        } else {
            Err(err)
        }
    }

    // =========================================================================
    // Writing
    // =========================================================================

    /// Write the document, comments included
    pub fn write_to<W: Write>(&self, mut sink: W) -> std::io::Result<()> {
        sink.write_all(self.to_string().as_bytes())
    }

    /// Write the document to a file, replacing it
    pub fn write_path(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path, self.to_string())?;
        Ok(())
    }
}

impl fmt::Display for CommentedIni {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, (section, options)) in self.sections.iter().enumerate() {
            if index > 0 {
                writeln!(f)?;
            }
            if let Some(comment) = self.section_comments.get(section) {
                writeln!(f, "{}{}", COMMENT_PREFIX, comment)?;
            }
            writeln!(f, "[{}]", section)?;

            let comments = self.option_comments.get(section);
            for (option, value) in options {
                if let Some(comment) = comments.and_then(|c| c.get(option)) {
                    writeln!(f, "{}{}", COMMENT_PREFIX, comment)?;
                }
                match value {
                    Some(value) => writeln!(f, "{} = {}", option, value)?,
                    None => writeln!(f, "{}", option)?,
                }
            }
        }
        Ok(())
    }
}

fn header_name(line: &str) -> Option<&str> {
    let name = line.strip_prefix('[')?.strip_suffix(']')?;
    (!name.is_empty()).then_some(name)
}

fn no_such_option(section: &str, option: &str) -> IniError {
    IniError::NoSuchOption {
        section: section.to_string(),
        option: option.to_string(),
    }
}

pub(crate) fn check_text(what: &str, text: &str) -> Result<()> {
    if text.contains(['\n', '\r']) {
        return Err(IniError::InvalidText(what.to_string()));
    }
    Ok(())
}

/// A section name must come back from its `[name]` header unchanged
pub(crate) fn check_section_name(section: &str) -> Result<()> {
    check_text("section name", section)?;
    if section.is_empty() || section.trim() != section {
        return Err(IniError::InvalidName {
            what: "section name",
            name: section.to_string(),
        });
    }
    Ok(())
}

/// An option name must not read back as a header, a comment, or a shorter key
pub(crate) fn check_option_name(option: &str) -> Result<()> {
    check_text("option name", option)?;
    let ambiguous = option.is_empty()
        || option.trim() != option
        || option.contains('=')
        || option.starts_with([';', '#'])
        || header_name(option).is_some();
    if ambiguous {
        return Err(IniError::InvalidName {
            what: "option name",
            name: option.to_string(),
        });
    }
    Ok(())
}
