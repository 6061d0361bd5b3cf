//! Integration tests for structured-text configuration files.
//!
//! Covers INI generation from relational sources, comment-preserving
//! round-trips, and repairing a hand-edited file against its source.

mod comments;
mod generation;
mod repair;
