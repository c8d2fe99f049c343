//! # Folio Common Library
//!
//! Shared code for Folio services including:
//! - Database models and pool initialization
//! - Configuration loading
//! - Common error types

pub mod config;
pub mod db;
pub mod error;

pub use db::models::{
    ArchiveStatus, Concept, Contributor, Entry, EntryData, EntryText, Keyword, Media, TextSegment,
};
pub use error::{Error, Result};
