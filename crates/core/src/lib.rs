//! Pure domain logic for narrative blueprints.
//!
//! Nothing in this crate touches the filesystem or logs. It provides:
//!
//! - [`time`]: conversions between annotation seconds, subtitle timestamps
//!   and the canonical `HH:MM:SS.mmm` format.
//! - [`blueprint`]: the document model (scenes, chapters, metadata).
//! - [`chapters`]: chapter grouping and project metadata derivation.
//! - [`timeline`]: linear and multi-branch narrative ordering.
//! - [`stats`]: per-speaker dialogue statistics.
//! - [`validation`]: structural, vocabulary and timeline checks.

pub mod blueprint;
pub mod chapters;
pub mod error;
pub mod stats;
pub mod time;
pub mod timeline;
pub mod types;
pub mod validation;
