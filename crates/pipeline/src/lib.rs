//! Annotation and subtitle ingestion for storyline blueprints.
//!
//! Reads an annotation export plus per-chapter subtitle tracks, rebuilds
//! typed regions, buckets every event into its scene and hands the result
//! to `storyline_core` for chapter, metadata and timeline derivation.

pub mod assembler;
pub mod builder;
pub mod error;
pub mod export;
pub mod mapping;
pub mod regions;
pub mod subtitle;

pub use builder::BlueprintBuilder;
pub use error::{PipelineError, PipelineResult};
