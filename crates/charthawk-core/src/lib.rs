//! Charthawk Core - foundational types for chart image discovery
//!
//! This crate provides the pure data model shared by the pipeline:
//! - `ImageReference`: a normalized container image identity
//! - `Values`: merged chart configuration with deep merge and dot-path lookup
//! - `Chart` / `ChartCollection`: bundle descriptors and rewrite rules

pub mod chart;
pub mod error;
pub mod image;
pub mod values;

pub use chart::{Chart, ChartCollection, ImageRules, MirrorRule, ModifyRule, RefPrefix, RepoRef};
pub use error::{CoreError, Result};
pub use image::ImageReference;
pub use values::{condition_met, Values};
