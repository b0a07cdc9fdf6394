//! charthawk-discover: the image discovery pipeline
//!
//! Takes a collection of chart declarations and produces, per chart, every
//! container image its configuration references:
//! - `extract` walks a values tree and assembles candidate references
//! - `Discovery::run` resolves versions, expands one level of enabled
//!   dependencies, validates every distinct candidate against its registry
//!   and applies rewrite rules
//! - `Output` serializes the result for later pipeline stages

pub mod error;
pub mod extract;
pub mod pipeline;
pub mod report;
pub mod rules;

pub use error::{DiscoverError, Result};
pub use extract::{extract, Fragment};
pub use pipeline::{ChartData, DiscoverOptions, Discovery, ImageMap};
pub use report::Output;
pub use rules::apply_rules;
