//! CLI commands

pub mod images;
pub mod versions;
