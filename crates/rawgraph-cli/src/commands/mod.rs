//! CLI command implementations.

pub mod compile;
pub mod modules;
pub mod pipelines;
