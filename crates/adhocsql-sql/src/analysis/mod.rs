//! Properties derived from a finished plan tree.

pub mod determinism;
pub mod partitioning;
