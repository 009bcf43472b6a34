//! Config Merge Library
//!
//! Loads JSON configuration split across several files, reports conflicting
//! and unused settings, and materializes one typed record per configuration.

pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
