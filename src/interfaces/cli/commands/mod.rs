//! CLI command implementations
//!
//! This module re-exports all CLI command functions.

mod accounts;
mod campaign;
mod config_gen;

pub use accounts::*;
pub use campaign::*;
pub use config_gen::*;
