//! CLI command implementations.
//!
//! - [`budget`] - Show the hot-path budget for this host
//! - [`exists`] - Coalesced existence checks
//! - [`warm`] - Load files and fill the hot-path cache

pub mod budget;
pub mod exists;
pub mod warm;
