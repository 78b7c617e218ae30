//! Command handlers for the crab-utils CLI

pub mod config;
pub mod query;
pub mod status;
pub mod util;
