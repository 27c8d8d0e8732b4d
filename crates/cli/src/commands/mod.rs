//! CLI command implementations

pub mod health;
pub mod low_used;
pub mod report;
pub mod suggestions;
