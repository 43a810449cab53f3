//! CLI command implementations.

pub mod config;
pub mod init;
pub mod prompt;
pub mod reindex;
pub mod response;
pub mod serve;
