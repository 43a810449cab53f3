//! Infrastructure layer module
//!
//! Configuration loading, logging, project setup, and the wiring that turns a
//! [`Config`](crate::domain::models::Config) into ready-to-use services.

pub mod config;
pub mod context;
pub mod logging;
pub mod setup;

pub use context::AppContext;
