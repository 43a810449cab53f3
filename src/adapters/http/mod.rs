//! HTTP adapters.

pub mod prompts_http;

pub use prompts_http::{ErrorResponse, PromptsHttpServer};
