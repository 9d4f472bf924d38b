//! Weather Agent: weather lookup, LLM answer, optional notification.

pub mod cli;
pub mod config;
pub mod error;
pub mod llm;
pub mod notify;
pub mod pipeline;
pub mod server;
pub mod weather;
