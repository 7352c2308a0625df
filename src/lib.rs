pub mod adapters;
pub mod config;
pub mod context;
pub mod core;
pub mod deps;
pub mod error;
pub mod logging;
pub mod source;
