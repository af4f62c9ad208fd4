//! Adapters behind the domain ports.

pub mod console;
pub mod http;
pub mod in_memory;
pub mod json_file;
pub mod local_quotes;
pub mod sandbox;
