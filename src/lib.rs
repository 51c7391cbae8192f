// Library exports for planstream
// This allows the modules to be imported in tests and the binary

pub mod config;
pub mod llm;
pub mod planning;
pub mod server;
pub mod utils;
