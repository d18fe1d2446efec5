pub mod arguments;
pub mod cache;
pub mod config;
pub mod errors;
pub mod logger;
pub mod rpc;
pub mod swaps;
