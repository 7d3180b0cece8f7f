//! Command implementations

pub mod catalog;
pub mod profile;
pub mod request;
pub mod server;
pub mod utils;
