pub mod bus;
pub mod config;
pub mod error;
pub mod logging;
pub mod module;
