pub mod args;
pub mod auth;
pub mod commands;
mod config;
mod error;
pub mod model;
pub mod store;
mod utils;
pub mod views;
pub mod web;


pub use config::{Config, DEFAULT_BIND_ADDR};
pub use error::{Error, ErrorType, IntoResult, Result};
pub use store::Mode;
