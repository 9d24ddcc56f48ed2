pub mod cache;
pub mod canonical;
pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod export;
pub mod fetch;
pub mod recommend;

pub use error::{HunoError, Result};
