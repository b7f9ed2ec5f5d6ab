pub mod callbacks;
pub mod config;
pub mod error;
pub mod feeders;
pub mod io;
pub mod jira;
pub mod pool;
pub mod registry;
pub mod regression;
pub mod reporter;
pub mod rules;
pub mod types;

pub use error::{RelayError, Result};
