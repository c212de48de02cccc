pub mod classifier;
pub mod config;
pub mod conflict;
pub mod error;
pub mod gateway;
pub mod io;
pub mod listing;
pub mod metadata;
pub mod orchestrator;
pub mod paths;
pub mod pip;
pub mod report;
pub mod rules;
pub mod types;

pub use error::{PipUpdateError, Result};
