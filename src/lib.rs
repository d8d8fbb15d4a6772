pub mod analyzers;
pub mod charts;
pub mod config;
pub mod error;
pub mod loader;
pub mod output;
pub mod parser;
pub mod report;
pub mod stats;

pub use error::{PipelineError, Result};
