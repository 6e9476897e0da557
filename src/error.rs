//! Error types shared by every stage of the mining pipeline.

use std::io;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// Missing or malformed run parameter. Raised before any stage runs.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Stage input violates an invariant the previous stage guarantees.
    #[error("Data consistency error: {0}")]
    DataConsistency(String),

    /// A stage did not complete cleanly; its output has been discarded.
    #[error("Stage '{stage}' failed: {source}")]
    Stage {
        stage: &'static str,
        #[source]
        source: Box<Error>,
    },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Invalid split pattern: {0}")]
    Pattern(#[from] regex::Error),
}

impl Error {
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Error::Config(msg.into())
    }

    pub fn data_consistency<S: Into<String>>(msg: S) -> Self {
        Error::DataConsistency(msg.into())
    }

    pub fn stage(stage: &'static str, source: Error) -> Self {
        Error::Stage {
            stage,
            source: Box::new(source),
        }
    }
}
