//! Error types for butterfly-net
//!
//! Library code returns [`Error`]; the command-line binary wraps it with
//! `anyhow` context at the application boundary.

use thiserror::Error;

/// Main error type for network construction
#[derive(Debug, Error)]
pub enum Error {
    /// The extract spans both hemispheres; a single false northing cannot serve both
    #[error("latitudes must all have the same sign (found {min_lat} to {max_lat})")]
    MixedHemisphere { min_lat: f64, max_lat: f64 },

    /// Nothing to anchor the projection on
    #[error("extract contains no nodes")]
    EmptyExtract,

    /// A link would reference a node that was never built
    #[error("link {link_id} references unknown node {node_id}")]
    MissingEndpoint { link_id: u64, node_id: u64 },

    /// Invalid configuration or parameters
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Failure while decoding the PBF source
    #[error("PBF error: {0}")]
    Pbf(String),

    /// Configuration file rejected
    #[error("Config error: {0}")]
    Config(String),

    /// File I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<osmpbf::Error> for Error {
    fn from(err: osmpbf::Error) -> Self {
        Error::Pbf(err.to_string())
    }
}

/// Convenience result type for butterfly-net operations
pub type Result<T> = std::result::Result<T, Error>;
