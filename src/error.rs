//! Error types for band resolution.

use crate::timeunits::TimeUnitsError;
use thiserror::Error;

/// Result type for band resolution operations
pub type BandResult<T> = Result<T, BandError>;

/// Errors that can occur while describing a variable or resolving a band
#[derive(Error, Debug)]
pub enum BandError {
    #[error("Variable '{0}' not found")]
    VariableNotFound(String),

    #[error("Dimension '{dimension}' of variable '{variable}' not found")]
    DimensionNotFound { variable: String, dimension: String },

    #[error("Variable '{variable}' ({tag}) is not in the requested band list")]
    NotApplicable { variable: String, tag: String },

    #[error("Invalid subdataset identifier: {0}")]
    InvalidSubdataset(String),

    #[error("Variable '{variable}' has {found} dimension(s), at least 2 are required")]
    TooFewDimensions { variable: String, found: usize },

    #[error("Dimension '{0}' has no coordinate values")]
    EmptyDimension(String),

    #[error("Coordinate variable '{dimension}' holds {found} values but the dimension has {expected}")]
    CoordinateLength {
        dimension: String,
        expected: usize,
        found: usize,
    },

    #[error("Dimension '{dimension}' is not a time dimension and cannot be selected by instant {value}")]
    CoordinateKind { dimension: String, value: String },

    #[error("No coordinate of dimension '{dimension}' matches {value}")]
    InvalidCoordinate { dimension: String, value: String },

    #[error("Time units error: {0}")]
    TimeUnits(#[from] TimeUnitsError),

    #[error("NetCDF error: {0}")]
    NetCdf(#[from] netcdf::Error),
}

impl BandError {
    /// True for a missing variable or dimension.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            BandError::VariableNotFound(_) | BandError::DimensionNotFound { .. }
        )
    }

    /// True when the variable was filtered out by the band list.
    ///
    /// Callers scanning many variables treat this as a skip, not a failure.
    pub fn is_not_applicable(&self) -> bool {
        matches!(self, BandError::NotApplicable { .. })
    }
}
