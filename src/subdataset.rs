//! Subdataset identifiers in the raster library's addressing convention,
//! `NETCDF:"<path>":<variable>`.

use crate::error::BandError;
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

const PREFIX: &str = "NETCDF:";

/// A variable within a NetCDF file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubdatasetId {
    pub path: PathBuf,
    pub variable: String,
}

impl SubdatasetId {
    pub fn new(path: impl Into<PathBuf>, variable: impl Into<String>) -> Self {
        SubdatasetId {
            path: path.into(),
            variable: variable.into(),
        }
    }

    /// The path as written into `SourceFilename`.
    pub fn source_filename(&self) -> String {
        self.path.to_string_lossy().to_string()
    }
}

impl FromStr for SubdatasetId {
    type Err = BandError;

    /// Accepts the path quoted or bare. A bare path is split at its last
    /// colon so drive letters survive.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || BandError::InvalidSubdataset(s.to_string());
        let rest = s.trim().strip_prefix(PREFIX).ok_or_else(invalid)?;

        let (path, variable) = match rest.strip_prefix('"') {
            Some(quoted) => {
                let (path, tail) = quoted.split_once('"').ok_or_else(invalid)?;
                let variable = tail.strip_prefix(':').ok_or_else(invalid)?;
                (path, variable)
            }
            None => rest.rsplit_once(':').ok_or_else(invalid)?,
        };

        if path.is_empty() || variable.is_empty() {
            return Err(invalid());
        }
        Ok(SubdatasetId::new(path, variable))
    }
}

impl fmt::Display for SubdatasetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\"{}\":{}", PREFIX, self.path.display(), self.variable)
    }
}
