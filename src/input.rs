//! # Input Configuration Module
//!
//! Job files describing a band resolution: the subdataset to address, the
//! coordinate selection and the band list. JSON and YAML are both accepted.
//!
//! ## Example Usage
//!
//! ```rust
//! use ncband::input::JobConfig;
//!
//! let json = r#"
//! {
//!   "subdataset": "NETCDF:\"era5.nc\":u",
//!   "dimensions": { "pressure": 500, "time": "2019-06-15T18:00" },
//!   "bands": ["x_wind"]
//! }"#;
//! let config = JobConfig::from_json(json)?;
//! assert_eq!(config.dimensions.len(), 2);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use crate::coords::CoordinateSelection;
use crate::resolver::BandFilter;
use crate::subdataset::SubdatasetId;
use crate::error::BandResult;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Main configuration structure for ncband jobs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobConfig {
    /// Subdataset identifier, `NETCDF:"<path>":<variable>`
    #[serde(default)]
    pub subdataset: Option<String>,
    /// Requested coordinate per dimension; missing dimensions use index 0
    #[serde(default)]
    pub dimensions: CoordinateSelection,
    /// Standard names (or variable names) to accept; empty accepts all
    #[serde(default)]
    pub bands: Vec<String>,
}

impl JobConfig {
    /// Loads a job configuration from a JSON or YAML file, chosen by extension.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => Self::from_yaml(&content),
            _ => Self::from_json(&content),
        }
    }

    pub fn from_json(json_str: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let config: JobConfig = serde_json::from_str(json_str)?;
        Ok(config)
    }

    pub fn from_yaml(yaml_str: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let config: JobConfig = serde_yaml::from_str(yaml_str)?;
        Ok(config)
    }

    pub fn filter(&self) -> BandFilter {
        BandFilter::from_tags(&self.bands)
    }

    /// The parsed subdataset, if one is configured.
    pub fn subdataset_id(&self) -> Option<BandResult<SubdatasetId>> {
        self.subdataset.as_deref().map(str::parse)
    }
}
