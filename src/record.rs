//! Band records: the outcome of resolving one coordinate selection.

use crate::timeunits::iso_8601;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Value, json};
use std::collections::BTreeMap;

/// Key prefix of resolved coordinate entries
pub const DIM_KEY_PREFIX: &str = "NETCDF_DIM_";

/// Key of the decoded time entry
pub const TIME_KEY: &str = "time_iso_8601";

/// One resolved band of a variable.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BandRecord {
    pub source_filename: String,
    /// 1-based band number in the raster library's numbering
    pub source_band: usize,
    pub variable: String,
    pub raster_x_size: usize,
    pub raster_y_size: usize,
    pub band_count: usize,
    /// `NETCDF_DIM_<name>` → native coordinate text, one per stacked dimension
    pub resolved_coordinates: BTreeMap<String, String>,
    pub resolved_time: Option<DateTime<Utc>>,
    pub attributes: BTreeMap<String, String>,
}

/// The `src`/`dst` pair handed to band registration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BandDict {
    pub src: BTreeMap<String, Value>,
    pub dst: BTreeMap<String, String>,
}

impl BandRecord {
    /// Where to read the band from.
    pub fn src(&self) -> BTreeMap<String, Value> {
        let mut src = BTreeMap::new();
        src.insert("SourceFilename".to_string(), json!(self.source_filename));
        src.insert("SourceBand".to_string(), json!(self.source_band));
        src
    }

    /// Descriptive band metadata: the variable's attributes, its name, the
    /// resolved coordinates and the decoded time.
    pub fn dst(&self) -> BTreeMap<String, String> {
        let mut dst = self.attributes.clone();
        dst.insert("name".to_string(), self.variable.clone());
        dst.extend(self.resolved_coordinates.clone());
        if let Some(time) = &self.resolved_time {
            dst.insert(TIME_KEY.to_string(), iso_8601(time));
        }
        dst
    }

    pub fn dimension_value(&self, dimension: &str) -> Option<&str> {
        self.resolved_coordinates
            .get(&format!("{}{}", DIM_KEY_PREFIX, dimension))
            .map(String::as_str)
    }

    pub fn to_dict(&self) -> BandDict {
        BandDict {
            src: self.src(),
            dst: self.dst(),
        }
    }
}
