//! # ncband
//!
//! A Rust library for addressing slices of multi-dimensional NetCDF variables
//! by the flat, 1-indexed band numbers a 2D raster library uses.
//!
//! ## Features
//!
//! - **Coordinate selection**: pick a slice by physical values (`pressure = 500`,
//!   `time = 2019-06-15T18:00`), nearest stored value wins
//! - **Raster library numbering**: the last two declared dimensions are the pixel
//!   grid, whatever their names, and the rest stack into bands in declared order
//! - **Band metadata**: resolved coordinates as `NETCDF_DIM_<name>` entries and
//!   the decoded time as `time_iso_8601`
//! - **Band filtering**: only resolve variables whose standard name is wanted
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use ncband::get_band_from_subdataset;
//! use ncband::coords::{CoordinateSelection, CoordinateValue};
//! use ncband::resolver::BandFilter;
//!
//! let selection = CoordinateSelection::new()
//!     .with("pressure", CoordinateValue::Numeric(500.0))
//!     .with("time", "2019-06-15T18:00".parse()?);
//! let record = get_band_from_subdataset(
//!     r#"NETCDF:"era5.nc":u"#,
//!     &selection,
//!     &BandFilter::only(["x_wind"]),
//! )?;
//! println!("band {}: {:?}", record.source_band, record.dst());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod catalog;
pub mod cli;
pub mod coords;
pub mod error;
pub mod info;
pub mod input;
pub mod layout;
pub mod log;
pub mod record;
pub mod resolver;
pub mod subdataset;
pub mod timeunits;

#[cfg(test)]
mod cli_tests;

use crate::catalog::NetcdfCatalog;
use crate::coords::CoordinateSelection;
use crate::error::BandResult;
use crate::record::BandRecord;
use crate::resolver::{BandFilter, BandResolver};
use crate::subdataset::SubdatasetId;
use std::path::Path;

/// Resolves `selection` to a band of the subdataset named by `subdataset`.
///
/// The file is opened for the duration of the call and closed before
/// returning.
///
/// # Errors
///
/// - [`BandError::InvalidSubdataset`](error::BandError::InvalidSubdataset) for
///   a malformed identifier
/// - a not-found error for an unknown variable
/// - [`BandError::NotApplicable`](error::BandError::NotApplicable) when the
///   variable is not admitted by `filter`
/// - NetCDF and time unit errors, unchanged
pub fn get_band_from_subdataset(
    subdataset: &str,
    selection: &CoordinateSelection,
    filter: &BandFilter,
) -> BandResult<BandRecord> {
    let id: SubdatasetId = subdataset.parse()?;
    let file = netcdf::open(&id.path)?;
    let record = {
        let catalog = NetcdfCatalog::new(&file);
        BandResolver::new(&catalog).resolve(&id, selection, filter)?
    };
    file.close()?;
    Ok(record)
}

/// Every band of the subdataset named by `subdataset`, in band order.
pub fn list_bands(subdataset: &str, filter: &BandFilter) -> BandResult<Vec<BandRecord>> {
    let id: SubdatasetId = subdataset.parse()?;
    let file = netcdf::open(&id.path)?;
    let records = {
        let catalog = NetcdfCatalog::new(&file);
        BandResolver::new(&catalog).enumerate(&id, filter)?
    };
    file.close()?;
    Ok(records)
}

/// Resolves `selection` against every raster variable of a file, skipping the
/// variables `filter` does not admit.
pub fn scan_file<P: AsRef<Path>>(
    path: P,
    selection: &CoordinateSelection,
    filter: &BandFilter,
) -> BandResult<Vec<BandRecord>> {
    let path = path.as_ref();
    let file = netcdf::open(path)?;
    let records = {
        let catalog = NetcdfCatalog::new(&file);
        BandResolver::new(&catalog).scan(&path.to_string_lossy(), selection, filter)?
    };
    file.close()?;
    Ok(records)
}
