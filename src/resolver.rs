//! # Band Resolver
//!
//! Turns a [`CoordinateSelection`] into the band number of the matching 2D
//! slice and a [`BandRecord`] describing it.
//!
//! Each stacked dimension resolves independently: a requested value picks
//! the nearest stored coordinate (ties to the lower index), a missing one
//! picks index 0. Time dimensions accept instants, which are encoded with
//! the dimension's own units before matching. The time dimension is decoded
//! into [`BandRecord::resolved_time`] even when it sits in the pixel grid.

use crate::catalog::{DimensionCatalog, DimensionKind, Dimension, VariableDescriptor};
use crate::coords::{CoordinateSelection, CoordinateValue, nearest_index};
use crate::error::{BandError, BandResult};
use crate::layout::{BandLayout, DimensionRole};
use crate::record::{BandRecord, DIM_KEY_PREFIX};
use crate::subdataset::SubdatasetId;
use log::debug;
use std::collections::{BTreeMap, BTreeSet};

/// Which variables a caller wants bands for
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum BandFilter {
    #[default]
    All,
    /// Variables whose `standard_name` or name is in the set
    Only(BTreeSet<String>),
}

impl BandFilter {
    pub fn only<I, S>(tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        BandFilter::Only(tags.into_iter().map(Into::into).collect())
    }

    /// `All` for an empty tag list.
    pub fn from_tags(tags: &[String]) -> Self {
        if tags.is_empty() {
            BandFilter::All
        } else {
            BandFilter::only(tags.iter().cloned())
        }
    }

    pub fn admits(&self, descriptor: &VariableDescriptor) -> bool {
        self.admits_tag(&descriptor.name, descriptor.standard_name())
    }

    pub fn admits_tag(&self, name: &str, standard_name: Option<&str>) -> bool {
        match self {
            BandFilter::All => true,
            BandFilter::Only(tags) => tags.contains(name) || standard_name.is_some_and(|tag| tags.contains(tag)),
        }
    }
}

/// Resolves bands of variables described by a catalog.
pub struct BandResolver<'c, C: DimensionCatalog + ?Sized> {
    catalog: &'c C,
}

impl<'c, C: DimensionCatalog + ?Sized> BandResolver<'c, C> {
    pub fn new(catalog: &'c C) -> Self {
        BandResolver { catalog }
    }

    /// Band of `subdataset` matching `selection`.
    pub fn resolve(
        &self,
        subdataset: &SubdatasetId,
        selection: &CoordinateSelection,
        filter: &BandFilter,
    ) -> BandResult<BandRecord> {
        self.check_variable(&subdataset.variable, filter)?;
        let descriptor = self.catalog.describe(&subdataset.variable)?;
        resolve_descriptor(&descriptor, &subdataset.source_filename(), selection, filter)
    }

    /// Every band of `subdataset`, in band order.
    pub fn enumerate(&self, subdataset: &SubdatasetId, filter: &BandFilter) -> BandResult<Vec<BandRecord>> {
        self.check_variable(&subdataset.variable, filter)?;
        let descriptor = self.catalog.describe(&subdataset.variable)?;

        let layout = BandLayout::from_descriptor(&descriptor);
        let source_filename = subdataset.source_filename();
        (1..=layout.band_count())
            .map(|band| {
                let mut indices = vec![0; descriptor.dimensions().len()];
                if let Some(stacked) = layout.band_indices(band) {
                    for (position, index) in layout.stacked().zip(stacked) {
                        indices[position] = index;
                    }
                }
                build_record(&descriptor, &layout, &indices, &source_filename)
            })
            .collect()
    }

    /// Resolves `selection` against every raster variable of the catalog,
    /// skipping the ones `filter` rejects.
    ///
    /// Rejected variables are never described, so a variable the filter
    /// excludes cannot fail the scan.
    pub fn scan(
        &self,
        source_filename: &str,
        selection: &CoordinateSelection,
        filter: &BandFilter,
    ) -> BandResult<Vec<BandRecord>> {
        let mut records = Vec::new();
        for variable in self.catalog.variables() {
            match self.check_variable(&variable, filter) {
                Ok(()) => {}
                Err(err) if err.is_not_applicable() => {
                    debug!("Skipping variable '{}': {}", variable, err);
                    continue;
                }
                Err(err) => return Err(err),
            }
            let descriptor = self.catalog.describe(&variable)?;
            records.push(resolve_descriptor(&descriptor, source_filename, selection, filter)?);
        }
        Ok(records)
    }

    /// Applies `filter` from the variable's tags alone.
    fn check_variable(&self, variable: &str, filter: &BandFilter) -> BandResult<()> {
        if *filter == BandFilter::All {
            return Ok(());
        }
        let standard_name = self.catalog.standard_name(variable)?;
        if filter.admits_tag(variable, standard_name.as_deref()) {
            Ok(())
        } else {
            Err(BandError::NotApplicable {
                variable: variable.to_string(),
                tag: standard_name.unwrap_or_else(|| variable.to_string()),
            })
        }
    }
}

/// Resolves `selection` against an already described variable.
pub fn resolve_descriptor(
    descriptor: &VariableDescriptor,
    source_filename: &str,
    selection: &CoordinateSelection,
    filter: &BandFilter,
) -> BandResult<BandRecord> {
    check_filter(descriptor, filter)?;

    let layout = BandLayout::from_descriptor(descriptor);
    let indices = descriptor
        .dimensions()
        .iter()
        .enumerate()
        .map(|(position, dimension)| {
            let needed = layout.role(position) == DimensionRole::Band
                || matches!(dimension.kind, DimensionKind::Time(_));
            if needed {
                resolve_index(dimension, selection.get(&dimension.name))
            } else {
                Ok(0)
            }
        })
        .collect::<BandResult<Vec<_>>>()?;

    let record = build_record(descriptor, &layout, &indices, source_filename)?;
    debug!(
        "Resolved {} of '{}' to band {} of {}",
        format_selection(selection),
        descriptor.name,
        record.source_band,
        record.band_count
    );
    Ok(record)
}

fn check_filter(descriptor: &VariableDescriptor, filter: &BandFilter) -> BandResult<()> {
    if filter.admits(descriptor) {
        Ok(())
    } else {
        Err(BandError::NotApplicable {
            variable: descriptor.name.clone(),
            tag: descriptor.identifying_tag().to_string(),
        })
    }
}

/// Index along `dimension` for a requested value, 0 when none is requested.
fn resolve_index(dimension: &Dimension, requested: Option<&CoordinateValue>) -> BandResult<usize> {
    if dimension.coordinates.is_empty() {
        return Err(BandError::EmptyDimension(dimension.name.clone()));
    }
    let query = match (requested, &dimension.kind) {
        (None, _) => return Ok(0),
        (Some(CoordinateValue::Numeric(value)), _) => *value,
        (Some(CoordinateValue::Instant(instant)), DimensionKind::Time(encoding)) => encoding.encode(*instant),
        (Some(value @ CoordinateValue::Instant(_)), DimensionKind::Numeric) => {
            return Err(BandError::CoordinateKind {
                dimension: dimension.name.clone(),
                value: value.to_string(),
            });
        }
    };
    nearest_index(&dimension.coordinates, query).ok_or_else(|| BandError::InvalidCoordinate {
        dimension: dimension.name.clone(),
        value: query.to_string(),
    })
}

/// Builds the record for per-position indices (one per declared dimension).
fn build_record(
    descriptor: &VariableDescriptor,
    layout: &BandLayout,
    indices: &[usize],
    source_filename: &str,
) -> BandResult<BandRecord> {
    let mut resolved_coordinates = BTreeMap::new();
    for position in layout.stacked() {
        let dimension = &descriptor.dimensions()[position];
        let value = dimension
            .native_value(indices[position])
            .ok_or_else(|| BandError::EmptyDimension(dimension.name.clone()))?;
        resolved_coordinates.insert(format!("{}{}", DIM_KEY_PREFIX, dimension.name), value);
    }

    let stacked_indices: Vec<usize> = layout.stacked().map(|position| indices[position]).collect();

    let resolved_time = match descriptor.time_dimension() {
        Some((position, dimension)) => {
            let value = dimension
                .coordinates
                .get(indices[position])
                .ok_or_else(|| BandError::EmptyDimension(dimension.name.clone()))?;
            dimension.time_encoding().map(|encoding| encoding.decode(*value)).transpose()?
        }
        None => None,
    };

    Ok(BandRecord {
        source_filename: source_filename.to_string(),
        source_band: layout.band_number(&stacked_indices),
        variable: descriptor.name.clone(),
        raster_x_size: layout.raster_x_size(),
        raster_y_size: layout.raster_y_size(),
        band_count: layout.band_count(),
        resolved_coordinates,
        resolved_time,
        attributes: descriptor.attributes.clone(),
    })
}

fn format_selection(selection: &CoordinateSelection) -> String {
    let parts: Vec<String> = selection
        .iter()
        .map(|(name, value)| format!("{}={}", name, value))
        .collect();
    format!("{{{}}}", parts.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::MemoryCatalog;
    use crate::timeunits::TimeEncoding;
    use chrono::{TimeZone, Utc};

    const TIMES: [f64; 3] = [1560610800.0, 1560621600.0, 1560632400.0];
    const PRESSURES: [f64; 7] = [200.0, 250.0, 300.0, 400.0, 500.0, 700.0, 800.0];

    fn seconds_since_epoch() -> TimeEncoding {
        TimeEncoding::parse("seconds since 1970-01-01 00:00", None).unwrap()
    }

    fn fixture() -> MemoryCatalog {
        let mut catalog = MemoryCatalog::new();
        catalog
            .add_dimension(Dimension::time("time", TIMES.to_vec(), seconds_since_epoch()).integral())
            .add_dimension(Dimension::numeric("pressure", PRESSURES.to_vec()).integral())
            .add_dimension(Dimension::numeric("height", (1..=10).map(|h| h as f64 * 10.0).collect()).integral())
            .add_dimension(Dimension::numeric("latitude", (0..30).map(|i| i as f64 * 2.0).collect()).integral())
            .add_dimension(Dimension::numeric("longitude", (0..20).map(|i| i as f64).collect()).integral())
            .add_variable("var2d", &["latitude", "longitude"], &[])
            .add_variable("var3d", &["time", "latitude", "longitude"], &[("standard_name", "x_wind")])
            .add_variable("var4d", &["time", "pressure", "latitude", "longitude"], &[("standard_name", "x_wind")])
            .add_variable(
                "var5d",
                &["time", "pressure", "height", "latitude", "longitude"],
                &[("standard_name", "x_wind")],
            )
            .add_variable("buggy_var", &["time", "latitude", "longitude", "pressure"], &[("standard_name", "x_wind")])
            .add_variable("profile", &["latitude", "time"], &[("standard_name", "y_wind")]);
        catalog
    }

    fn second_time() -> CoordinateValue {
        CoordinateValue::Instant(Utc.with_ymd_and_hms(2019, 6, 15, 18, 0, 0).unwrap())
    }

    fn x_wind() -> BandFilter {
        BandFilter::only(["x_wind"])
    }

    fn resolve(variable: &str, selection: &CoordinateSelection) -> BandResult<BandRecord> {
        let catalog = fixture();
        let id = SubdatasetId::new("/tmp/fixture.nc", variable);
        BandResolver::new(&catalog).resolve(&id, selection, &x_wind())
    }

    #[test]
    fn test_default_selection_is_first_band() {
        let record = resolve("var3d", &CoordinateSelection::new()).unwrap();
        assert_eq!(record.source_band, 1);
        assert_eq!(record.dimension_value("time"), Some("1560610800"));
        assert_eq!(
            record.resolved_time,
            Some(Utc.with_ymd_and_hms(2019, 6, 15, 15, 0, 0).unwrap())
        );
        assert_eq!(record.band_count, 3);
    }

    #[test]
    fn test_time_and_pressure_selection() {
        let selection = CoordinateSelection::new()
            .with("time", second_time())
            .with("pressure", CoordinateValue::Numeric(200.0));
        let record = resolve("var4d", &selection).unwrap();
        assert_eq!(record.source_band, 8);
        assert_eq!(record.dimension_value("pressure"), Some("200"));

        let selection = selection.with("pressure", CoordinateValue::Numeric(500.0));
        let record = resolve("var4d", &selection).unwrap();
        assert_eq!(record.source_band, 12);
        assert_eq!(record.dimension_value("pressure"), Some("500"));
        assert_eq!(record.resolved_time, Some(Utc.with_ymd_and_hms(2019, 6, 15, 18, 0, 0).unwrap()));
    }

    #[test]
    fn test_pixel_grid_is_last_two_dimensions() {
        let record = resolve("buggy_var", &CoordinateSelection::new()).unwrap();
        assert_eq!(record.source_band, 1);
        assert_eq!(record.dimension_value("latitude"), Some("0"));
        assert_eq!(record.dimension_value("pressure"), None);
        assert_eq!(record.dimension_value("longitude"), None);
        assert_eq!(record.raster_x_size, 7);
        assert_eq!(record.raster_y_size, 20);
        assert_eq!(record.band_count, 90);

        // latitude is stacked: time index 1, latitude 4.0 at index 2
        let selection = CoordinateSelection::new()
            .with("time", second_time())
            .with("latitude", CoordinateValue::Numeric(4.0));
        assert_eq!(resolve("buggy_var", &selection).unwrap().source_band, 1 + 30 + 2);
    }

    #[test]
    fn test_time_in_pixel_grid_is_still_decoded() {
        let catalog = fixture();
        let id = SubdatasetId::new("/tmp/fixture.nc", "profile");
        let selection = CoordinateSelection::new().with("time", second_time());
        let record = BandResolver::new(&catalog)
            .resolve(&id, &selection, &BandFilter::All)
            .unwrap();
        assert_eq!(record.source_band, 1);
        assert!(record.resolved_coordinates.is_empty());
        assert_eq!(record.resolved_time, Some(Utc.with_ymd_and_hms(2019, 6, 15, 18, 0, 0).unwrap()));
    }

    #[test]
    fn test_five_dimensional_selections() {
        let cases = [
            (
                CoordinateSelection::new()
                    .with("time", second_time())
                    .with("pressure", CoordinateValue::Numeric(200.0))
                    .with("height", CoordinateValue::Numeric(20.0)),
                72,
                "20",
                "200",
            ),
            (
                CoordinateSelection::new()
                    .with("time", second_time())
                    .with("pressure", CoordinateValue::Numeric(200.0)),
                71,
                "10",
                "200",
            ),
            (CoordinateSelection::new().with("time", second_time()), 71, "10", "200"),
            (CoordinateSelection::new().with("pressure", CoordinateValue::Numeric(300.0)), 21, "10", "300"),
            (CoordinateSelection::new().with("height", CoordinateValue::Numeric(30.0)), 3, "30", "200"),
            (CoordinateSelection::new(), 1, "10", "200"),
        ];
        for (selection, band, height, pressure) in cases {
            let record = resolve("var5d", &selection).unwrap();
            assert_eq!(record.source_band, band, "{}", format_selection(&selection));
            assert_eq!(record.dimension_value("height"), Some(height));
            assert_eq!(record.dimension_value("pressure"), Some(pressure));
        }
    }

    #[test]
    fn test_nearest_match_and_clamping() {
        let between = CoordinateSelection::new().with("pressure", CoordinateValue::Numeric(460.0));
        assert_eq!(resolve("var4d", &between).unwrap().dimension_value("pressure"), Some("500"));

        let below = CoordinateSelection::new().with("pressure", CoordinateValue::Numeric(1.0));
        assert_eq!(resolve("var4d", &below).unwrap().source_band, 1);

        let above = CoordinateSelection::new().with("pressure", CoordinateValue::Numeric(1013.0));
        assert_eq!(resolve("var4d", &above).unwrap().source_band, 7);

        let tie = CoordinateSelection::new().with("pressure", CoordinateValue::Numeric(600.0));
        assert_eq!(resolve("var4d", &tie).unwrap().dimension_value("pressure"), Some("500"));
    }

    #[test]
    fn test_numeric_time_is_encoded_value() {
        let selection = CoordinateSelection::new().with("time", CoordinateValue::Numeric(1560632000.0));
        let record = resolve("var3d", &selection).unwrap();
        assert_eq!(record.source_band, 3);
    }

    #[test]
    fn test_unknown_dimensions_are_ignored() {
        let selection = CoordinateSelection::new()
            .with("height", CoordinateValue::Numeric(50.0))
            .with("ensemble", CoordinateValue::Numeric(3.0));
        let record = resolve("var4d", &selection).unwrap();
        assert_eq!(record.source_band, 1);
        assert_eq!(record.dimension_value("height"), None);
    }

    #[test]
    fn test_instant_on_numeric_dimension_fails() {
        let selection = CoordinateSelection::new().with("pressure", second_time());
        let err = resolve("var4d", &selection).unwrap_err();
        assert!(matches!(err, BandError::CoordinateKind { ref dimension, .. } if dimension == "pressure"));
    }

    #[test]
    fn test_infinite_queries_land_on_coordinate_bounds() {
        let top = CoordinateSelection::new().with("pressure", CoordinateValue::Numeric(f64::INFINITY));
        let record = resolve("var4d", &top).unwrap();
        assert_eq!(record.source_band, 7);
        assert_eq!(record.dimension_value("pressure"), Some("800"));

        let bottom = CoordinateSelection::new().with("pressure", CoordinateValue::Numeric(f64::NEG_INFINITY));
        assert_eq!(resolve("var4d", &bottom).unwrap().dimension_value("pressure"), Some("200"));
    }

    #[test]
    fn test_nan_query_is_rejected() {
        let selection = CoordinateSelection::new().with("pressure", CoordinateValue::Numeric(f64::NAN));
        let err = resolve("var4d", &selection).unwrap_err();
        assert!(matches!(err, BandError::InvalidCoordinate { ref dimension, .. } if dimension == "pressure"));
        assert!(err.to_string().contains("NaN"));
    }

    #[test]
    fn test_resolution_is_deterministic() {
        let selection = CoordinateSelection::new()
            .with("time", second_time())
            .with("pressure", CoordinateValue::Numeric(500.0));
        let first = resolve("var4d", &selection).unwrap();
        let second = resolve("var4d", &selection).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_filter_rejects_before_resolution() {
        // an instant on a numeric dimension would fail, but the filter wins
        let selection = CoordinateSelection::new().with("pressure", second_time());
        let catalog = fixture();
        let id = SubdatasetId::new("/tmp/fixture.nc", "var4d");
        let err = BandResolver::new(&catalog)
            .resolve(&id, &selection, &BandFilter::only(["air_temperature"]))
            .unwrap_err();
        assert!(err.is_not_applicable());

        let err = resolve("var2d", &CoordinateSelection::new()).unwrap_err();
        assert!(matches!(err, BandError::NotApplicable { ref tag, .. } if tag == "var2d"));
    }

    #[test]
    fn test_filter_matches_variable_name() {
        let descriptor = fixture().describe("var2d").unwrap();
        assert!(BandFilter::only(["var2d"]).admits(&descriptor));
        assert!(BandFilter::All.admits(&descriptor));
        assert_eq!(BandFilter::from_tags(&[]), BandFilter::All);
    }

    #[test]
    fn test_empty_stacked_dimension() {
        let descriptor = VariableDescriptor::new(
            "empty",
            vec![
                Dimension::time("time", vec![], seconds_since_epoch()),
                Dimension::indexed("y", 2),
                Dimension::indexed("x", 2),
            ],
        )
        .unwrap();
        let err = resolve_descriptor(&descriptor, "x.nc", &CoordinateSelection::new(), &BandFilter::All)
            .unwrap_err();
        assert!(matches!(err, BandError::EmptyDimension(ref name) if name == "time"));
    }

    #[test]
    fn test_enumerate_matches_resolve() {
        let catalog = fixture();
        let resolver = BandResolver::new(&catalog);
        let id = SubdatasetId::new("/tmp/fixture.nc", "var4d");
        let records = resolver.enumerate(&id, &x_wind()).unwrap();
        assert_eq!(records.len(), 21);

        let twelfth = &records[11];
        assert_eq!(twelfth.source_band, 12);
        assert_eq!(twelfth.dimension_value("time"), Some("1560621600"));
        assert_eq!(twelfth.dimension_value("pressure"), Some("500"));

        let selection = CoordinateSelection::new()
            .with("time", CoordinateValue::Numeric(1560621600.0))
            .with("pressure", CoordinateValue::Numeric(500.0));
        assert_eq!(&resolver.resolve(&id, &selection, &x_wind()).unwrap(), twelfth);
    }

    #[test]
    fn test_scan_skips_filtered_variables() {
        let catalog = fixture();
        let records = BandResolver::new(&catalog)
            .scan("/tmp/fixture.nc", &CoordinateSelection::new(), &x_wind())
            .unwrap();
        let names: Vec<&str> = records.iter().map(|r| r.variable.as_str()).collect();
        assert_eq!(names, vec!["var3d", "var4d", "var5d", "buggy_var"]);
    }

    #[test]
    fn test_scan_never_describes_filtered_out_variables() {
        let mut catalog = fixture();
        catalog.add_variable(
            "ocean_temp",
            &["depth", "latitude", "longitude"],
            &[("standard_name", "sea_water_temperature")],
        );
        let resolver = BandResolver::new(&catalog);

        let records = resolver
            .scan("/tmp/fixture.nc", &CoordinateSelection::new(), &x_wind())
            .unwrap();
        let names: Vec<&str> = records.iter().map(|r| r.variable.as_str()).collect();
        assert_eq!(names, vec!["var3d", "var4d", "var5d", "buggy_var"]);

        // without a filter the broken variable is described and fails
        let err = resolver
            .scan("/tmp/fixture.nc", &CoordinateSelection::new(), &BandFilter::All)
            .unwrap_err();
        assert!(matches!(err, BandError::DimensionNotFound { ref dimension, .. } if dimension == "depth"));

        let id = SubdatasetId::new("/tmp/fixture.nc", "ocean_temp");
        assert!(resolver.enumerate(&id, &x_wind()).unwrap_err().is_not_applicable());
    }

    #[test]
    fn test_missing_variable_is_not_found() {
        let err = resolve("var6d", &CoordinateSelection::new()).unwrap_err();
        assert!(err.is_not_found());
    }
}
