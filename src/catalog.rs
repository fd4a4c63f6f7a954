//! # Dimension Catalog
//!
//! Read-only view of a variable's dimensions in declared order, with the
//! coordinate values and time encodings needed to resolve bands.
//!
//! [`NetcdfCatalog`] reads descriptors straight from an open NetCDF file and
//! borrows it, so nothing built on top of it can outlive the file.
//! [`MemoryCatalog`] holds descriptors built in code.

use crate::coords::{StorageKind, format_native};
use crate::error::{BandError, BandResult};
use crate::timeunits::TimeEncoding;
use log::{debug, warn};
use netcdf::types::{FloatType, NcVariableType};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

/// How the values along a dimension are interpreted
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum DimensionKind {
    Numeric,
    Time(TimeEncoding),
}

/// One dimension of a variable with its coordinate values.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dimension {
    pub name: String,
    pub coordinates: Vec<f64>,
    /// On-disk type of the coordinate variable
    pub storage: StorageKind,
    pub kind: DimensionKind,
}

impl Dimension {
    pub fn numeric(name: impl Into<String>, coordinates: Vec<f64>) -> Self {
        Dimension {
            name: name.into(),
            coordinates,
            storage: StorageKind::Float64,
            kind: DimensionKind::Numeric,
        }
    }

    pub fn time(name: impl Into<String>, coordinates: Vec<f64>, encoding: TimeEncoding) -> Self {
        Dimension {
            name: name.into(),
            coordinates,
            storage: StorageKind::Float64,
            kind: DimensionKind::Time(encoding),
        }
    }

    /// Index coordinates `0..size`, used when no coordinate variable exists.
    pub fn indexed(name: impl Into<String>, size: usize) -> Self {
        Dimension::numeric(name, (0..size).map(|i| i as f64).collect()).integral()
    }

    pub fn integral(mut self) -> Self {
        self.storage = StorageKind::Integer;
        self
    }

    pub fn float32(mut self) -> Self {
        self.storage = StorageKind::Float32;
        self
    }

    pub fn size(&self) -> usize {
        self.coordinates.len()
    }

    pub fn time_encoding(&self) -> Option<&TimeEncoding> {
        match &self.kind {
            DimensionKind::Time(encoding) => Some(encoding),
            DimensionKind::Numeric => None,
        }
    }

    /// The coordinate at `index` formatted the way the file stores it.
    pub fn native_value(&self, index: usize) -> Option<String> {
        self.coordinates
            .get(index)
            .map(|&value| format_native(value, self.storage))
    }
}

/// A variable and its dimensions in the order the file declares them.
///
/// Always holds at least two dimensions; [`VariableDescriptor::new`] is the
/// only way to build one.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VariableDescriptor {
    pub name: String,
    dimensions: Vec<Dimension>,
    pub attributes: BTreeMap<String, String>,
}

impl VariableDescriptor {
    pub fn new(name: impl Into<String>, dimensions: Vec<Dimension>) -> BandResult<Self> {
        let name = name.into();
        if dimensions.len() < 2 {
            return Err(BandError::TooFewDimensions {
                variable: name,
                found: dimensions.len(),
            });
        }
        Ok(VariableDescriptor {
            name,
            dimensions,
            attributes: BTreeMap::new(),
        })
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn standard_name(&self) -> Option<&str> {
        self.attributes.get("standard_name").map(String::as_str)
    }

    /// `standard_name` when present, otherwise the variable name.
    pub fn identifying_tag(&self) -> &str {
        self.standard_name().unwrap_or(&self.name)
    }

    pub fn dimensions(&self) -> &[Dimension] {
        &self.dimensions
    }

    pub fn dimension(&self, name: &str) -> Option<&Dimension> {
        self.dimensions.iter().find(|d| d.name == name)
    }

    pub fn dimension_names(&self) -> Vec<&str> {
        self.dimensions.iter().map(|d| d.name.as_str()).collect()
    }

    /// Position and dimension of the first time dimension.
    pub fn time_dimension(&self) -> Option<(usize, &Dimension)> {
        self.dimensions
            .iter()
            .enumerate()
            .find(|(_, d)| matches!(d.kind, DimensionKind::Time(_)))
    }
}

/// Source of variable descriptors.
pub trait DimensionCatalog {
    /// Describes `variable`, failing with a not-found error when the variable
    /// or one of its dimensions is absent.
    fn describe(&self, variable: &str) -> BandResult<VariableDescriptor>;

    /// The `standard_name` attribute of `variable`, read without describing
    /// its dimensions.
    fn standard_name(&self, variable: &str) -> BandResult<Option<String>>;

    /// Names of the variables that can be read as rasters (two or more
    /// dimensions), in catalog order.
    fn variables(&self) -> Vec<String>;
}

/// Catalog backed by an open NetCDF file.
pub struct NetcdfCatalog<'f> {
    file: &'f netcdf::File,
}

impl<'f> NetcdfCatalog<'f> {
    pub fn new(file: &'f netcdf::File) -> Self {
        NetcdfCatalog { file }
    }

    fn read_dimension(&self, dim: &netcdf::Dimension) -> BandResult<Dimension> {
        let name = dim.name().to_string();
        let size = dim.len();

        let coord_var = match self.file.variable(&name) {
            Some(var) if var.dimensions().len() == 1 => var,
            _ => {
                debug!("Dimension '{}' has no coordinate variable, using indices", name);
                return Ok(Dimension::indexed(name, size));
            }
        };

        let values = coord_var.get::<f64, _>(..)?;
        let coordinates: Vec<f64> = values.iter().copied().collect();
        if coordinates.len() != size {
            return Err(BandError::CoordinateLength {
                dimension: name,
                expected: size,
                found: coordinates.len(),
            });
        }
        if coordinates.iter().any(|v| v.is_nan()) {
            warn!("Coordinate variable '{}' contains NaN values", name);
        }

        let storage = match coord_var.vartype() {
            NcVariableType::Int(_) => StorageKind::Integer,
            NcVariableType::Float(FloatType::F32) => StorageKind::Float32,
            _ => StorageKind::Float64,
        };
        let units = string_attribute(&coord_var, "units");
        let calendar = string_attribute(&coord_var, "calendar");
        let is_time = name.eq_ignore_ascii_case("time")
            || string_attribute(&coord_var, "standard_name").as_deref() == Some("time")
            || string_attribute(&coord_var, "axis").as_deref() == Some("T")
            || calendar.is_some();

        let kind = match (is_time, units) {
            (true, Some(units)) => {
                DimensionKind::Time(TimeEncoding::parse(&units, calendar.as_deref())?)
            }
            (true, None) => {
                debug!("Time dimension '{}' has no units, treating it as numeric", name);
                DimensionKind::Numeric
            }
            (false, _) => DimensionKind::Numeric,
        };

        Ok(Dimension {
            name,
            coordinates,
            storage,
            kind,
        })
    }
}

impl DimensionCatalog for NetcdfCatalog<'_> {
    fn describe(&self, variable: &str) -> BandResult<VariableDescriptor> {
        let var = self
            .file
            .variable(variable)
            .ok_or_else(|| BandError::VariableNotFound(variable.to_string()))?;

        let dimensions = var
            .dimensions()
            .iter()
            .map(|dim| self.read_dimension(dim))
            .collect::<BandResult<Vec<_>>>()?;
        debug!(
            "Variable '{}' declares dimensions {:?}",
            variable,
            dimensions.iter().map(|d| d.name.as_str()).collect::<Vec<_>>()
        );

        let mut descriptor = VariableDescriptor::new(var.name().to_string(), dimensions)?;
        for attr in var.attributes() {
            if let Ok(value) = attr.value() {
                descriptor
                    .attributes
                    .insert(attr.name().to_string(), format_attribute_value(&value));
            }
        }
        Ok(descriptor)
    }

    fn standard_name(&self, variable: &str) -> BandResult<Option<String>> {
        let var = self
            .file
            .variable(variable)
            .ok_or_else(|| BandError::VariableNotFound(variable.to_string()))?;
        Ok(string_attribute(&var, "standard_name"))
    }

    fn variables(&self) -> Vec<String> {
        self.file
            .variables()
            .filter(|var| var.dimensions().len() >= 2)
            .map(|var| var.name().to_string())
            .collect()
    }
}

fn string_attribute(var: &netcdf::Variable, name: &str) -> Option<String> {
    if !var.attributes().any(|attr| attr.name() == name) {
        return None;
    }
    match var.attribute_value(name)?.ok()? {
        netcdf::AttributeValue::Str(s) => Some(s),
        _ => None,
    }
}

/// Formats an attribute value as band metadata text.
fn format_attribute_value(value: &netcdf::AttributeValue) -> String {
    use netcdf::AttributeValue;

    fn join<T: ToString>(values: &[T]) -> String {
        values.iter().map(T::to_string).collect::<Vec<_>>().join(",")
    }

    match value {
        AttributeValue::Str(s) => s.clone(),
        AttributeValue::Strs(s) => s.join(","),
        AttributeValue::Schar(v) => v.to_string(),
        AttributeValue::Uchar(v) => v.to_string(),
        AttributeValue::Short(v) => v.to_string(),
        AttributeValue::Ushort(v) => v.to_string(),
        AttributeValue::Int(v) => v.to_string(),
        AttributeValue::Uint(v) => v.to_string(),
        AttributeValue::Longlong(v) => v.to_string(),
        AttributeValue::Ulonglong(v) => v.to_string(),
        AttributeValue::Float(v) => v.to_string(),
        AttributeValue::Double(v) => v.to_string(),
        AttributeValue::Schars(v) => join(v),
        AttributeValue::Uchars(v) => join(v),
        AttributeValue::Shorts(v) => join(v),
        AttributeValue::Ushorts(v) => join(v),
        AttributeValue::Ints(v) => join(v),
        AttributeValue::Uints(v) => join(v),
        AttributeValue::Longlongs(v) => join(v),
        AttributeValue::Ulonglongs(v) => join(v),
        AttributeValue::Floats(v) => join(v),
        AttributeValue::Doubles(v) => join(v),
    }
}

/// In-memory catalog: a dimension table plus variables that reference
/// dimensions by name.
#[derive(Debug, Clone, Default)]
pub struct MemoryCatalog {
    dimensions: HashMap<String, Dimension>,
    variables: Vec<(String, Vec<String>, BTreeMap<String, String>)>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_dimension(&mut self, dimension: Dimension) -> &mut Self {
        self.dimensions.insert(dimension.name.clone(), dimension);
        self
    }

    pub fn add_variable(&mut self, name: &str, dimensions: &[&str], attributes: &[(&str, &str)]) -> &mut Self {
        self.variables.push((
            name.to_string(),
            dimensions.iter().map(|d| d.to_string()).collect(),
            attributes
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        ));
        self
    }
}

impl DimensionCatalog for MemoryCatalog {
    fn describe(&self, variable: &str) -> BandResult<VariableDescriptor> {
        let (name, dimension_names, attributes) = self
            .variables
            .iter()
            .find(|(name, _, _)| name == variable)
            .ok_or_else(|| BandError::VariableNotFound(variable.to_string()))?;

        let dimensions = dimension_names
            .iter()
            .map(|dim| {
                self.dimensions
                    .get(dim)
                    .cloned()
                    .ok_or_else(|| BandError::DimensionNotFound {
                        variable: name.clone(),
                        dimension: dim.clone(),
                    })
            })
            .collect::<BandResult<Vec<_>>>()?;

        let mut descriptor = VariableDescriptor::new(name.clone(), dimensions)?;
        descriptor.attributes = attributes.clone();
        Ok(descriptor)
    }

    fn standard_name(&self, variable: &str) -> BandResult<Option<String>> {
        self.variables
            .iter()
            .find(|(name, _, _)| name == variable)
            .map(|(_, _, attributes)| attributes.get("standard_name").cloned())
            .ok_or_else(|| BandError::VariableNotFound(variable.to_string()))
    }

    fn variables(&self) -> Vec<String> {
        self.variables
            .iter()
            .filter(|(_, dimensions, _)| dimensions.len() >= 2)
            .map(|(name, _, _)| name.clone())
            .collect()
    }
}
