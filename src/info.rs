//! # NetCDF Band Layout Information Module
//!
//! Shows how the raster library will see each variable of a NetCDF file:
//! which dimensions are stacked into bands, which form the pixel grid, and
//! how many bands result.

use crate::catalog::{DimensionCatalog, DimensionKind, NetcdfCatalog, VariableDescriptor};
use crate::error::BandResult;
use crate::layout::{BandLayout, DimensionRole};
use anyhow::{Context, Result};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One dimension of a variable and the role it plays in the raster view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimensionLayoutInfo {
    pub name: String,
    pub size: usize,
    pub role: DimensionRole,
    pub is_time: bool,
    pub first: Option<String>,
    pub last: Option<String>,
}

/// Raster view of one variable
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableLayoutInfo {
    pub name: String,
    pub tag: String,
    pub dimensions: Vec<DimensionLayoutInfo>,
    pub raster_x_size: usize,
    pub raster_y_size: usize,
    pub band_count: usize,
    pub attributes: BTreeMap<String, String>,
}

/// Raster view of a whole file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileLayoutInfo {
    pub path: String,
    pub variables: Vec<VariableLayoutInfo>,
}

impl VariableLayoutInfo {
    pub fn from_descriptor(descriptor: &VariableDescriptor) -> Self {
        let layout = BandLayout::from_descriptor(descriptor);
        let dimensions = descriptor
            .dimensions()
            .iter()
            .enumerate()
            .map(|(position, dim)| DimensionLayoutInfo {
                name: dim.name.clone(),
                size: dim.size(),
                role: layout.role(position),
                is_time: matches!(dim.kind, DimensionKind::Time(_)),
                first: dim.native_value(0),
                last: dim.size().checked_sub(1).and_then(|i| dim.native_value(i)),
            })
            .collect();

        VariableLayoutInfo {
            name: descriptor.name.clone(),
            tag: descriptor.identifying_tag().to_string(),
            dimensions,
            raster_x_size: layout.raster_x_size(),
            raster_y_size: layout.raster_y_size(),
            band_count: layout.band_count(),
            attributes: descriptor.attributes.clone(),
        }
    }
}

/// Describes the raster variables of a catalog, or just `variable`.
pub fn describe_catalog<C: DimensionCatalog + ?Sized>(
    catalog: &C,
    variable: Option<&str>,
) -> BandResult<Vec<VariableLayoutInfo>> {
    let names = match variable {
        Some(name) => vec![name.to_string()],
        None => catalog.variables(),
    };
    names
        .iter()
        .map(|name| catalog.describe(name).map(|d| VariableLayoutInfo::from_descriptor(&d)))
        .collect()
}

/// Extract band layout information from a NetCDF file
pub fn get_file_layout(file_path: &str, variable: Option<&str>) -> Result<FileLayoutInfo> {
    debug!("Opening NetCDF file: {}", file_path);
    let file = netcdf::open(file_path)
        .with_context(|| format!("Failed to open NetCDF file: {}", file_path))?;

    let variables = describe_catalog(&NetcdfCatalog::new(&file), variable)
        .with_context(|| format!("Failed to describe variables of {}", file_path))?;

    file.close().context("Failed to close NetCDF file")?;

    Ok(FileLayoutInfo {
        path: file_path.to_string(),
        variables,
    })
}

/// Print layout info in human-readable format
pub fn print_layout_human(info: &FileLayoutInfo) {
    println!("NetCDF Band Layout:");
    println!("  Path: {}", info.path);
    println!("  Variables: {} total", info.variables.len());
    for var in &info.variables {
        println!(
            "    {} ({}) - {} band(s) of {} x {} pixels",
            var.name, var.tag, var.band_count, var.raster_x_size, var.raster_y_size
        );
        for dim in &var.dimensions {
            let range = match (&dim.first, &dim.last) {
                (Some(first), Some(last)) => format!(" [{} .. {}]", first, last),
                _ => String::new(),
            };
            println!(
                "      {:<6} {} ({}{}){}",
                dim.role.as_str(),
                dim.name,
                dim.size,
                if dim.is_time { ", time" } else { "" },
                range
            );
        }
    }
}

/// Print layout info in JSON format
pub fn print_layout_json(info: &FileLayoutInfo) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(info)?);
    Ok(())
}

/// Print layout info in YAML format
pub fn print_layout_yaml(info: &FileLayoutInfo) -> Result<()> {
    let yaml = serde_yaml::to_string(info).context("Failed to serialize layout info to YAML")?;
    println!("{}", yaml);
    Ok(())
}
