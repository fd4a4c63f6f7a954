//! # CLI Module
//!
//! This module provides the command-line interface for ncband, including:
//! - Argument parsing with clap
//! - Job file loading (JSON/YAML)
//! - Environment variable support with the NCBAND_ prefix
//! - Merging of job file, environment and command-line values
//! - Job template generation

use crate::coords::{CoordinateSelection, CoordinateValue};
use crate::input::JobConfig;
use clap::{Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

/// Resolve NetCDF coordinate selections to raster band numbers
#[derive(Parser, Debug)]
#[command(name = "ncband")]
#[command(about = "Map NetCDF coordinate selections to GDAL-style raster band numbers")]
#[command(version)]
#[command(author = "Rogerio Alves <rjmalves@users.noreply.github.com>")]
#[command(long_about = "
ncband tells you which band of a raster library's NetCDF view holds the slice
you want, and which metadata that band carries.

The last two declared dimensions of a variable form the pixel grid; every
other dimension is stacked into bands in declared order. Values are matched
to the nearest stored coordinate, times may be given as ISO-8601.

EXAMPLES:
  # Band of u at 500 hPa, 18:00 UTC
  ncband resolve 'NETCDF:\"era5.nc\":u' --dim pressure=500 --dim time=2019-06-15T18:00

  # Every band of a variable
  ncband bands 'NETCDF:\"era5.nc\":u'

  # Resolve all wind variables of a file
  ncband scan era5.nc --dim pressure=850 --band x_wind --band y_wind

  # Dimension roles per variable
  ncband info era5.nc

  # Using a job file
  ncband resolve --config job.yaml
")]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Quiet mode - suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Output format for structured data
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Human)]
    pub output_format: OutputFormat,

    /// Job file path (JSON or YAML)
    #[arg(short, long, global = true, env = "NCBAND_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Resolve a coordinate selection to a band number
    #[command(long_about = "
Resolve a coordinate selection to a single band of a subdataset.

Dimensions that are not given resolve to their first index. Values for
dimensions the variable does not have are ignored.

EXAMPLES:
  ncband resolve 'NETCDF:\"data.nc\":var5d' --dim time=2019-06-15T18:00 --dim height=20

  # JSON output for scripting
  ncband --output-format json resolve 'NETCDF:\"data.nc\":var4d' -d pressure=500
")]
    Resolve {
        /// Subdataset identifier, NETCDF:\"<path>\":<variable>
        #[arg(value_name = "SUBDATASET", env = "NCBAND_SUBDATASET")]
        subdataset: Option<String>,

        /// Requested coordinate: dimension=value (can be used multiple times)
        #[arg(short = 'd', long = "dim", value_parser = parse_dimension)]
        dims: Vec<DimensionArg>,

        /// Only accept variables with this standard name (can be used multiple times)
        #[arg(short = 'b', long = "band")]
        bands: Vec<String>,
    },

    /// List every band of a subdataset
    Bands {
        /// Subdataset identifier, NETCDF:\"<path>\":<variable>
        #[arg(value_name = "SUBDATASET", env = "NCBAND_SUBDATASET")]
        subdataset: Option<String>,

        /// Only accept variables with this standard name (can be used multiple times)
        #[arg(short = 'b', long = "band")]
        bands: Vec<String>,
    },

    /// Resolve a coordinate selection against every variable of a file
    Scan {
        /// NetCDF file path
        file: PathBuf,

        /// Requested coordinate: dimension=value (can be used multiple times)
        #[arg(short = 'd', long = "dim", value_parser = parse_dimension)]
        dims: Vec<DimensionArg>,

        /// Only accept variables with this standard name (can be used multiple times)
        #[arg(short = 'b', long = "band")]
        bands: Vec<String>,
    },

    /// Show how each variable of a file is laid out as bands
    Info {
        /// NetCDF file path
        file: String,

        /// Show only specific variable info
        #[arg(short = 'n', long)]
        variable: Option<String>,

        /// Output format for file information
        #[arg(long, value_enum)]
        format: Option<OutputFormat>,
    },

    /// Generate job file templates
    Template {
        /// Template type to generate
        #[arg(value_enum)]
        template_type: TemplateType,

        /// Output file path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Configuration format
        #[arg(long, value_enum, default_value_t = ConfigFormat::Json)]
        format: ConfigFormat,
    },

    /// Generate shell completions
    #[command(long_about = "
Generate shell completion scripts for bash, zsh, fish and PowerShell.

INSTALLATION:
  # Bash
  ncband completions bash > ~/.bash_completion.d/ncband

  # Zsh
  ncband completions zsh > ~/.zsh/completions/_ncband

  # Fish
  ncband completions fish > ~/.config/fish/completions/ncband.fish
")]
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,

        /// Output file path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON structured output
    Json,
    /// YAML structured output
    Yaml,
}

#[derive(ValueEnum, Clone, Debug, PartialEq, Eq)]
pub enum TemplateType {
    /// Single variable, no coordinates
    Basic,
    /// Pressure level and time selection
    Pressure,
    /// Height and time selection
    Height,
}

#[derive(ValueEnum, Clone, Debug, PartialEq, Eq)]
pub enum ConfigFormat {
    /// JSON configuration format
    Json,
    /// YAML configuration format
    Yaml,
}

/// Requested coordinate from the command line
#[derive(Clone, Debug, PartialEq)]
pub struct DimensionArg {
    pub name: String,
    pub value: CoordinateValue,
}

/// Parse a requested coordinate from a command line argument
/// Format: dimension=value
pub fn parse_dimension(s: &str) -> Result<DimensionArg, String> {
    let (name, value) = s
        .split_once('=')
        .ok_or_else(|| "Dimension must be in format 'dimension=value'".to_string())?;

    let name = name.trim();
    if name.is_empty() {
        return Err("Dimension name must not be empty".to_string());
    }
    let value = value.parse::<CoordinateValue>()?;

    Ok(DimensionArg {
        name: name.to_string(),
        value,
    })
}

/// Parse requested coordinates from environment variables.
///
/// Environment variable format:
/// - NCBAND_DIMENSIONS: "pressure=500;time=2019-06-15T18:00"
/// - NCBAND_BANDS: "x_wind,y_wind"
pub fn parse_job_from_env() -> Result<(Vec<DimensionArg>, Vec<String>), String> {
    let mut dims = Vec::new();
    let mut bands = Vec::new();

    if let Ok(dims_env) = env::var("NCBAND_DIMENSIONS")
        && !dims_env.trim().is_empty() {
            for entry in dims_env.split(';') {
                let entry = entry.trim();
                if !entry.is_empty() {
                    dims.push(parse_dimension(entry).map_err(|e| {
                        format!("Invalid dimension in NCBAND_DIMENSIONS: {}", e)
                    })?);
                }
            }
        }

    if let Ok(bands_env) = env::var("NCBAND_BANDS") {
        bands.extend(
            bands_env
                .split(',')
                .map(str::trim)
                .filter(|tag| !tag.is_empty())
                .map(String::from),
        );
    }

    Ok((dims, bands))
}

/// Merge a job file with environment and command-line values.
///
/// Priority: CLI arguments > environment variables > job file. Dimensions
/// merge per name; a band list replaces the lower-priority one.
pub fn merge_job(
    base: Option<JobConfig>,
    subdataset: Option<String>,
    cli_dims: Vec<DimensionArg>,
    cli_bands: Vec<String>,
) -> Result<JobConfig, String> {
    let (env_dims, env_bands) = parse_job_from_env()?;
    let mut job = base.unwrap_or_default();

    if subdataset.is_some() {
        job.subdataset = subdataset;
    }

    let overrides: CoordinateSelection = env_dims
        .into_iter()
        .chain(cli_dims)
        .map(|arg| (arg.name, arg.value))
        .collect();
    job.dimensions.merge(&overrides);

    if !cli_bands.is_empty() {
        job.bands = cli_bands;
    } else if !env_bands.is_empty() {
        job.bands = env_bands;
    }

    Ok(job)
}

/// Job file template for `template_type`
pub fn generate_template(template_type: &TemplateType) -> Result<JobConfig, String> {
    let template = match template_type {
        TemplateType::Basic => JobConfig {
            subdataset: Some("NETCDF:\"input.nc\":temperature".to_string()),
            dimensions: CoordinateSelection::new(),
            bands: Vec::new(),
        },
        TemplateType::Pressure => JobConfig {
            subdataset: Some("NETCDF:\"era5.nc\":u".to_string()),
            dimensions: CoordinateSelection::new()
                .with("pressure", CoordinateValue::Numeric(500.0))
                .with("time", template_time()?),
            bands: vec!["x_wind".to_string(), "eastward_wind".to_string()],
        },
        TemplateType::Height => JobConfig {
            subdataset: Some("NETCDF:\"arome.nc\":x_wind_ml".to_string()),
            dimensions: CoordinateSelection::new()
                .with("height", CoordinateValue::Numeric(10.0))
                .with("time", template_time()?),
            bands: vec!["x_wind".to_string()],
        },
    };
    Ok(template)
}

fn template_time() -> Result<CoordinateValue, String> {
    "2019-06-15T18:00:00Z".parse()
}

/// Serialize a job template in the requested format
pub fn render_template(template: &JobConfig, format: &ConfigFormat) -> Result<String, String> {
    match format {
        ConfigFormat::Json => serde_json::to_string_pretty(template).map_err(|e| e.to_string()),
        ConfigFormat::Yaml => serde_yaml::to_string(template).map_err(|e| e.to_string()),
    }
}
