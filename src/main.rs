use anyhow::{Context, Result, anyhow};
use clap::{CommandFactory, Parser};
use ncband::cli::{Cli, Commands, DimensionArg, OutputFormat, generate_template, merge_job, render_template};
use ncband::info::{get_file_layout, print_layout_human, print_layout_json, print_layout_yaml};
use ncband::input::JobConfig;
use ncband::log::{
    config_echo, init_logging, show_band_table, show_farewell_with_timing, show_greeting, show_record,
};
use ncband::record::{BandDict, BandRecord};
use ncband::{get_band_from_subdataset, list_bands, scan_file};
use std::fs;
use std::io;
use std::path::Path;
use std::time::Instant;

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);
    run(cli)
}

fn run(cli: Cli) -> Result<()> {
    let start_time = Instant::now();
    let human = cli.output_format == OutputFormat::Human && !cli.quiet;
    let base = cli.config.as_deref().map(load_job).transpose()?;

    match cli.command {
        Commands::Resolve {
            subdataset,
            dims,
            bands,
        } => {
            let job = merge(base, subdataset, dims, bands)?;
            let subdataset = require_subdataset(&job)?;
            if human {
                show_greeting(subdataset);
                config_echo(&job);
            }
            let record = get_band_from_subdataset(subdataset, &job.dimensions, &job.filter())
                .with_context(|| format!("Failed to resolve a band of {}", subdataset))?;
            if human {
                show_record(&record);
            } else if !cli.quiet {
                print_structured(&record.to_dict(), cli.output_format)?;
            }
        }
        Commands::Bands { subdataset, bands } => {
            let job = merge(base, subdataset, Vec::new(), bands)?;
            let subdataset = require_subdataset(&job)?;
            if human {
                show_greeting(subdataset);
            }
            let records = list_bands(subdataset, &job.filter())
                .with_context(|| format!("Failed to list the bands of {}", subdataset))?;
            report_records(&records, human, cli.quiet, cli.output_format)?;
        }
        Commands::Scan { file, dims, bands } => {
            let job = merge(base, None, dims, bands)?;
            if human {
                show_greeting(&file.to_string_lossy());
                config_echo(&job);
            }
            let records = scan_file(&file, &job.dimensions, &job.filter())
                .with_context(|| format!("Failed to scan {}", file.display()))?;
            report_records(&records, human, cli.quiet, cli.output_format)?;
        }
        Commands::Info {
            file,
            variable,
            format,
        } => {
            let info = get_file_layout(&file, variable.as_deref())?;
            match format.unwrap_or(cli.output_format) {
                OutputFormat::Human => print_layout_human(&info),
                OutputFormat::Json => print_layout_json(&info)?,
                OutputFormat::Yaml => print_layout_yaml(&info)?,
            }
            return Ok(());
        }
        Commands::Template {
            template_type,
            output,
            format,
        } => {
            let template = generate_template(&template_type)
                .map_err(|e| anyhow!("Failed to build template: {}", e))?;
            let rendered =
                render_template(&template, &format).map_err(|e| anyhow!("Failed to render template: {}", e))?;
            match output {
                Some(path) => {
                    fs::write(&path, rendered)
                        .with_context(|| format!("Failed to write template to {}", path.display()))?;
                    if !cli.quiet {
                        println!("Template written to {}", path.display());
                    }
                }
                None => println!("{}", rendered),
            }
            return Ok(());
        }
        Commands::Completions { shell, output } => {
            let mut command = Cli::command();
            match output {
                Some(path) => {
                    let mut file = fs::File::create(&path)
                        .with_context(|| format!("Failed to create {}", path.display()))?;
                    clap_complete::generate(shell, &mut command, "ncband", &mut file);
                }
                None => clap_complete::generate(shell, &mut command, "ncband", &mut io::stdout()),
            }
            return Ok(());
        }
    }

    if human {
        show_farewell_with_timing(start_time.elapsed());
    }
    Ok(())
}

fn load_job(path: &Path) -> Result<JobConfig> {
    JobConfig::from_file(path).map_err(|e| anyhow!("Failed to load job file {}: {}", path.display(), e))
}

fn merge(
    base: Option<JobConfig>,
    subdataset: Option<String>,
    dims: Vec<DimensionArg>,
    bands: Vec<String>,
) -> Result<JobConfig> {
    merge_job(base, subdataset, dims, bands).map_err(|e| anyhow!(e))
}

fn require_subdataset(job: &JobConfig) -> Result<&str> {
    job.subdataset
        .as_deref()
        .ok_or_else(|| anyhow!("No subdataset given: pass one as an argument or set it in the job file"))
}

fn report_records(records: &[BandRecord], human: bool, quiet: bool, format: OutputFormat) -> Result<()> {
    if human {
        show_band_table(records);
    } else if !quiet {
        let dicts: Vec<BandDict> = records.iter().map(BandRecord::to_dict).collect();
        print_structured(&dicts, format)?;
    }
    Ok(())
}

fn print_structured<T: serde::Serialize>(value: &T, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Yaml => println!("{}", serde_yaml::to_string(value)?),
        _ => println!("{}", serde_json::to_string_pretty(value)?),
    }
    Ok(())
}
