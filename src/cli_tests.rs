//! # CLI Integration Tests
//!
//! Argument parsing tests for the command-line interface, including
//! subcommands, global flags and malformed input.

#[cfg(test)]
mod tests {
    use clap::Parser;
    use std::path::PathBuf;

    use crate::cli::{Cli, Commands, ConfigFormat, OutputFormat, TemplateType};
    use crate::coords::CoordinateValue;

    const SUBDATASET: &str = "NETCDF:\"data.nc\":var4d";

    /// Test basic CLI argument parsing
    #[test]
    fn test_cli_help() {
        let result = Cli::try_parse_from(["ncband", "--help"]);
        assert!(result.is_err()); // --help causes early exit with "error"

        let error = result.unwrap_err();
        let help = error.to_string();
        assert!(help.contains("resolve"));
        assert!(help.contains("completions"));
    }

    #[test]
    fn test_cli_version() {
        let result = Cli::try_parse_from(["ncband", "--version"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_global_flags() {
        let cli = Cli::parse_from([
            "ncband",
            "--verbose",
            "--output-format", "json",
            "--config", "/path/to/job.yaml",
            "template", "basic",
        ]);

        assert!(cli.verbose);
        assert_eq!(cli.output_format, OutputFormat::Json);
        assert_eq!(cli.config, Some(PathBuf::from("/path/to/job.yaml")));
    }

    #[test]
    fn test_resolve_command_basic() {
        let cli = Cli::parse_from(["ncband", "resolve", SUBDATASET]);

        if let Commands::Resolve { subdataset, dims, bands } = &cli.command {
            assert_eq!(subdataset.as_deref(), Some(SUBDATASET));
            assert!(dims.is_empty());
            assert!(bands.is_empty());
        } else {
            panic!("Expected Resolve command");
        }
    }

    #[test]
    fn test_resolve_command_with_dimensions() {
        let cli = Cli::parse_from([
            "ncband", "resolve", SUBDATASET,
            "--dim", "pressure=500",
            "-d", "time=2019-06-15T18:00",
            "--band", "x_wind",
            "-b", "eastward_wind",
        ]);

        if let Commands::Resolve { dims, bands, .. } = &cli.command {
            assert_eq!(dims.len(), 2);
            assert_eq!(dims[0].name, "pressure");
            assert_eq!(dims[0].value, CoordinateValue::Numeric(500.0));
            assert_eq!(dims[1].name, "time");
            assert!(matches!(dims[1].value, CoordinateValue::Instant(_)));
            assert_eq!(bands, &vec!["x_wind".to_string(), "eastward_wind".to_string()]);
        } else {
            panic!("Expected Resolve command");
        }
    }

    /// Test invalid dimension formats
    #[test]
    fn test_invalid_dimension() {
        // Missing '='
        let result = Cli::try_parse_from(["ncband", "resolve", SUBDATASET, "--dim", "pressure"]);
        assert!(result.is_err());

        // Neither a number nor a time
        let result = Cli::try_parse_from(["ncband", "resolve", SUBDATASET, "--dim", "pressure=high"]);
        assert!(result.is_err());

        // Empty name
        let result = Cli::try_parse_from(["ncband", "scan", "data.nc", "--dim", "=500"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_bands_command() {
        let cli = Cli::parse_from(["ncband", "bands", SUBDATASET, "--band", "x_wind"]);

        if let Commands::Bands { subdataset, bands } = &cli.command {
            assert_eq!(subdataset.as_deref(), Some(SUBDATASET));
            assert_eq!(bands, &vec!["x_wind".to_string()]);
        } else {
            panic!("Expected Bands command");
        }
    }

    #[test]
    fn test_scan_command() {
        let cli = Cli::parse_from(["ncband", "scan", "data.nc", "-d", "height=30"]);

        if let Commands::Scan { file, dims, bands } = &cli.command {
            assert_eq!(file, &PathBuf::from("data.nc"));
            assert_eq!(dims[0].value, CoordinateValue::Numeric(30.0));
            assert!(bands.is_empty());
        } else {
            panic!("Expected Scan command");
        }

        // the file is required
        assert!(Cli::try_parse_from(["ncband", "scan"]).is_err());
    }

    #[test]
    fn test_info_command() {
        let cli = Cli::parse_from(["ncband", "info", "data.nc", "-n", "buggy_var", "--format", "yaml"]);

        if let Commands::Info { file, variable, format } = &cli.command {
            assert_eq!(file, "data.nc");
            assert_eq!(variable.as_deref(), Some("buggy_var"));
            assert_eq!(format, &Some(OutputFormat::Yaml));
        } else {
            panic!("Expected Info command");
        }
    }

    #[test]
    fn test_output_format_values() {
        let formats = ["human", "json", "yaml"];

        for format in &formats {
            let cli = Cli::parse_from(["ncband", "--output-format", format, "template", "basic"]);

            match *format {
                "human" => assert_eq!(cli.output_format, OutputFormat::Human),
                "json" => assert_eq!(cli.output_format, OutputFormat::Json),
                "yaml" => assert_eq!(cli.output_format, OutputFormat::Yaml),
                _ => unreachable!(),
            }
        }

        assert!(Cli::try_parse_from(["ncband", "--output-format", "csv", "template", "basic"]).is_err());
    }

    #[test]
    fn test_template_types() {
        let templates = ["basic", "pressure", "height"];

        for template in &templates {
            let cli = Cli::parse_from(["ncband", "template", template, "--format", "yaml"]);

            if let Commands::Template { template_type, format, output } = &cli.command {
                match *template {
                    "basic" => assert_eq!(template_type, &TemplateType::Basic),
                    "pressure" => assert_eq!(template_type, &TemplateType::Pressure),
                    "height" => assert_eq!(template_type, &TemplateType::Height),
                    _ => unreachable!(),
                }
                assert_eq!(format, &ConfigFormat::Yaml);
                assert!(output.is_none());
            } else {
                panic!("Expected Template command");
            }
        }
    }

    #[test]
    fn test_completions_command() {
        let cli = Cli::parse_from(["ncband", "completions", "bash", "-o", "ncband.bash"]);

        if let Commands::Completions { shell, output } = &cli.command {
            assert_eq!(shell, &clap_complete::Shell::Bash);
            assert_eq!(output, &Some(PathBuf::from("ncband.bash")));
        } else {
            panic!("Expected Completions command");
        }
    }

    #[test]
    fn test_verbose_quiet_conflict() {
        let result = Cli::try_parse_from(["ncband", "--verbose", "--quiet", "info", "test.nc"]);
        assert!(result.is_err());

        let cli_verbose = Cli::parse_from(["ncband", "--verbose", "info", "test.nc"]);
        assert!(cli_verbose.verbose);
        assert!(!cli_verbose.quiet);

        let cli_quiet = Cli::parse_from(["ncband", "-q", "info", "test.nc"]);
        assert!(!cli_quiet.verbose);
        assert!(cli_quiet.quiet);
    }

    #[test]
    fn test_missing_subcommand() {
        assert!(Cli::try_parse_from(["ncband"]).is_err());
    }
}
