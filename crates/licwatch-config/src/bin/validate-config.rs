//! Config validation CLI tool
//!
//! Validates a licwatch configuration file and reports any errors.

use licwatch_config::{Licensing, OracleSettings};
use licwatch_util::{default_config_path, format_duration};
use std::path::PathBuf;
use std::process::ExitCode;

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();

    let config_path = match args.get(1) {
        Some(path) => PathBuf::from(path),
        None => {
            let default_path = default_config_path();
            eprintln!("Usage: validate-config [config-file]");
            eprintln!();
            eprintln!("Validates a licwatch configuration file.");
            eprintln!();
            eprintln!("If no path is provided, uses: {}", default_path.display());
            return ExitCode::from(2);
        }
    };

    if !config_path.exists() {
        eprintln!("Error: Configuration file not found: {}", config_path.display());
        return ExitCode::from(1);
    }

    match licwatch_config::load_config(&config_path) {
        Ok(settings) => {
            println!("✓ Configuration is valid");
            println!();
            println!("Summary:");
            println!("  Config version: {}", licwatch_config::CURRENT_CONFIG_VERSION);
            println!(
                "  Checks: after {}, after {}, then every {}",
                format_duration(settings.schedule.first_delay),
                format_duration(settings.schedule.second_delay),
                format_duration(settings.schedule.period)
            );
            match &settings.oracle {
                OracleSettings::Static { result } => println!("  Oracle: static ({})", result),
                OracleSettings::Http { url, timeout } => {
                    println!("  Oracle: http ({}, timeout {})", url, format_duration(*timeout))
                }
            }

            println!();
            println!("Variants:");
            for variant in &settings.variants {
                let licensing = match variant.licensing() {
                    Licensing::Required(code) => format!("license {}", code),
                    Licensing::Free => "free".to_string(),
                };
                println!("  - {} [{}]: {}", variant.id(), licensing, variant.plugin_id());
            }

            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("✗ Configuration validation failed");
            eprintln!();
            match &e {
                licwatch_config::ConfigError::ReadError(io_err) => {
                    eprintln!("Failed to read file: {}", io_err);
                }
                licwatch_config::ConfigError::ParseError(parse_err) => {
                    eprintln!("TOML parse error:");
                    eprintln!("  {}", parse_err);
                }
                licwatch_config::ConfigError::ValidationFailed { errors } => {
                    eprintln!("Validation errors ({}):", errors.len());
                    for err in errors {
                        eprintln!("  - {}", err);
                    }
                }
                licwatch_config::ConfigError::UnsupportedVersion(ver) => {
                    eprintln!(
                        "Unsupported config version: {} (expected {})",
                        ver,
                        licwatch_config::CURRENT_CONFIG_VERSION
                    );
                }
            }
            ExitCode::from(1)
        }
    }
}
