//! Config validation CLI tool
//!
//! Validates a lockind configuration file and reports any errors.

use lockin_util::default_config_path;
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
            eprintln!("Validates a lockind configuration file.");
            eprintln!();
            eprintln!("If no path is provided, uses: {}", default_path.display());
            return ExitCode::from(2);
        }
    };

    if !config_path.exists() {
        eprintln!("Error: Configuration file not found: {}", config_path.display());
        return ExitCode::from(1);
    }

    match lockin_config::load_config(&config_path) {
        Ok(config) => {
            println!("✓ Configuration is valid");
            println!();
            println!("Summary:");
            println!("  Config version: {}", lockin_config::CURRENT_CONFIG_VERSION);
            println!("  Socket: {}", config.service.socket_path.display());
            println!("  Data dir: {}", config.service.data_dir.display());
            println!("  Rules file: {}", config.service.rules_path.display());
            println!(
                "  Check interval: {}s",
                config.service.check_interval.as_secs()
            );
            println!(
                "  Max lockdown: {} minutes",
                config.lockdown.max_duration_minutes
            );
            println!(
                "  Built-in aliases: {}",
                if config.aliases.include_builtin { "yes" } else { "no" }
            );

            if !config.lockdown.default_allowlist.is_empty() {
                println!();
                println!("Default allow-list:");
                for domain in &config.lockdown.default_allowlist {
                    println!("  - {}", domain);
                }
            }

            if !config.aliases.groups.is_empty() {
                println!();
                println!("Alias groups:");
                for group in &config.aliases.groups {
                    let names: Vec<&str> = group.iter().map(|d| d.as_str()).collect();
                    println!("  - {}", names.join(", "));
                }
            }

            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("✗ Configuration validation failed");
            eprintln!();
            match &e {
                lockin_config::ConfigError::ReadError(io_err) => {
                    eprintln!("Failed to read file: {}", io_err);
                }
                lockin_config::ConfigError::ParseError(parse_err) => {
                    eprintln!("TOML parse error:");
                    eprintln!("  {}", parse_err);
                }
                lockin_config::ConfigError::ValidationFailed { errors } => {
                    eprintln!("Validation errors ({}):", errors.len());
                    for err in errors {
                        eprintln!("  - {}", err);
                    }
                }
                lockin_config::ConfigError::UnsupportedVersion(ver) => {
                    eprintln!(
                        "Unsupported config version: {} (expected {})",
                        ver,
                        lockin_config::CURRENT_CONFIG_VERSION
                    );
                }
            }
            ExitCode::from(1)
        }
    }
}
