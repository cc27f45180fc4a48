//! Config subcommand handlers.

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config::{self, Config};
use crate::error::CliError;
use crate::output;

/// Serialize config to TOML and write to the canonical config path.
fn save_config(cfg: &Config) -> Result<(), CliError> {
    let path = config::config_path().ok_or_else(|| CliError::Validation {
        field: "config".into(),
        reason: "cannot determine config directory".into(),
    })?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg).map_err(|e| CliError::Validation {
        field: "config".into(),
        reason: format!("failed to serialize config: {e}"),
    })?;
    std::fs::write(&path, toml_str)?;
    Ok(())
}

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Show => {
            let cfg = config::load_config()?;
            let out = output::render_single(
                &global.output,
                &cfg,
                |c| toml::to_string_pretty(c).unwrap_or_else(|e| format!("# error: {e}")),
                |c| c.backend.clone().unwrap_or_default(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ConfigCommand::Path => {
            let path = config::config_path().ok_or_else(|| CliError::Validation {
                field: "config".into(),
                reason: "cannot determine config directory".into(),
            })?;
            output::print_output(&path.display().to_string(), global.quiet);
            Ok(())
        }

        ConfigCommand::Set { key, value } => {
            let mut cfg = config::load_config()?;
            match key.as_str() {
                "backend" => {
                    let _: url::Url = value.parse().map_err(|_| CliError::Validation {
                        field: "backend".into(),
                        reason: format!("invalid URL: {value}"),
                    })?;
                    cfg.backend = Some(value);
                }
                "insecure" => {
                    cfg.insecure = value.parse().map_err(|_| CliError::Validation {
                        field: "insecure".into(),
                        reason: format!("expected true or false, got: {value}"),
                    })?;
                }
                "timeout" => {
                    cfg.timeout = Some(value.parse().map_err(|_| CliError::Validation {
                        field: "timeout".into(),
                        reason: format!("expected seconds, got: {value}"),
                    })?);
                }
                other => {
                    return Err(CliError::Validation {
                        field: "key".into(),
                        reason: format!(
                            "unknown key '{other}' (valid: backend, insecure, timeout)"
                        ),
                    });
                }
            }
            save_config(&cfg)?;
            if !global.quiet {
                eprintln!("Set {key}");
            }
            Ok(())
        }
    }
}
