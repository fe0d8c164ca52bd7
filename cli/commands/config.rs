use crate::cli_args::ConfigArgs;
use crate::output::{self, file_link, write_to_stdout};
use anyhow::{Context, Result, bail};
use colored::*;
use log;
use std::path::{Path, PathBuf};
use dirdigest_core::Config;
use dirdigest_core::config::DEFAULT_CONFIG_FILENAME;

pub fn handle_config_command(args: &ConfigArgs, quiet: bool) -> Result<()> {
    let content = default_config_toml()?;

    if !args.save {
        return write_to_stdout(&content);
    }

    let root = args.root.clone().unwrap_or_else(|| PathBuf::from("."));
    let path = save_default_config(&root, &content)?;
    if !quiet {
        println!(
            "{} Default configuration saved to: {}",
            "✅".green(),
            file_link(&path).blue()
        );
    }
    Ok(())
}

fn default_config_toml() -> Result<String> {
    toml::to_string_pretty(&Config::default()).context("Failed to serialize default configuration")
}

fn save_default_config(root: &Path, content: &str) -> Result<PathBuf> {
    let path = root.join(DEFAULT_CONFIG_FILENAME);
    if path.exists() {
        bail!(
            "Configuration file already exists at {}; remove it first to regenerate",
            path.display()
        );
    }
    log::debug!("Writing default configuration to {}", path.display());
    output::write_to_file(&path, content)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use dirdigest_core::PartialConfig;

    #[test]
    fn default_config_round_trips_through_the_file_tier() {
        let content = default_config_toml().unwrap();
        let layer: PartialConfig = toml::from_str(&content).unwrap();
        assert_eq!(Config::resolve(Some(&layer), &PartialConfig::default()), Config::default());
    }

    #[test]
    fn save_refuses_to_overwrite() {
        let dir = tempfile::TempDir::new().unwrap();
        let content = default_config_toml().unwrap();
        let path = save_default_config(dir.path(), &content).unwrap();
        assert!(path.is_file());
        assert!(save_default_config(dir.path(), &content).is_err());
    }
}
