//! Configuration commands.

use clap::{Args, Subcommand};
use voxid_cli::{save_config, Config};

use super::{get_config, output, print_success};
use crate::Cli;

/// Manage configuration.
///
/// Configuration is stored in ~/.voxid/config.yaml
#[derive(Args)]
pub struct ConfigCommand {
    #[command(subcommand)]
    command: ConfigSubcommand,
}

#[derive(Subcommand)]
enum ConfigSubcommand {
    /// Print the effective configuration
    Show,
    /// Print the path of the configuration file
    Path,
    /// Set one value, e.g. `voxid config set validation.folds 10`
    Set {
        /// Dotted key
        key: String,
        /// New value, parsed as YAML
        value: String,
    },
    /// Write a configuration file with default values
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

impl ConfigCommand {
    pub async fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        match &self.command {
            ConfigSubcommand::Show => {
                let cfg = get_config(cli)?;
                output(cli).write(&cfg)
            }

            ConfigSubcommand::Path => {
                let cfg = get_config(cli)?;
                println!("{}", cfg.path().display());
                Ok(())
            }

            ConfigSubcommand::Set { key, value } => {
                let mut cfg = get_config(cli)?;
                cfg.set(key, value)?;
                cfg.save()?;
                print_success(&format!("Set {key} in {}", cfg.path().display()));
                Ok(())
            }

            ConfigSubcommand::Init { force } => {
                let target = match cli.config.as_deref() {
                    Some(p) => std::path::PathBuf::from(p),
                    None => Config::default_config_path()
                        .ok_or_else(|| anyhow::anyhow!("cannot determine config path"))?,
                };
                if target.exists() && !force {
                    anyhow::bail!(
                        "config {} already exists (use --force to overwrite)",
                        target.display()
                    );
                }
                let path = save_config(&Config::default(), target.to_str())?;
                print_success(&format!("Config written to {}", path.display()));
                Ok(())
            }
        }
    }
}
