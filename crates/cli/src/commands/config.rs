//! Config Commands

use anyhow::{bail, Result};
use clap::Subcommand;

use super::Context;
use crate::output::{print_structured, print_success};

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show the effective configuration
    Show,

    /// Write a default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

pub fn execute(cmd: ConfigCommands, ctx: &Context) -> Result<()> {
    match cmd {
        ConfigCommands::Show => {
            if !print_structured(&ctx.config, ctx.format) {
                println!("# {}", ctx.config_path.display());
                print!("{}", toml::to_string_pretty(&ctx.config)?);
            }
        }
        ConfigCommands::Init { force } => {
            if ctx.config_path.exists() && !force {
                bail!(
                    "{} already exists (use --force to overwrite)",
                    ctx.config_path.display()
                );
            }
            ctx.config.save(&ctx.config_path)?;
            print_success(&format!("Wrote {}", ctx.config_path.display()));
        }
    }
    Ok(())
}
