//! PPX profile commands

use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};
use clap::Subcommand;
use serde::Serialize;

use proxydeck_common::ppx::{Allocation, ProfileSummary, SkippedRecord};
use proxydeck_common::ProfileGenerator;

use super::Context;
use crate::output::{print_info, print_list, print_structured, print_success, print_warning, TableDisplay};

#[derive(Subcommand)]
pub enum PpxCommands {
    /// Show ids that would be allocated and what each section would contain
    Plan,

    /// Allocate missing ids and write the Proxifier profile
    Generate {
        /// Output file (defaults to ppx.output_path, then stdout)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
}

#[derive(Serialize)]
struct AllocationDisplay {
    instance_id: String,
    ppx_proxy_id: i64,
}

impl From<&Allocation> for AllocationDisplay {
    fn from(a: &Allocation) -> Self {
        Self {
            instance_id: a.instance_id.clone(),
            ppx_proxy_id: a.ppx_proxy_id,
        }
    }
}

impl TableDisplay for AllocationDisplay {
    fn headers() -> Vec<&'static str> {
        vec!["Instance", "PPX ID"]
    }

    fn row(&self) -> Vec<String> {
        vec![self.instance_id.clone(), self.ppx_proxy_id.to_string()]
    }
}

#[derive(Serialize)]
struct SkippedDisplay {
    instance: i64,
    instance_id: String,
    section: String,
    reason: String,
}

impl From<&SkippedRecord> for SkippedDisplay {
    fn from(s: &SkippedRecord) -> Self {
        Self {
            instance: s.instance_number,
            instance_id: s.instance_id.clone(),
            section: s.section.to_string(),
            reason: s.reason.to_string(),
        }
    }
}

impl TableDisplay for SkippedDisplay {
    fn headers() -> Vec<&'static str> {
        vec!["#", "Instance", "Section", "Reason"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.instance.to_string(),
            self.instance_id.clone(),
            self.section.clone(),
            self.reason.clone(),
        ]
    }
}

fn summary_line(summary: &ProfileSummary) -> String {
    format!(
        "{} instances: {} proxies, {} rules, {} section skips",
        summary.instances,
        summary.proxies,
        summary.rules,
        summary.skipped.len()
    )
}

/// `--out` wins over the configured path; `None` means stdout.
fn output_path(out: Option<PathBuf>, configured: Option<&Path>) -> Option<PathBuf> {
    out.or_else(|| configured.map(Path::to_path_buf))
}

/// Write the profile, creating missing parent directories.
fn write_profile(path: &Path, xml: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
    }
    std::fs::write(path, xml).with_context(|| format!("writing profile to {}", path.display()))
}

pub fn execute(cmd: PpxCommands, ctx: &Context) -> Result<()> {
    let generator =
        ProfileGenerator::new(ctx.repo()?).with_id_baseline(ctx.config.ppx.id_baseline);

    match cmd {
        PpxCommands::Plan => {
            let plan = generator.preview()?;
            if print_structured(&plan, ctx.format) {
                return Ok(());
            }

            print_info(&summary_line(&plan.summary));
            if plan.pending.is_empty() {
                print_info("No new ids to allocate");
            } else {
                let pending: Vec<AllocationDisplay> =
                    plan.pending.iter().map(AllocationDisplay::from).collect();
                print_list(&pending, ctx.format);
            }
            if !plan.summary.skipped.is_empty() {
                let skipped: Vec<SkippedDisplay> =
                    plan.summary.skipped.iter().map(SkippedDisplay::from).collect();
                print_list(&skipped, ctx.format);
            }
        }

        PpxCommands::Generate { out } => {
            let profile = generator.generate()?;

            match output_path(out, ctx.config.ppx.output_path.as_deref()) {
                Some(path) => {
                    write_profile(&path, &profile.xml)?;

                    if !profile.allocated.is_empty() {
                        print_warning(&format!(
                            "Allocated {} new ppx ids",
                            profile.allocated.len()
                        ));
                    }
                    print_success(&format!(
                        "Profile written to {} ({})",
                        path.display(),
                        summary_line(&profile.summary)
                    ));
                }
                None => print!("{}", profile.xml),
            }
        }
    }

    Ok(())
}
