//! Prompt listing.

use clap::Args;
use serde::Serialize;
use voxid_stage::prompt;

use super::{get_config, output};
use crate::Cli;

/// List the prompts in stage order.
#[derive(Args)]
pub struct PromptsCommand;

#[derive(Serialize)]
struct PromptEntry {
    position: usize,
    prompt: &'static str,
}

impl PromptsCommand {
    pub async fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        let cfg = get_config(cli)?;
        let entries: Vec<PromptEntry> = (1..=cfg.stages)
            .map(|position| PromptEntry {
                position,
                prompt: prompt(position).unwrap_or("(no prompt text)"),
            })
            .collect();
        output(cli).write(&entries)
    }
}
