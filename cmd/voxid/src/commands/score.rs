//! Single-stage scoring.

use std::path::PathBuf;

use anyhow::Context as _;
use clap::Args;
use voxid_stage::{ArtifactStore, Engine, StageSet};

use super::{get_config, load_recording, output};
use crate::Cli;

/// Score one recording against one prompt's model.
#[derive(Args)]
pub struct ScoreCommand {
    /// Prompt position (1-based)
    position: usize,

    /// WAV recording
    wav: PathBuf,
}

impl ScoreCommand {
    pub async fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        let cfg = get_config(cli)?;
        if self.position == 0 || self.position > cfg.stages {
            anyhow::bail!("position {} outside 1..={}", self.position, cfg.stages);
        }
        let model = cfg.store().load(self.position)?;

        // Single-stage engine, so the model schema is still checked.
        let engine = Engine::new(StageSet::new(vec![model]), cfg.feature_builder()?)
            .with_context(|| format!("position {}", self.position))?;

        let waveform = load_recording(&self.wav)?;
        let mut score = engine.score(1, &waveform)?;
        score.position = self.position;
        output(cli).write(&score)
    }
}
