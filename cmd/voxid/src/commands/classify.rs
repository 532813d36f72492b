//! Full-session classification.

use std::path::PathBuf;

use anyhow::Context as _;
use clap::Args;
use serde::Serialize;
use voxid_stage::{Decision, Engine, StageScore};

use super::{get_config, load_recording, output};
use crate::Cli;

/// Classify a full session.
///
/// Takes one recording per prompt, in prompt order (see `voxid prompts`).
#[derive(Args)]
pub struct ClassifyCommand {
    /// WAV recordings, one per prompt
    #[arg(required = true)]
    wavs: Vec<PathBuf>,
}

#[derive(Serialize)]
struct Classification {
    stages: Vec<StageScore>,
    result: Decision,
}

impl ClassifyCommand {
    pub async fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        let cfg = get_config(cli)?;
        if self.wavs.len() != cfg.stages {
            anyhow::bail!(
                "expected {} recordings, one per prompt, got {}",
                cfg.stages,
                self.wavs.len()
            );
        }
        let engine = Engine::load(&cfg.store(), cfg.stages, cfg.feature_builder()?)?;

        let mut session = engine.start_session();
        let mut stages = Vec::with_capacity(self.wavs.len());
        for (i, wav) in self.wavs.iter().enumerate() {
            let position = i + 1;
            let waveform = load_recording(wav)?;
            let score = engine
                .submit_recording(&mut session, position, &waveform)
                .with_context(|| format!("prompt {position}: {}", wav.display()))?;
            stages.push(score);
        }
        let result = session.finalize()?;

        output(cli).write(&Classification { stages, result })
    }
}
