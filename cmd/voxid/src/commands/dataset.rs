//! Dataset building from a labeled audio corpus.

use std::path::PathBuf;

use clap::Args;
use tokio::task::JoinSet;
use voxid_stage::{BuildStats, Dataset, DatasetBuilder};

use super::{get_config, output, print_success};
use crate::Cli;

/// Build per-prompt datasets.
///
/// Reads `<CORPUS_ROOT>/<group>/audio_<i>/*.wav` for every configured corpus
/// group and every prompt position, and writes `stage_<i>.json` tables to
/// the configured dataset directory.
#[derive(Args)]
pub struct DatasetCommand {
    /// Root directory of the labeled corpus
    corpus_root: PathBuf,

    /// Shuffle seed (default: the validation seed)
    #[arg(long)]
    seed: Option<u64>,
}

impl DatasetCommand {
    pub async fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        let cfg = get_config(cli)?;
        if !self.corpus_root.is_dir() {
            anyhow::bail!("corpus root {} is not a directory", self.corpus_root.display());
        }
        let builder = DatasetBuilder::new(
            cfg.feature_builder()?,
            cfg.corpus.clone(),
            self.seed.unwrap_or(cfg.validation.seed),
        );
        let out_dir = cfg.dataset_dir();

        let mut tasks = JoinSet::new();
        for position in 1..=cfg.stages {
            let builder = builder.clone();
            let root = self.corpus_root.clone();
            let path = out_dir.join(Dataset::file_name(position));
            tasks.spawn_blocking(move || -> anyhow::Result<BuildStats> {
                let (ds, stats) = builder.build(&root, position)?;
                ds.save(&path)?;
                Ok(stats)
            });
        }

        let mut stats = Vec::with_capacity(cfg.stages);
        while let Some(joined) = tasks.join_next().await {
            stats.push(joined??);
        }
        stats.sort_by_key(|s| s.position);

        print_success(&format!("Datasets written to {}", out_dir.display()));
        output(cli).write(&stats)
    }
}
