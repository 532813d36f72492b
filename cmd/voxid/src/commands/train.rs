//! Model training.

use std::path::Path;

use clap::Args;
use tokio::task::JoinSet;
use voxid_stage::{ArtifactStore, Dataset, StageReport, TrainedStage, Trainer};

use super::{get_config, output, print_info, print_success};
use crate::Cli;

/// Train every prompt's model.
///
/// Positions whose dataset table is missing are skipped. Positions train
/// concurrently; each writes its artifacts to the model directory.
#[derive(Args)]
pub struct TrainCommand {
    /// Only train these positions (default: all)
    #[arg(long, value_delimiter = ',')]
    positions: Vec<usize>,
}

impl TrainCommand {
    pub async fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        let cfg = get_config(cli)?;
        let trainer = Trainer::new(cfg.train_config())?;
        let store = cfg.store();
        let dataset_dir = cfg.dataset_dir();

        let requested: Vec<usize> = if self.positions.is_empty() {
            (1..=cfg.stages).collect()
        } else {
            self.positions.clone()
        };

        let reports =
            train_positions(&trainer, &store, &dataset_dir, &requested, cfg.stages).await?;

        print_success(&format!(
            "Trained {} position(s) into {}",
            reports.len(),
            store.root().display()
        ));
        output(cli).write(&reports)
    }
}

/// Fits every requested position, then saves them all.
///
/// Nothing is written unless every position trains.
async fn train_positions(
    trainer: &Trainer,
    store: &dyn ArtifactStore,
    dataset_dir: &Path,
    requested: &[usize],
    stages: usize,
) -> anyhow::Result<Vec<StageReport>> {
    if let Some(bad) = requested.iter().find(|&&p| p == 0 || p > stages) {
        anyhow::bail!("position {bad} outside 1..={stages}");
    }

    let mut tasks = JoinSet::new();
    for &position in requested {
        let path = dataset_dir.join(Dataset::file_name(position));
        if !path.exists() {
            print_info(&format!("No dataset for position {position}, skipping"));
            continue;
        }
        let trainer = trainer.clone();
        tasks.spawn_blocking(move || -> anyhow::Result<TrainedStage> {
            let dataset = Dataset::load(&path)?;
            if dataset.position != position {
                anyhow::bail!(
                    "{} holds position {}, expected {position}",
                    path.display(),
                    dataset.position
                );
            }
            Ok(trainer.fit(&dataset)?)
        });
    }

    let mut trained = Vec::new();
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(Ok(stage)) => trained.push(stage),
            Ok(Err(e)) => {
                tasks.abort_all();
                return Err(e);
            }
            Err(e) => {
                tasks.abort_all();
                return Err(e.into());
            }
        }
    }
    if trained.is_empty() {
        anyhow::bail!("no datasets found in {}", dataset_dir.display());
    }
    trained.sort_by_key(|t| t.report.position);

    let mut reports = Vec::with_capacity(trained.len());
    for stage in trained {
        store.save(stage.report.position, &stage.model)?;
        reports.push(stage.report);
    }
    Ok(reports)
}

#[cfg(test)]
mod tests {
    use super::*;
    use voxid_features::{FeatureSchema, FeatureVector};
    use voxid_stage::{Label, LabeledSample, MemoryStore, TrainConfig};

    fn write_dataset(dir: &Path, position: usize, per_class: usize) {
        let columns = FeatureSchema::new((0..4).map(|i| format!("f{i}")).collect());
        let mut ds = Dataset::new(position, columns);
        for i in 0..2 * per_class {
            let label = if i % 2 == 0 { Label::Male } else { Label::Female };
            let center = if label == Label::Male { 2.0 } else { -2.0 };
            let jitter = ((i * 7) % 5) as f64 * 0.1;
            ds.push(LabeledSample {
                source: format!("s{i}"),
                label,
                features: FeatureVector::new(vec![
                    center + jitter,
                    0.5 * center - jitter,
                    jitter,
                    ((i * 3) % 4) as f64,
                ]),
            })
            .unwrap();
        }
        ds.save(&dir.join(Dataset::file_name(position))).unwrap();
    }

    fn trainer() -> Trainer {
        Trainer::new(TrainConfig::default()).unwrap()
    }

    #[tokio::test]
    async fn test_trains_and_saves_requested_positions() {
        let dir = tempfile::tempdir().unwrap();
        write_dataset(dir.path(), 1, 10);
        write_dataset(dir.path(), 3, 10);
        let store = MemoryStore::new();

        let reports = train_positions(&trainer(), &store, dir.path(), &[3, 1, 2], 6)
            .await
            .unwrap();
        let positions: Vec<usize> = reports.iter().map(|r| r.position).collect();
        assert_eq!(positions, vec![1, 3]);
        assert!(store.load(1).is_ok());
        assert!(store.load(2).is_err());
        assert!(store.load(3).is_ok());
    }

    #[tokio::test]
    async fn test_invalid_position_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        write_dataset(dir.path(), 1, 10);
        let store = MemoryStore::new();

        let err = train_positions(&trainer(), &store, dir.path(), &[1, 9], 6)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("position 9"));
        assert!(store.load(1).is_err());
    }

    #[tokio::test]
    async fn test_failed_position_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        write_dataset(dir.path(), 1, 10);
        // Too few samples per class for five folds.
        write_dataset(dir.path(), 2, 1);
        let store = MemoryStore::new();

        assert!(train_positions(&trainer(), &store, dir.path(), &[1, 2], 6).await.is_err());
        assert!(store.load(1).is_err());
    }

    #[tokio::test]
    async fn test_no_datasets_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = MemoryStore::new();
        assert!(train_positions(&trainer(), &store, dir.path(), &[], 6).await.is_err());
    }
}
