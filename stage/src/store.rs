use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::{LogisticClassifier, Projector, StageError, StageModel, Standardizer};

/// Named storage for per-position stage models.
///
/// Positions are 1-based. Saving overwrites any prior model of the same
/// position. All implementations must be safe for concurrent use.
pub trait ArtifactStore: Send + Sync {
    fn save(&self, position: usize, model: &StageModel) -> Result<(), StageError>;

    /// Loads one position. Any failure is reported as
    /// [`StageError::ArtifactLoad`].
    fn load(&self, position: usize) -> Result<StageModel, StageError>;

    /// Where a position's model lives, for error reporting.
    fn location(&self, position: usize) -> PathBuf;
}

/// Directory store with three JSON files per position:
/// `scaler_<i>.json`, `pca_<i>.json`, `classifier_<i>.json`.
#[derive(Debug, Clone)]
pub struct DirStore {
    root: PathBuf,
}

impl DirStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn scaler_path(&self, position: usize) -> PathBuf {
        self.root.join(format!("scaler_{position}.json"))
    }

    pub fn pca_path(&self, position: usize) -> PathBuf {
        self.root.join(format!("pca_{position}.json"))
    }

    pub fn classifier_path(&self, position: usize) -> PathBuf {
        self.root.join(format!("classifier_{position}.json"))
    }
}

impl ArtifactStore for DirStore {
    fn save(&self, position: usize, model: &StageModel) -> Result<(), StageError> {
        std::fs::create_dir_all(&self.root)?;
        write_json(&self.scaler_path(position), model.standardizer())?;
        write_json(&self.pca_path(position), model.projector())?;
        write_json(&self.classifier_path(position), model.classifier())?;
        tracing::info!(
            position,
            dir = %self.root.display(),
            rank = model.rank(),
            "stage: artifacts saved"
        );
        Ok(())
    }

    fn load(&self, position: usize) -> Result<StageModel, StageError> {
        let scaler: Standardizer = read_json(position, &self.scaler_path(position))?;
        let pca: Projector = read_json(position, &self.pca_path(position))?;
        let classifier_path = self.classifier_path(position);
        let classifier: LogisticClassifier = read_json(position, &classifier_path)?;

        let model = StageModel::from_parts(scaler, pca, classifier).map_err(|e| {
            StageError::ArtifactLoad {
                position,
                path: self.root.clone(),
                reason: e.to_string(),
            }
        })?;
        tracing::info!(
            position,
            dir = %self.root.display(),
            columns = model.schema().len(),
            rank = model.rank(),
            "stage: artifacts loaded"
        );
        Ok(model)
    }

    /// The scaler file, which carries the column schema.
    fn location(&self, position: usize) -> PathBuf {
        self.scaler_path(position)
    }
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), StageError> {
    let mut w = BufWriter::new(File::create(path)?);
    serde_json::to_writer(&mut w, value)?;
    w.flush()?;
    Ok(())
}

fn read_json<T: DeserializeOwned>(position: usize, path: &Path) -> Result<T, StageError> {
    let load_err = |reason: String| StageError::ArtifactLoad {
        position,
        path: path.to_path_buf(),
        reason,
    };
    let file = File::open(path).map_err(|e| load_err(e.to_string()))?;
    serde_json::from_reader(BufReader::new(file)).map_err(|e| load_err(e.to_string()))
}

/// In-memory store, for tests and embedding.
#[derive(Debug, Default)]
pub struct MemoryStore {
    models: RwLock<HashMap<usize, StageModel>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ArtifactStore for MemoryStore {
    fn save(&self, position: usize, model: &StageModel) -> Result<(), StageError> {
        let mut models = self.models.write().unwrap_or_else(|e| e.into_inner());
        models.insert(position, model.clone());
        Ok(())
    }

    fn load(&self, position: usize) -> Result<StageModel, StageError> {
        let models = self.models.read().unwrap_or_else(|e| e.into_inner());
        models
            .get(&position)
            .cloned()
            .ok_or_else(|| StageError::ArtifactLoad {
                position,
                path: self.location(position),
                reason: "no model stored".into(),
            })
    }

    fn location(&self, position: usize) -> PathBuf {
        PathBuf::from(format!("memory:{position}"))
    }
}
