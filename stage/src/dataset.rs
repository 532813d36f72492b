use std::fmt;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use voxid_features::{FeatureSchema, FeatureVector, FeatureVectorBuilder};

use crate::StageError;

/// Domain label of a training sample.
///
/// Mapped to classifier classes as `Male` = 1, `Female` = 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Label {
    Male,
    Female,
}

impl Label {
    pub fn class(self) -> u8 {
        match self {
            Self::Male => 1,
            Self::Female => 0,
        }
    }

    pub fn from_class(class: u8) -> Option<Self> {
        match class {
            1 => Some(Self::Male),
            0 => Some(Self::Female),
            _ => None,
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Male => f.write_str("male"),
            Self::Female => f.write_str("female"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabeledSample {
    /// Where the row came from, usually the audio file path.
    pub source: String,
    pub label: Label,
    pub features: FeatureVector,
}

/// Labeled feature table of one prompt position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub position: usize,
    pub columns: FeatureSchema,
    pub samples: Vec<LabeledSample>,
}

impl Dataset {
    pub fn new(position: usize, columns: FeatureSchema) -> Self {
        Self {
            position,
            columns,
            samples: Vec::new(),
        }
    }

    /// File name of a position's table, `stage_<i>.json`.
    pub fn file_name(position: usize) -> String {
        format!("stage_{position}.json")
    }

    pub fn push(&mut self, sample: LabeledSample) -> Result<(), StageError> {
        if sample.features.len() != self.columns.len() {
            return Err(StageError::SchemaMismatch {
                expected: self.columns.len(),
                got: sample.features.len(),
            });
        }
        self.samples.push(sample);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn rows(&self) -> Vec<&[f64]> {
        self.samples.iter().map(|s| s.features.values()).collect()
    }

    pub fn classes(&self) -> Vec<u8> {
        self.samples.iter().map(|s| s.label.class()).collect()
    }

    /// `(male, female)` sample counts.
    pub fn class_counts(&self) -> (usize, usize) {
        let male = self.samples.iter().filter(|s| s.label == Label::Male).count();
        (male, self.samples.len() - male)
    }

    /// Checks the table is usable for training.
    pub fn validate(&self) -> Result<(), StageError> {
        if self.position == 0 {
            return Err(StageError::InvalidDataset("positions start at 1".into()));
        }
        if self.columns.is_empty() {
            return Err(StageError::InvalidDataset("no feature columns".into()));
        }
        for s in &self.samples {
            if s.features.len() != self.columns.len() {
                return Err(StageError::InvalidDataset(format!(
                    "{}: {} values for {} columns",
                    s.source,
                    s.features.len(),
                    self.columns.len()
                )));
            }
            if s.features.values().iter().any(|v| !v.is_finite()) {
                return Err(StageError::InvalidDataset(format!(
                    "{}: non-finite feature value",
                    s.source
                )));
            }
        }
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self, StageError> {
        let file = File::open(path)?;
        let ds: Self = serde_json::from_reader(BufReader::new(file))?;
        ds.validate()?;
        Ok(ds)
    }

    pub fn save(&self, path: &Path) -> Result<(), StageError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut w = BufWriter::new(File::create(path)?);
        serde_json::to_writer(&mut w, self)?;
        w.flush()?;
        Ok(())
    }
}

/// A directory of recordings sharing one label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorpusGroup {
    pub dir: String,
    pub label: Label,
}

/// Counters of one position's build.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BuildStats {
    pub position: usize,
    pub rows: usize,
    pub degraded: usize,
    pub skipped: usize,
}

/// Builds per-position datasets from a labeled audio corpus laid out as
/// `<root>/<group.dir>/audio_<position>/*.wav`.
#[derive(Debug, Clone)]
pub struct DatasetBuilder {
    features: FeatureVectorBuilder,
    groups: Vec<CorpusGroup>,
    seed: u64,
}

impl DatasetBuilder {
    pub fn new(features: FeatureVectorBuilder, groups: Vec<CorpusGroup>, seed: u64) -> Self {
        Self {
            features,
            groups,
            seed,
        }
    }

    pub fn position_dir(root: &Path, group: &CorpusGroup, position: usize) -> PathBuf {
        root.join(&group.dir).join(format!("audio_{position}"))
    }

    /// Extracts every recording of `position` across all groups.
    ///
    /// Unreadable or too-short recordings are logged and skipped; degraded
    /// prosody keeps the row with its zero fallback. Rows are shuffled with
    /// the builder's seed.
    pub fn build(&self, root: &Path, position: usize) -> Result<(Dataset, BuildStats), StageError> {
        let mut ds = Dataset::new(position, self.features.schema().clone());
        let mut stats = BuildStats {
            position,
            ..BuildStats::default()
        };

        for group in &self.groups {
            let dir = Self::position_dir(root, group, position);
            let files = match wav_files(&dir) {
                Ok(files) => files,
                Err(e) => {
                    tracing::warn!(dir = %dir.display(), error = %e, "stage: corpus directory skipped");
                    continue;
                }
            };

            for path in files {
                let row = voxid_audio::load_wav(&path)
                    .map_err(StageError::from)
                    .and_then(|w| self.features.build(&w).map_err(StageError::from));
                match row {
                    Ok(row) => {
                        if row.prosody.is_degraded() {
                            stats.degraded += 1;
                        }
                        ds.push(LabeledSample {
                            source: path.display().to_string(),
                            label: group.label,
                            features: row.vector,
                        })?;
                        stats.rows += 1;
                    }
                    Err(e) => {
                        tracing::warn!(file = %path.display(), error = %e, "stage: recording skipped");
                        stats.skipped += 1;
                    }
                }
            }
        }

        let mut rng = StdRng::seed_from_u64(self.seed);
        ds.samples.shuffle(&mut rng);

        tracing::info!(
            position,
            rows = stats.rows,
            degraded = stats.degraded,
            skipped = stats.skipped,
            "stage: dataset built"
        );
        Ok((ds, stats))
    }
}

fn wav_files(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|e| e.ok().map(|e| e.path()))
        .filter(|p| {
            p.extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case("wav"))
        })
        .collect();
    files.sort();
    Ok(files)
}
