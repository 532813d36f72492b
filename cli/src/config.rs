//! Configuration management for the voxid command.
//!
//! Configuration is stored in ~/.voxid/config.yaml. Every field is
//! optional; missing fields take their defaults.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use voxid_features::{FeatureVectorBuilder, ProsodyConfig, ShortTermConfig};
use voxid_stage::{
    CorpusGroup, DirStore, Label, SelectionConfig, StratifiedKFold, TrainConfig, ValidationConfig,
};

use crate::paths::Paths;

/// voxid configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Artifact store directory.
    pub model_dir: PathBuf,

    /// Directory of per-position dataset tables.
    pub dataset_dir: PathBuf,

    /// Number of prompts per session.
    pub stages: usize,

    pub prosody: ProsodyConfig,
    pub short_term: ShortTermConfig,
    pub selection: SelectionConfig,
    pub validation: ValidationConfig,

    /// Labeled corpus groups used by `voxid dataset`.
    pub corpus: Vec<CorpusGroup>,

    /// Path to the config file (not serialized).
    #[serde(skip)]
    config_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        let group = |dir: &str, label| CorpusGroup {
            dir: dir.to_string(),
            label,
        };
        Self {
            model_dir: PathBuf::from("~/.voxid/models"),
            dataset_dir: PathBuf::from("~/.voxid/datasets"),
            stages: 6,
            prosody: ProsodyConfig::default(),
            short_term: ShortTermConfig::default(),
            selection: SelectionConfig::default(),
            validation: ValidationConfig::default(),
            corpus: vec![
                group("Hombre_Fuma", Label::Male),
                group("Hombre_No_Fuma", Label::Male),
                group("Mujer_Fuma", Label::Female),
                group("Mujer_No_Fuma", Label::Female),
            ],
            config_path: PathBuf::new(),
        }
    }
}

impl Config {
    /// Gets the default config file path.
    pub fn default_config_path() -> Option<PathBuf> {
        Paths::new().ok().map(|p| p.config_file())
    }

    /// Returns the config file path.
    pub fn path(&self) -> &Path {
        &self.config_path
    }

    /// Checks every section; an invalid configuration is fatal.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.stages == 0 {
            anyhow::bail!("config: stages must be at least 1");
        }
        self.prosody.validate()?;
        self.short_term.validate()?;
        self.selection.validate()?;
        StratifiedKFold::new(self.validation)?;
        Ok(())
    }

    /// Artifact store directory with `~` expanded.
    pub fn model_dir(&self) -> PathBuf {
        expand(&self.model_dir)
    }

    /// Dataset directory with `~` expanded.
    pub fn dataset_dir(&self) -> PathBuf {
        expand(&self.dataset_dir)
    }

    pub fn store(&self) -> DirStore {
        DirStore::new(self.model_dir())
    }

    pub fn feature_builder(&self) -> anyhow::Result<FeatureVectorBuilder> {
        Ok(FeatureVectorBuilder::new(self.short_term, self.prosody)?)
    }

    pub fn train_config(&self) -> TrainConfig {
        TrainConfig {
            selection: self.selection,
            validation: self.validation,
            ..TrainConfig::default()
        }
    }

    /// Sets one scalar field by its dotted key, e.g. `validation.folds`.
    ///
    /// The value is parsed as YAML and the whole configuration is
    /// re-validated; on error the configuration is left unchanged.
    pub fn set(&mut self, key: &str, value: &str) -> anyhow::Result<()> {
        let mut next = self.clone();
        match key {
            "model_dir" => next.model_dir = parse_value(key, value)?,
            "dataset_dir" => next.dataset_dir = parse_value(key, value)?,
            "stages" => next.stages = parse_value(key, value)?,
            "prosody.f0_min" => next.prosody.f0_min = parse_value(key, value)?,
            "prosody.f0_max" => next.prosody.f0_max = parse_value(key, value)?,
            "prosody.unit" => next.prosody.unit = parse_value(key, value)?,
            "selection.variance_threshold" => {
                next.selection.variance_threshold = parse_value(key, value)?
            }
            "selection.increment_threshold" => {
                next.selection.increment_threshold = parse_value(key, value)?
            }
            "validation.folds" => next.validation.folds = parse_value(key, value)?,
            "validation.seed" => next.validation.seed = parse_value(key, value)?,
            _ => anyhow::bail!("config: unknown key {key:?}"),
        }
        next.validate()?;
        *self = next;
        Ok(())
    }

    /// Saves the configuration to its file.
    pub fn save(&self) -> anyhow::Result<()> {
        write_yaml(&self.config_path, self)
    }
}

fn parse_value<T: DeserializeOwned>(key: &str, value: &str) -> anyhow::Result<T> {
    serde_yaml::from_str(value).with_context(|| format!("config: invalid value for {key}: {value:?}"))
}

fn expand(path: &Path) -> PathBuf {
    match Paths::new() {
        Ok(paths) => paths.expand(path),
        Err(_) => path.to_path_buf(),
    }
}

fn resolve_path(custom_path: Option<&str>) -> anyhow::Result<PathBuf> {
    match custom_path {
        Some(p) => Ok(PathBuf::from(p)),
        None => Config::default_config_path()
            .ok_or_else(|| anyhow::anyhow!("cannot determine config path")),
    }
}

fn write_yaml(path: &Path, config: &Config) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let content = serde_yaml::to_string(config)?;
    std::fs::write(path, content)
        .with_context(|| format!("write config {}", path.display()))?;
    Ok(())
}

/// Loads the configuration, falling back to defaults when the file does
/// not exist.
pub fn load_config(custom_path: Option<&str>) -> anyhow::Result<Config> {
    let config_path = resolve_path(custom_path)?;

    let mut cfg: Config = if config_path.exists() {
        let content = std::fs::read_to_string(&config_path)
            .with_context(|| format!("read config {}", config_path.display()))?;
        serde_yaml::from_str(&content)
            .with_context(|| format!("parse config {}", config_path.display()))?
    } else {
        Config::default()
    };
    cfg.config_path = config_path;
    cfg.validate()?;

    Ok(cfg)
}

/// Saves configuration to the specified path, or the default one.
pub fn save_config(config: &Config, custom_path: Option<&str>) -> anyhow::Result<PathBuf> {
    let config_path = resolve_path(custom_path)?;
    write_yaml(&config_path, config)?;
    Ok(config_path)
}
