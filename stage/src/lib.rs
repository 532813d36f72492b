//! Per-prompt stage models and the sessions that combine them.
//!
//! Each prompt position has its own frozen [`StageModel`]: a
//! [`Standardizer`], a rank-k [`Projector`] and a [`LogisticClassifier`].
//! [`Trainer`] builds one from a labeled [`Dataset`], choosing k with
//! [`select_components`] and reporting stratified cross-validation accuracy.
//! At inference time the [`Engine`] scores recordings and a
//! [`SessionAccumulator`] averages the per-stage probabilities into a
//! [`Decision`].
//!
//! # Example
//!
//! ```no_run
//! use voxid_features::{FeatureVectorBuilder, ProsodyConfig, ShortTermConfig};
//! use voxid_stage::{DirStore, Engine};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let features = FeatureVectorBuilder::new(ShortTermConfig::default(), ProsodyConfig::default())?;
//! let engine = Engine::load(&DirStore::new("models"), 6, features)?;
//! let mut session = engine.start_session();
//! for position in 1..=6 {
//!     let wav = voxid_audio::load_wav(format!("take_{position}.wav"))?;
//!     engine.submit_recording(&mut session, position, &wav)?;
//! }
//! println!("{:?}", session.finalize()?);
//! # Ok(())
//! # }
//! ```

mod components;
mod dataset;
mod engine;
mod error;
mod folds;
mod linalg;
mod logistic;
mod model;
mod pca;
mod scaler;
mod session;
mod store;
mod train;

pub use components::{select_components, SelectionConfig};
pub use dataset::{BuildStats, CorpusGroup, Dataset, DatasetBuilder, Label, LabeledSample};
pub use engine::{prompt, Engine, StageScore, StageSet, PROMPTS};
pub use error::StageError;
pub use folds::{Fold, StratifiedKFold, ValidationConfig};
pub use logistic::{LogisticClassifier, LogisticConfig};
pub use model::StageModel;
pub use pca::Projector;
pub use scaler::Standardizer;
pub use session::{Decision, SessionAccumulator};
pub use store::{ArtifactStore, DirStore, MemoryStore};
pub use train::{StageReport, TrainConfig, TrainedStage, Trainer};
