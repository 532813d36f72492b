use std::path::PathBuf;

use serde::Serialize;
use voxid_audio::Waveform;
use voxid_features::{Degradation, FeatureVectorBuilder};

use crate::{ArtifactStore, SessionAccumulator, StageError, StageModel};

/// Spoken prompts, in stage order.
pub const PROMPTS: [&str; 6] = [
    "Say the vowel \"a\" and hold it for a few seconds",
    "Say the vowel \"e\" and hold it for a few seconds",
    "Say the vowel \"i\" and hold it for a few seconds",
    "Say the vowel \"o\" and hold it for a few seconds",
    "Say the vowel \"u\" and hold it for a few seconds",
    "Count from 0 to 9",
];

/// Prompt text of a 1-based position.
pub fn prompt(position: usize) -> Option<&'static str> {
    position.checked_sub(1).and_then(|i| PROMPTS.get(i)).copied()
}

/// Loaded stage models, addressed by 1-based position.
#[derive(Debug, Clone)]
pub struct StageSet {
    stages: Vec<StageModel>,
}

impl StageSet {
    pub fn new(stages: Vec<StageModel>) -> Self {
        Self { stages }
    }

    /// Loads positions `1..=count`. The first failure aborts the load.
    pub fn load(store: &dyn ArtifactStore, count: usize) -> Result<Self, StageError> {
        let stages = (1..=count)
            .map(|position| store.load(position))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { stages })
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    pub fn get(&self, position: usize) -> Result<&StageModel, StageError> {
        position
            .checked_sub(1)
            .and_then(|i| self.stages.get(i))
            .ok_or(StageError::InvalidPosition {
                position,
                stages: self.stages.len(),
            })
    }

    pub fn iter(&self) -> impl Iterator<Item = &StageModel> {
        self.stages.iter()
    }
}

/// Result of scoring one recording.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StageScore {
    pub position: usize,
    pub probability: f64,
    /// Set when the prosodic part of the vector fell back to zeros.
    #[serde(skip_serializing_if = "Option::is_none", serialize_with = "display_opt")]
    pub degradation: Option<Degradation>,
}

fn display_opt<S: serde::Serializer>(v: &Option<Degradation>, s: S) -> Result<S::Ok, S::Error> {
    match v {
        Some(d) => s.collect_str(d),
        None => s.serialize_none(),
    }
}

/// Inference front: feature extraction plus the loaded stage models.
///
/// Read-only after construction; share one engine across sessions.
#[derive(Debug, Clone)]
pub struct Engine {
    stages: StageSet,
    features: FeatureVectorBuilder,
}

impl Engine {
    /// Builds an engine, checking every stage against the extractor schema.
    pub fn new(stages: StageSet, features: FeatureVectorBuilder) -> Result<Self, StageError> {
        Self::assemble(stages, features, |position| PathBuf::from(format!("stage {position}")))
    }

    /// Loads `count` stages from `store`; any missing or corrupt artifact
    /// is fatal.
    pub fn load(
        store: &dyn ArtifactStore,
        count: usize,
        features: FeatureVectorBuilder,
    ) -> Result<Self, StageError> {
        let stages = StageSet::load(store, count)?;
        let engine = Self::assemble(stages, features, |position| store.location(position))?;
        tracing::info!(stages = count, "stage: engine ready");
        Ok(engine)
    }

    /// `locate` names where a mismatching stage came from.
    fn assemble(
        stages: StageSet,
        features: FeatureVectorBuilder,
        locate: impl Fn(usize) -> PathBuf,
    ) -> Result<Self, StageError> {
        if stages.is_empty() {
            return Err(StageError::InvalidModel("engine needs at least one stage".into()));
        }
        for (i, model) in stages.iter().enumerate() {
            if model.schema() != features.schema() {
                return Err(StageError::ArtifactLoad {
                    position: i + 1,
                    path: locate(i + 1),
                    reason: format!(
                        "model schema has {} columns, extractor produces {}",
                        model.schema().len(),
                        features.schema().len()
                    ),
                });
            }
        }
        Ok(Self { stages, features })
    }

    pub fn stages(&self) -> &StageSet {
        &self.stages
    }

    pub fn features(&self) -> &FeatureVectorBuilder {
        &self.features
    }

    pub fn start_session(&self) -> SessionAccumulator {
        SessionAccumulator::new(self.stages.len())
    }

    /// Scores a recording against one position's model, without a session.
    pub fn score(&self, position: usize, waveform: &Waveform) -> Result<StageScore, StageError> {
        let model = self.stages.get(position)?;
        let row = self.features.build(waveform)?;
        let probability = model.score(&row.vector)?;
        tracing::debug!(position, probability, "stage: recording scored");
        Ok(StageScore {
            position,
            probability,
            degradation: row.prosody.degradation(),
        })
    }

    /// Scores the recording of `position` and records it in `session`.
    ///
    /// On error the session is left unchanged, so the caller can re-prompt.
    pub fn submit_recording(
        &self,
        session: &mut SessionAccumulator,
        position: usize,
        waveform: &Waveform,
    ) -> Result<StageScore, StageError> {
        self.stages.get(position)?;
        session.check_next(position)?;
        let score = self.score(position, waveform)?;
        session.update(position, score.probability)?;
        Ok(score)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Decision, LogisticClassifier, MemoryStore, Projector, Standardizer};
    use voxid_features::{FeatureSchema, ProsodyConfig, ShortTermConfig};

    fn features() -> FeatureVectorBuilder {
        FeatureVectorBuilder::new(ShortTermConfig::default(), ProsodyConfig::default()).unwrap()
    }

    fn stage_model(schema: &FeatureSchema, bias: f64) -> StageModel {
        let p = schema.len();
        let rows: Vec<Vec<f64>> = (0..4)
            .map(|i| (0..p).map(|j| ((i * 7 + j * 3) % 11) as f64).collect())
            .collect();
        let s = Standardizer::fit(schema.clone(), &rows).unwrap();
        let z: Vec<Vec<f64>> = rows.iter().map(|r| s.transform(r).unwrap()).collect();
        let pca = Projector::fit(&z, 2).unwrap();
        let clf = LogisticClassifier::new(vec![0.0, 0.0], bias);
        StageModel::from_parts(s, pca, clf).unwrap()
    }

    fn store_with(count: usize, bias: f64) -> MemoryStore {
        let store = MemoryStore::new();
        let schema = features().schema().clone();
        for position in 1..=count {
            store.save(position, &stage_model(&schema, bias)).unwrap();
        }
        store
    }

    fn vowel(f0: f64, secs: f64) -> Waveform {
        let rate = 16000;
        let n = (secs * rate as f64) as usize;
        let samples = (0..n)
            .map(|i| {
                let phase = 2.0 * std::f64::consts::PI * f0 * i as f64 / rate as f64;
                0.4 * phase.sin() + 0.2 * (2.0 * phase).sin()
            })
            .collect();
        Waveform::new(samples, rate).unwrap()
    }

    #[test]
    fn test_prompts() {
        assert_eq!(prompt(0), None);
        assert_eq!(prompt(6), Some("Count from 0 to 9"));
        assert_eq!(prompt(7), None);
    }

    #[test]
    fn test_load_missing_stage_is_fatal() {
        let err = Engine::load(&store_with(5, 0.0), 6, features()).unwrap_err();
        assert!(matches!(err, StageError::ArtifactLoad { position: 6, .. }));
    }

    fn foreign_model() -> StageModel {
        let schema = FeatureSchema::new(vec!["a".into(), "b".into(), "c".into()]);
        stage_model(&schema, 0.0)
    }

    #[test]
    fn test_load_rejects_foreign_schema() {
        let store = MemoryStore::new();
        store.save(1, &foreign_model()).unwrap();
        match Engine::load(&store, 1, features()) {
            Err(StageError::ArtifactLoad { position, path, .. }) => {
                assert_eq!(position, 1);
                assert_eq!(path, PathBuf::from("memory:1"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_schema_error_names_artifact_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = crate::DirStore::new(dir.path());
        let schema = features().schema().clone();
        store.save(1, &stage_model(&schema, 0.0)).unwrap();
        store.save(2, &foreign_model()).unwrap();

        let err = Engine::load(&store, 2, features()).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("position 2"), "{msg}");
        assert!(msg.contains("scaler_2.json"), "{msg}");
        assert!(msg.contains("3 columns"), "{msg}");
    }

    #[test]
    fn test_new_names_stage_on_mismatch() {
        let set = StageSet::new(vec![foreign_model()]);
        let err = Engine::new(set, features()).unwrap_err();
        assert!(err.to_string().contains("from stage 1:"), "{err}");
    }

    #[test]
    fn test_full_session() {
        let engine = Engine::load(&store_with(6, 1.0), 6, features()).unwrap();
        let mut session = engine.start_session();
        let w = vowel(140.0, 0.5);
        for position in 1..=6 {
            let score = engine.submit_recording(&mut session, position, &w).unwrap();
            assert_eq!(score.position, position);
            assert!(score.probability > 0.5);
        }
        match session.finalize().unwrap() {
            Decision::Male { confidence } => assert!(confidence > 0.7),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_rejected_submission_keeps_session() {
        let engine = Engine::load(&store_with(6, 0.0), 6, features()).unwrap();
        let mut session = engine.start_session();

        let too_short = Waveform::new(vec![0.1; 100], 16000).unwrap();
        let err = engine.submit_recording(&mut session, 1, &too_short).unwrap_err();
        assert!(err.is_input_validation());
        assert_eq!(session.completed(), 0);

        let err = engine.submit_recording(&mut session, 2, &vowel(200.0, 0.3)).unwrap_err();
        assert!(matches!(err, StageError::StageOutOfOrder { expected: 1, got: 2 }));

        let err = engine.submit_recording(&mut session, 9, &vowel(200.0, 0.3)).unwrap_err();
        assert!(matches!(err, StageError::InvalidPosition { position: 9, .. }));
        assert!(matches!(session.finalize(), Err(StageError::IncompleteSession { .. })));
    }

    #[test]
    fn test_silence_scores_through_zero_fallback() {
        let engine = Engine::load(&store_with(6, 0.0), 6, features()).unwrap();
        let silence = Waveform::new(vec![0.0; 8000], 16000).unwrap();
        let score = engine.score(1, &silence).unwrap();
        assert!(score.degradation.is_some());
        assert_eq!(score.probability, 0.5);
    }
}
