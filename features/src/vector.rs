use serde::{Deserialize, Serialize};
use voxid_audio::Waveform;

use crate::prosody::{ProsodicExtractor, ProsodyConfig, ProsodyOutcome, PROSODIC_COLUMNS};
use crate::spectral::{ShortTermConfig, ShortTermExtractor};
use crate::FeatureError;

/// Ordered column names of a feature vector.
///
/// Every artifact trained on a schema must be scored with vectors of the
/// same schema; column order and count never change within a model version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureSchema {
    columns: Vec<String>,
}

impl FeatureSchema {
    pub fn new(columns: Vec<String>) -> Self {
        Self { columns }
    }

    /// Short-term summary columns followed by the prosodic columns.
    pub fn standard() -> Self {
        let mut columns = ShortTermExtractor::column_names();
        columns.extend(PROSODIC_COLUMNS.iter().map(|c| c.to_string()));
        Self { columns }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }
}

/// One fixed-schema numeric row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureVector(Vec<f64>);

impl FeatureVector {
    pub fn new(values: Vec<f64>) -> Self {
        Self(values)
    }

    pub fn values(&self) -> &[f64] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_inner(self) -> Vec<f64> {
        self.0
    }
}

impl From<Vec<f64>> for FeatureVector {
    fn from(values: Vec<f64>) -> Self {
        Self(values)
    }
}

/// A built feature vector plus how its prosodic part was obtained.
#[derive(Debug, Clone)]
pub struct FeatureRow {
    pub vector: FeatureVector,
    pub prosody: ProsodyOutcome,
}

/// Concatenates short-term summary and prosodic features into one row.
#[derive(Debug, Clone)]
pub struct FeatureVectorBuilder {
    short_term: ShortTermExtractor,
    prosody: ProsodicExtractor,
    schema: FeatureSchema,
}

impl FeatureVectorBuilder {
    pub fn new(short_term: ShortTermConfig, prosody: ProsodyConfig) -> Result<Self, FeatureError> {
        Ok(Self {
            short_term: ShortTermExtractor::new(short_term)?,
            prosody: ProsodicExtractor::new(prosody)?,
            schema: FeatureSchema::standard(),
        })
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    /// Builds the feature row of a waveform.
    ///
    /// Fails only when the waveform is too short for short-term framing.
    /// A prosodic analysis that does not converge is absorbed here: the
    /// row carries zeros in the prosodic columns and the outcome records
    /// the reason.
    pub fn build(&self, waveform: &Waveform) -> Result<FeatureRow, FeatureError> {
        let mut values = self
            .short_term
            .extract(waveform.samples(), waveform.sample_rate())?;

        let prosody = self.prosody.analyze(waveform);
        if let Some(reason) = prosody.degradation() {
            tracing::warn!(
                %reason,
                samples = waveform.len(),
                sample_rate = waveform.sample_rate(),
                "features: prosodic analysis degraded, using zero row"
            );
        }
        values.extend_from_slice(&prosody.row());
        debug_assert_eq!(values.len(), self.schema.len());

        Ok(FeatureRow {
            vector: FeatureVector(values),
            prosody,
        })
    }
}
