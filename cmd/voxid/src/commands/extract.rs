//! Feature extraction of a single recording.

use std::path::PathBuf;

use clap::Args;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use voxid_features::{FeatureSchema, FeatureVector};

use super::{get_config, load_recording, output};
use crate::Cli;

/// Print the feature vector of one recording.
#[derive(Args)]
pub struct ExtractCommand {
    /// WAV recording
    wav: PathBuf,
}

#[derive(Serialize)]
struct Extraction<'a> {
    source: String,
    sample_rate: u32,
    duration: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    degraded: Option<String>,
    features: Named<'a>,
}

/// Feature values keyed by column name, in schema order.
struct Named<'a> {
    schema: &'a FeatureSchema,
    vector: &'a FeatureVector,
}

impl Serialize for Named<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.schema.len()))?;
        for (name, value) in self.schema.columns().iter().zip(self.vector.values()) {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

impl ExtractCommand {
    pub async fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        let cfg = get_config(cli)?;
        let builder = cfg.feature_builder()?;
        let waveform = load_recording(&self.wav)?;
        let row = builder.build(&waveform)?;

        output(cli).write(&Extraction {
            source: self.wav.display().to_string(),
            sample_rate: waveform.sample_rate(),
            duration: waveform.duration().as_secs_f64(),
            degraded: row.prosody.degradation().map(|d| d.to_string()),
            features: Named {
                schema: builder.schema(),
                vector: &row.vector,
            },
        })
    }
}
