//! Shared helpers for commands.

use std::path::Path;

use anyhow::Context as _;
use voxid_audio::Waveform;
use voxid_cli::{load_config, Config, Output, OutputFormat};

use crate::Cli;

/// Loads the effective configuration.
pub fn get_config(cli: &Cli) -> anyhow::Result<Config> {
    load_config(cli.config.as_deref())
}

/// Output sink selected by the global flags.
pub fn output(cli: &Cli) -> Output {
    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Yaml
    };
    Output::new(format, cli.output.clone())
}

/// Loads a WAV recording.
pub fn load_recording(path: &Path) -> anyhow::Result<Waveform> {
    voxid_audio::load_wav(path).with_context(|| format!("load {}", path.display()))
}

/// Prints success message.
pub fn print_success(msg: &str) {
    eprintln!("\x1b[32m✓\x1b[0m {}", msg);
}

/// Prints info message.
pub fn print_info(msg: &str) {
    eprintln!("\x1b[34mℹ\x1b[0m {}", msg);
}
