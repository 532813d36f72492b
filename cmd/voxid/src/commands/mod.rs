//! CLI commands module.

mod classify;
mod config;
mod dataset;
mod extract;
mod prompts;
mod score;
mod train;
mod util;

pub use classify::ClassifyCommand;
pub use config::ConfigCommand;
pub use dataset::DatasetCommand;
pub use extract::ExtractCommand;
pub use prompts::PromptsCommand;
pub use score::ScoreCommand;
pub use train::TrainCommand;

pub(crate) use util::*;
