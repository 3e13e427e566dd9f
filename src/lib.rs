pub mod config;
pub mod error;
pub mod ffi;
pub mod models;
pub mod node;
pub mod options;
pub mod pipeline;
pub mod progress;

pub use error::{PipelineError, Result};
pub use models::{Connectivity, Generate, GenerateRequest, KeepAliveUnit, OllamaClient};
pub use options::{filter_options, InferenceOptions, OllamaOptions, OptionsInput, RawOptions};
pub use pipeline::{PipelineConfig, TranslationPipeline};
