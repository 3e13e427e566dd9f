mod chunker;
mod config;
mod output;
mod prompts;
mod trace;
mod translator;

pub use chunker::{chunks, Chunk, Chunks};
pub use config::{
    init_default_config, Overrides, PipelineConfig, CHUNK_SIZE_STEP, DEFAULT_CHUNK_SIZE,
    DEFAULT_INPUT_FILE, DEFAULT_OUTPUT_FILE, MAX_CHUNK_SIZE, MIN_CHUNK_SIZE,
};
pub use output::OutputWriter;
pub use prompts::{render_prompt, render_template, DEFAULT_SYSTEM_PROMPT, TEXT_PLACEHOLDER};
pub use translator::TranslationPipeline;
