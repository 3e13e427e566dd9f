use std::path::{Path, PathBuf};

use encoding_rs::UTF_8;
use tracing::{debug, info, warn};

use crate::error::{PipelineError, Result};
use crate::models::{Generate, GenerateRequest, InferenceError, OllamaClient};
use crate::progress::ConsoleProgress;

use super::chunker::chunks;
use super::output::OutputWriter;
use super::prompts::render_prompt;
use super::trace::TraceWriter;
use super::PipelineConfig;

/// Read → chunk → generate → append, one chunk at a time.
pub struct TranslationPipeline<C> {
    cfg: PipelineConfig,
    client: C,
    progress: ConsoleProgress,
    trace: TraceWriter,
}

impl TranslationPipeline<OllamaClient> {
    /// Validates `cfg` and builds an HTTP client for its connectivity.
    pub fn connect(cfg: PipelineConfig, progress: ConsoleProgress) -> Result<Self> {
        cfg.validate()?;
        let url = cfg
            .connectivity
            .as_ref()
            .map(|c| c.url.clone())
            .unwrap_or_default();
        let client = OllamaClient::new(&url, cfg.request_timeout).map_err(|source| {
            PipelineError::InvalidConfig(format!("cannot build HTTP client for {url}: {source}"))
        })?;
        Ok(Self::with_client(cfg, client, progress))
    }
}

impl<C: Generate> TranslationPipeline<C> {
    pub fn with_client(cfg: PipelineConfig, client: C, progress: ConsoleProgress) -> Self {
        let trace = TraceWriter::new(cfg.trace_dir.clone(), cfg.trace_prompts);
        Self {
            cfg,
            client,
            progress,
            trace,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.cfg
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    /// Translates the whole input file and returns the output path.
    ///
    /// On an inference failure the output keeps every chunk written before it.
    pub fn run(&mut self) -> Result<PathBuf> {
        self.cfg.validate()?;
        let input = self.cfg.input_file.clone();
        let output = self.cfg.output_file.clone();

        if !input.exists() {
            return Err(PipelineError::FileNotFound(input));
        }

        let (model, keep_alive) = match self.cfg.connectivity.as_ref() {
            Some(c) => (c.model.clone(), c.keep_alive_string()),
            None => {
                return Err(PipelineError::InvalidConfig(
                    "connectivity (url + model) is required".to_string(),
                ))
            }
        };
        let options = self.cfg.inference_options()?;

        let text = read_source(&input)?;
        let total_chars = text.chars().count();
        let parts = chunks(&text, self.cfg.chunk_size);
        let total = parts.len();
        info!(
            input = %input.display(),
            output = %output.display(),
            chars = total_chars,
            chunks = total,
            model = %model,
            keep_alive = %keep_alive,
            "starting translation"
        );

        let mut writer = OutputWriter::create(&output)?;
        let mut done_chars = 0usize;
        for chunk in parts {
            self.progress.chunk(chunk.ordinal, total);

            let prompt = render_prompt(&self.cfg.system_prompt, chunk.text);
            self.trace_text(chunk.ordinal, "prompt", &prompt);

            let request = GenerateRequest {
                model: model.clone(),
                prompt,
                options: options.clone(),
                keep_alive: keep_alive.clone(),
            };
            let response = self
                .client
                .generate(&request)
                .map_err(|source| inference_failure(chunk.ordinal, total, source))?;
            self.trace_text(chunk.ordinal, "response", &response.response);

            writer.write_chunk(&response.response)?;

            done_chars += chunk.text.chars().count();
            debug!(
                chunk = chunk.ordinal,
                total,
                offset = chunk.offset,
                response_chars = response.response.chars().count(),
                done = response.done,
                eval_count = ?response.eval_count,
                "chunk written"
            );
            self.progress.chars(done_chars, total_chars);
        }
        let written = writer.finish()?;

        info!(chunks = written, output = %output.display(), "translation finished");
        self.progress.saved(&output);
        Ok(output)
    }

    fn trace_text(&self, ordinal: usize, kind: &str, text: &str) {
        if let Err(err) = self.trace.write_chunk_text(ordinal, kind, text) {
            let error = format!("{err:#}");
            warn!(chunk = ordinal, %error, "trace write failed");
        }
    }
}

fn inference_failure(chunk: usize, total: usize, source: InferenceError) -> PipelineError {
    warn!(chunk, total, error = %source, "inference failed, aborting run");
    PipelineError::InferenceFailure {
        chunk,
        total,
        source,
    }
}

/// Strict UTF-8 read with `\r\n` and lone `\r` folded to `\n`. A leading BOM is kept.
fn read_source(path: &Path) -> Result<String> {
    let bytes = std::fs::read(path).map_err(|e| PipelineError::io(path, e))?;
    let text = UTF_8
        .decode_without_bom_handling_and_without_replacement(&bytes)
        .ok_or_else(|| PipelineError::Decode(path.to_path_buf()))?;
    Ok(normalize_newlines(&text))
}

fn normalize_newlines(text: &str) -> String {
    if text.contains('\r') {
        text.replace("\r\n", "\n").replace('\r', "\n")
    } else {
        text.to_string()
    }
}
