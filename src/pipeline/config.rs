use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;

use crate::config::{
    find_default_config, load_config, AppConfig, CONFIG_ENV_VAR, DEFAULT_CONFIG_FILENAME,
};
use crate::error::{PipelineError, Result};
use crate::models::{Connectivity, KeepAliveUnit};
use crate::options::{InferenceOptions, OptionsInput};
use crate::pipeline::prompts::{
    read_prompt_file, DEFAULT_PROMPTS_DIR, DEFAULT_SYSTEM_PROMPT, DEFAULT_SYSTEM_PROMPT_FILE,
};

pub const DEFAULT_INPUT_FILE: &str = "novel_output.txt";
pub const DEFAULT_OUTPUT_FILE: &str = "novel_output_russian.txt";
pub const DEFAULT_CHUNK_SIZE: usize = 2000;
pub const MIN_CHUNK_SIZE: usize = 500;
pub const MAX_CHUNK_SIZE: usize = 8000;
pub const CHUNK_SIZE_STEP: usize = 100;
pub const DEFAULT_TRACE_DIR: &str = "_trace";

/// Everything one translation run needs.
#[derive(Clone, Debug)]
pub struct PipelineConfig {
    pub input_file: PathBuf,
    pub output_file: PathBuf,
    /// Characters per chunk.
    pub chunk_size: usize,
    pub system_prompt: String,
    pub connectivity: Option<Connectivity>,
    pub options: Option<OptionsInput>,

    pub trace_dir: PathBuf,
    pub trace_prompts: bool,
    pub request_timeout: Option<Duration>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            input_file: PathBuf::from(DEFAULT_INPUT_FILE),
            output_file: PathBuf::from(DEFAULT_OUTPUT_FILE),
            chunk_size: DEFAULT_CHUNK_SIZE,
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            connectivity: None,
            options: None,
            trace_dir: PathBuf::from(DEFAULT_TRACE_DIR),
            trace_prompts: false,
            request_timeout: None,
        }
    }
}

/// Command-line values layered over the config file.
#[derive(Clone, Debug, Default)]
pub struct Overrides {
    pub input_file: Option<PathBuf>,
    pub output_file: Option<PathBuf>,
    pub chunk_size: Option<usize>,
    pub system_prompt_file: Option<PathBuf>,
    pub url: Option<String>,
    pub model: Option<String>,
    pub keep_alive: Option<i64>,
    pub keep_alive_unit: Option<String>,
    pub trace_prompts: Option<bool>,
    pub request_timeout_secs: Option<u64>,
}

impl PipelineConfig {
    pub fn new(connectivity: Connectivity) -> Self {
        Self {
            connectivity: Some(connectivity),
            ..Self::default()
        }
    }

    /// Checks bounds before anything touches the filesystem or network.
    pub fn validate(&self) -> Result<()> {
        if !(MIN_CHUNK_SIZE..=MAX_CHUNK_SIZE).contains(&self.chunk_size) {
            return Err(PipelineError::InvalidConfig(format!(
                "chunk_size must be within {MIN_CHUNK_SIZE}..={MAX_CHUNK_SIZE}, got {}",
                self.chunk_size
            )));
        }
        if self.chunk_size % CHUNK_SIZE_STEP != 0 {
            return Err(PipelineError::InvalidConfig(format!(
                "chunk_size must be a multiple of {CHUNK_SIZE_STEP}, got {}",
                self.chunk_size
            )));
        }
        let conn = self.connectivity.as_ref().ok_or_else(|| {
            PipelineError::InvalidConfig("connectivity (url + model) is required".to_string())
        })?;
        if conn.url.trim().is_empty() {
            return Err(PipelineError::InvalidConfig("connectivity.url is empty".to_string()));
        }
        if conn.model.trim().is_empty() {
            return Err(PipelineError::InvalidConfig(
                "connectivity.model is empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Options for this run, or `None` to leave server defaults in place.
    pub fn inference_options(&self) -> Result<Option<InferenceOptions>> {
        match self.options.as_ref() {
            Some(opts) => opts.resolve(),
            None => Ok(None),
        }
    }

    /// Loads the config file (explicit path, env var, then upward search) and applies
    /// command-line overrides on top of it.
    pub fn from_file_and_overrides(
        config_path: Option<PathBuf>,
        overrides: Overrides,
    ) -> anyhow::Result<Self> {
        let workdir = overrides
            .input_file
            .as_deref()
            .and_then(Path::parent)
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));

        let cfg_file = config_path
            .or_else(|| std::env::var(CONFIG_ENV_VAR).ok().map(PathBuf::from))
            .or_else(|| find_default_config(&workdir, DEFAULT_CONFIG_FILENAME));

        let mut file_cfg = AppConfig::default();
        if let Some(p) = cfg_file.as_ref() {
            if p.exists() {
                file_cfg = load_config(p)?;
                tracing::debug!(config = %p.display(), "loaded config");
            }
        }
        let cfg_path = cfg_file.unwrap_or_else(|| workdir.join(DEFAULT_CONFIG_FILENAME));
        let config_dir = cfg_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));

        Self::from_app_config(file_cfg, &config_dir, overrides)
    }

    pub fn from_app_config(
        file_cfg: AppConfig,
        config_dir: &Path,
        overrides: Overrides,
    ) -> anyhow::Result<Self> {
        let connectivity = merge_connectivity(file_cfg.connectivity, &overrides);
        let pipeline = file_cfg.pipeline;

        let input_file = overrides
            .input_file
            .or(pipeline.input_file)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_INPUT_FILE));
        let output_file = overrides
            .output_file
            .or(pipeline.output_file)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_FILE));
        let chunk_size = overrides
            .chunk_size
            .or(pipeline.chunk_size)
            .unwrap_or(DEFAULT_CHUNK_SIZE);

        let system_prompt = if let Some(p) = overrides.system_prompt_file.as_ref() {
            std::fs::read_to_string(p)
                .with_context(|| format!("read prompt: {}", p.display()))?
        } else if let Some(inline) = pipeline.system_prompt {
            inline
        } else if let Some(rel) = pipeline.system_prompt_file.as_deref() {
            read_prompt_file(config_dir, rel)?
        } else {
            DEFAULT_SYSTEM_PROMPT.to_string()
        };

        let output_dir = output_file
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        let trace_dir = pipeline
            .trace_dir
            .unwrap_or_else(|| DEFAULT_TRACE_DIR.to_string());
        let trace_dir = if Path::new(&trace_dir).is_absolute() {
            PathBuf::from(trace_dir)
        } else {
            output_dir.join(trace_dir)
        };
        let trace_prompts = overrides
            .trace_prompts
            .or(pipeline.trace_prompts)
            .unwrap_or(false);
        let request_timeout = overrides
            .request_timeout_secs
            .or(pipeline.request_timeout_secs)
            .filter(|s| *s > 0)
            .map(Duration::from_secs);

        Ok(Self {
            input_file,
            output_file,
            chunk_size,
            system_prompt,
            connectivity,
            options: file_cfg.options.map(OptionsInput::Raw),
            trace_dir,
            trace_prompts,
            request_timeout,
        })
    }
}

fn merge_connectivity(file: Option<Connectivity>, o: &Overrides) -> Option<Connectivity> {
    let mut conn = match (file, o.model.as_ref()) {
        (Some(c), _) => c,
        (None, Some(model)) => Connectivity::new(
            o.url
                .clone()
                .unwrap_or_else(|| crate::models::ollama::DEFAULT_OLLAMA_URL.to_string()),
            model.clone(),
        ),
        (None, None) => return None,
    };
    if let Some(url) = o.url.as_ref() {
        conn.url = url.clone();
    }
    if let Some(model) = o.model.as_ref() {
        conn.model = model.clone();
    }
    if let Some(k) = o.keep_alive {
        conn.keep_alive = k;
    }
    if let Some(unit) = o.keep_alive_unit.as_deref() {
        conn.keep_alive_unit = KeepAliveUnit::parse(unit);
    }
    Some(conn)
}

pub fn init_default_config(dir: &Path, force: bool) -> anyhow::Result<PathBuf> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("create config dir: {}", dir.display()))?;
    let cfg_path = dir.join(DEFAULT_CONFIG_FILENAME);

    let prompts_dir = dir.join(DEFAULT_PROMPTS_DIR);
    std::fs::create_dir_all(&prompts_dir)
        .with_context(|| format!("create prompts dir: {}", prompts_dir.display()))?;

    let prompt_path = prompts_dir.join(DEFAULT_SYSTEM_PROMPT_FILE);
    if !prompt_path.exists() || force {
        std::fs::write(&prompt_path, DEFAULT_SYSTEM_PROMPT)
            .with_context(|| format!("write prompt: {}", prompt_path.display()))?;
    }

    if cfg_path.exists() && !force {
        return Ok(cfg_path);
    }
    std::fs::write(&cfg_path, DEFAULT_CONFIG_TOML)
        .with_context(|| format!("write config: {}", cfg_path.display()))?;
    Ok(cfg_path)
}

const DEFAULT_CONFIG_TOML: &str = r#"[pipeline]
input_file = "novel_output.txt"
output_file = "novel_output_russian.txt"
# Characters per request: 500..=8000, in steps of 100.
chunk_size = 2000
# Every "{text}" in the template is replaced with the chunk.
system_prompt_file = "prompts/system_prompt.txt"

trace_dir = "_trace"
trace_prompts = false
# request_timeout_secs = 600

[connectivity]
url = "http://127.0.0.1:11434"
model = "llama3.1:8b"
keep_alive = 5
# "minutes" -> m, anything else -> h
keep_alive_unit = "minutes"

# Only options whose enable_<name> flag is true are sent.
[options]
enable_temperature = true
temperature = 0.7
enable_top_p = false
top_p = 0.9
enable_num_ctx = false
num_ctx = 8192
"#;

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn valid() -> PipelineConfig {
        PipelineConfig::new(Connectivity::new("http://localhost:11434", "llama3"))
    }

    #[test]
    fn defaults_match_node_inputs() {
        let cfg = PipelineConfig::default();
        assert_eq!(cfg.input_file, PathBuf::from("novel_output.txt"));
        assert_eq!(cfg.output_file, PathBuf::from("novel_output_russian.txt"));
        assert_eq!(cfg.chunk_size, 2000);
        assert!(cfg.system_prompt.contains("{text}"));
        assert!(cfg.request_timeout.is_none());
    }

    #[test]
    fn chunk_size_bounds_and_step() {
        for ok in [500, 2000, 8000] {
            let cfg = PipelineConfig {
                chunk_size: ok,
                ..valid()
            };
            assert!(cfg.validate().is_ok(), "{ok}");
        }
        for bad in [0, 400, 8100, 2050] {
            let cfg = PipelineConfig {
                chunk_size: bad,
                ..valid()
            };
            assert!(
                matches!(cfg.validate(), Err(PipelineError::InvalidConfig(_))),
                "{bad}"
            );
        }
    }

    #[test]
    fn connectivity_is_required() {
        let cfg = PipelineConfig::default();
        assert!(matches!(cfg.validate(), Err(PipelineError::InvalidConfig(_))));
        let cfg = PipelineConfig::new(Connectivity::new("http://localhost:11434", " "));
        assert!(matches!(cfg.validate(), Err(PipelineError::InvalidConfig(_))));
    }

    #[test]
    fn overrides_win_over_file() {
        let file_cfg: AppConfig = toml::from_str(
            r#"
[pipeline]
input_file = "a.txt"
chunk_size = 1000
system_prompt = "T: {text}"

[connectivity]
model = "file-model"
keep_alive = 3
keep_alive_unit = "minutes"

[options]
enable_seed = true
seed = 1
"#,
        )
        .expect("toml");
        let overrides = Overrides {
            chunk_size: Some(1500),
            model: Some("cli-model".into()),
            keep_alive_unit: Some("hours".into()),
            ..Default::default()
        };
        let cfg = PipelineConfig::from_app_config(file_cfg, Path::new("."), overrides)
            .expect("config");

        assert_eq!(cfg.input_file, PathBuf::from("a.txt"));
        assert_eq!(cfg.chunk_size, 1500);
        assert_eq!(cfg.system_prompt, "T: {text}");
        let conn = cfg.connectivity.as_ref().expect("conn");
        assert_eq!(conn.model, "cli-model");
        assert_eq!(conn.keep_alive_string(), "3h");
        let opts = cfg.inference_options().expect("opts").expect("some");
        assert_eq!(opts.get("seed"), Some(&json!(1)));
        assert_eq!(cfg.trace_dir, PathBuf::from(".").join("_trace"));
    }

    #[test]
    fn cli_model_alone_builds_connectivity() {
        let overrides = Overrides {
            model: Some("mistral".into()),
            ..Default::default()
        };
        let cfg = PipelineConfig::from_app_config(AppConfig::default(), Path::new("."), overrides)
            .expect("config");
        let conn = cfg.connectivity.expect("conn");
        assert_eq!(conn.url, crate::models::ollama::DEFAULT_OLLAMA_URL);
        assert_eq!(conn.keep_alive_string(), "5m");
    }

    #[test]
    fn init_config_writes_loadable_files() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = init_default_config(dir.path(), false).expect("init");
        let file_cfg = load_config(&path).expect("load");
        let cfg = PipelineConfig::from_app_config(file_cfg, dir.path(), Overrides::default())
            .expect("config");
        assert_eq!(cfg.system_prompt, DEFAULT_SYSTEM_PROMPT);
        assert!(cfg.validate().is_ok());
        let opts = cfg.inference_options().expect("opts").expect("some");
        assert_eq!(opts.len(), 1);
    }

    #[test]
    fn init_config_keeps_existing_without_force() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(DEFAULT_CONFIG_FILENAME);
        std::fs::write(&path, "# mine\n").expect("write");
        init_default_config(dir.path(), false).expect("init");
        assert_eq!(std::fs::read_to_string(&path).expect("read"), "# mine\n");
        init_default_config(dir.path(), true).expect("init");
        assert!(std::fs::read_to_string(&path).expect("read").contains("[connectivity]"));
    }
}
