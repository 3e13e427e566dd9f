use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Deserialize;

use crate::models::Connectivity;
use crate::options::RawOptions;

pub const DEFAULT_CONFIG_FILENAME: &str = "large-file-translator.toml";
pub const CONFIG_ENV_VAR: &str = "LARGE_FILE_TRANSLATOR_CONFIG";

#[derive(Clone, Debug, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub pipeline: PipelineSection,
    #[serde(default)]
    pub connectivity: Option<Connectivity>,
    /// Flat `enable_<name>` / `<name>` table.
    #[serde(default)]
    pub options: Option<RawOptions>,
}

#[derive(Clone, Debug, Deserialize, Default)]
pub struct PipelineSection {
    #[serde(default)]
    pub input_file: Option<PathBuf>,
    #[serde(default)]
    pub output_file: Option<PathBuf>,
    #[serde(default)]
    pub chunk_size: Option<usize>,

    /// Inline template; wins over `system_prompt_file`.
    #[serde(default)]
    pub system_prompt: Option<String>,
    /// Template file, relative to the config file directory.
    #[serde(default)]
    pub system_prompt_file: Option<String>,

    #[serde(default)]
    pub trace_dir: Option<String>,
    #[serde(default)]
    pub trace_prompts: Option<bool>,

    /// Unset means no client-side timeout.
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
}

pub fn find_file_upwards(start_dir: &Path, filename: &str, max_levels: usize) -> Option<PathBuf> {
    let mut dir = start_dir;
    for _ in 0..=max_levels {
        let candidate = dir.join(filename);
        if candidate.exists() {
            return Some(candidate);
        }
        dir = dir.parent()?;
    }
    None
}

pub fn find_default_config(workdir: &Path, filename: &str) -> Option<PathBuf> {
    if let Ok(cwd) = std::env::current_dir() {
        if let Some(p) = find_file_upwards(&cwd, filename, 8) {
            return Some(p);
        }
    }
    if let Some(p) = find_file_upwards(workdir, filename, 8) {
        return Some(p);
    }
    if let Ok(exe) = std::env::current_exe() {
        if let Some(dir) = exe.parent() {
            if let Some(p) = find_file_upwards(dir, filename, 10) {
                return Some(p);
            }
        }
    }
    None
}

pub fn load_config(path: &Path) -> anyhow::Result<AppConfig> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("read config: {}", path.display()))?;
    let cfg: AppConfig = toml::from_str(&text).context("parse config toml")?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::models::KeepAliveUnit;

    #[test]
    fn parses_all_sections() {
        let cfg: AppConfig = toml::from_str(
            r#"
[pipeline]
input_file = "book.txt"
chunk_size = 3000
system_prompt_file = "prompts/system_prompt.txt"

[connectivity]
url = "http://gpu-box:11434"
model = "qwen2.5:14b"
keep_alive = 10
keep_alive_unit = "minutes"

[options]
enable_temperature = true
temperature = 0.3
"#,
        )
        .expect("toml");

        assert_eq!(cfg.pipeline.input_file, Some(PathBuf::from("book.txt")));
        assert_eq!(cfg.pipeline.chunk_size, Some(3000));
        assert_eq!(cfg.pipeline.output_file, None);

        let conn = cfg.connectivity.expect("connectivity");
        assert_eq!(conn.model, "qwen2.5:14b");
        assert_eq!(conn.keep_alive_unit, KeepAliveUnit::Minutes);
        assert_eq!(conn.keep_alive_string(), "10m");

        let opts = cfg.options.expect("options").filter().expect("filter").expect("some");
        assert_eq!(opts.get("temperature"), Some(&json!(0.3)));
    }

    #[test]
    fn empty_file_is_default() {
        let cfg: AppConfig = toml::from_str("").expect("toml");
        assert!(cfg.connectivity.is_none());
        assert!(cfg.options.is_none());
        assert!(cfg.pipeline.chunk_size.is_none());
    }

    #[test]
    fn finds_config_in_parent_dir() {
        let dir = tempfile::tempdir().expect("tempdir");
        let nested = dir.path().join("a").join("b");
        std::fs::create_dir_all(&nested).expect("mkdir");
        std::fs::write(dir.path().join(DEFAULT_CONFIG_FILENAME), "").expect("write");

        let found = find_file_upwards(&nested, DEFAULT_CONFIG_FILENAME, 4).expect("found");
        assert_eq!(found, dir.path().join(DEFAULT_CONFIG_FILENAME));
        assert!(find_file_upwards(&nested, "absent.toml", 1).is_none());
    }
}
