use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context};

pub const DEFAULT_PROMPTS_DIR: &str = "prompts";
pub const DEFAULT_SYSTEM_PROMPT_FILE: &str = "system_prompt.txt";

pub const TEXT_PLACEHOLDER: &str = "{text}";

pub const DEFAULT_SYSTEM_PROMPT: &str = "Выступи в роли литературного переводчика, \
виртуоза русского языка. Твоя задача — не просто перевести слова, а создать на русском \
языке полноценное художественное произведение, которое сохранит душу, стиль и \
эстетическое воздействие оригинала. Кроме перевода ничего добавлять не надо.\n\n{text}";

/// Substitutes `{key}` with its value. Every occurrence is replaced.
pub fn render_template(template: &str, vars: &[(&str, &str)]) -> String {
    let mut out = template.to_string();
    for (k, v) in vars {
        let pat = format!("{{{k}}}");
        out = out.replace(&pat, v);
    }
    out
}

/// The prompt sent for one chunk. A template without `{text}` is sent unchanged.
pub fn render_prompt(template: &str, chunk: &str) -> String {
    render_template(template, &[("text", chunk)])
}

pub fn read_prompt_file(config_dir: &Path, path: &str) -> anyhow::Result<String> {
    let mut p = PathBuf::from(path);
    if p.is_relative() {
        p = config_dir.join(&p);
    }
    if !p.exists() {
        return Err(anyhow!(
            "prompt file not found: {} (run: large-file-translator --init-config)",
            p.display()
        ));
    }
    std::fs::read_to_string(&p).with_context(|| format!("read prompt: {}", p.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn substitutes_chunk() {
        assert_eq!(render_prompt("Translate: {text}", "hola"), "Translate: hola");
    }

    #[test]
    fn replaces_every_placeholder() {
        assert_eq!(
            render_prompt("{text} / {text}", "hola"),
            "hola / hola"
        );
    }

    #[test]
    fn template_without_placeholder_is_sent_as_is() {
        assert_eq!(render_prompt("Translate please", "hola"), "Translate please");
    }

    #[test]
    fn chunk_braces_are_not_expanded_again() {
        assert_eq!(render_prompt("<{text}>", "{text}"), "<{text}>");
    }

    #[test]
    fn default_prompt_ends_with_placeholder() {
        assert!(DEFAULT_SYSTEM_PROMPT.ends_with("\n\n{text}"));
        assert_eq!(DEFAULT_SYSTEM_PROMPT.matches(TEXT_PLACEHOLDER).count(), 1);
    }

    #[test]
    fn relative_prompt_file_resolves_against_config_dir() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("p.txt"), "Переведи: {text}").expect("write");
        let text = read_prompt_file(dir.path(), "p.txt").expect("read");
        assert_eq!(text, "Переведи: {text}");
        assert!(read_prompt_file(dir.path(), "missing.txt").is_err());
    }
}
