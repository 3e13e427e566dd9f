use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{PipelineError, Result};

const ENABLE_PREFIX: &str = "enable_";

/// Generation options forwarded verbatim in the `options` field of a request.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InferenceOptions(Map<String, Value>);

impl InferenceOptions {
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn into_option(self) -> Option<Self> {
        if self.is_empty() {
            None
        } else {
            Some(self)
        }
    }
}

/// Flat option mapping as produced by an options node: `enable_<name>` flags next to
/// `<name>` values.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawOptions(BTreeMap<String, Value>);

impl RawOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Keeps `<name>: value` for every `enable_<name>` flag that is exactly `true`.
    ///
    /// Returns `Ok(None)` when nothing is enabled so callers send no options at all.
    pub fn filter(&self) -> Result<Option<InferenceOptions>> {
        let mut enabled = Map::new();
        for (key, flag) in &self.0 {
            let Some(name) = key.strip_prefix(ENABLE_PREFIX) else {
                continue;
            };
            if flag != &Value::Bool(true) {
                continue;
            }
            let value = self
                .0
                .get(name)
                .ok_or_else(|| PipelineError::MissingOptionKey(name.to_string()))?;
            enabled.insert(name.to_string(), value.clone());
        }
        Ok(InferenceOptions(enabled).into_option())
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for RawOptions {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

pub fn filter_options(raw: Option<&RawOptions>) -> Result<Option<InferenceOptions>> {
    match raw {
        Some(raw) if !raw.is_empty() => raw.filter(),
        _ => Ok(None),
    }
}

/// Options as handed to a pipeline run.
#[derive(Clone, Debug, PartialEq)]
pub enum OptionsInput {
    Raw(RawOptions),
    Typed(OllamaOptions),
}

impl OptionsInput {
    pub fn resolve(&self) -> Result<Option<InferenceOptions>> {
        match self {
            Self::Raw(raw) => filter_options(Some(raw)),
            Self::Typed(typed) => Ok(typed.enabled()),
        }
    }
}

impl From<RawOptions> for OptionsInput {
    fn from(raw: RawOptions) -> Self {
        Self::Raw(raw)
    }
}

impl From<OllamaOptions> for OptionsInput {
    fn from(typed: OllamaOptions) -> Self {
        Self::Typed(typed)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Toggle<T> {
    #[serde(default)]
    pub enabled: bool,
    pub value: T,
}

impl<T> Toggle<T> {
    pub fn on(value: T) -> Self {
        Self {
            enabled: true,
            value,
        }
    }

    pub fn off(value: T) -> Self {
        Self {
            enabled: false,
            value,
        }
    }
}

/// Typed counterpart of [`RawOptions`]: every option carries its own flag, so an enabled
/// option always has a value.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct OllamaOptions {
    #[serde(default)]
    pub temperature: Option<Toggle<f32>>,
    #[serde(default)]
    pub top_p: Option<Toggle<f32>>,
    #[serde(default)]
    pub top_k: Option<Toggle<u32>>,
    #[serde(default)]
    pub min_p: Option<Toggle<f32>>,
    #[serde(default)]
    pub typical_p: Option<Toggle<f32>>,
    #[serde(default)]
    pub tfs_z: Option<Toggle<f32>>,
    #[serde(default)]
    pub num_ctx: Option<Toggle<u32>>,
    #[serde(default)]
    pub num_predict: Option<Toggle<i32>>,
    #[serde(default)]
    pub num_keep: Option<Toggle<i32>>,
    #[serde(default)]
    pub repeat_penalty: Option<Toggle<f32>>,
    #[serde(default)]
    pub repeat_last_n: Option<Toggle<i32>>,
    #[serde(default)]
    pub presence_penalty: Option<Toggle<f32>>,
    #[serde(default)]
    pub frequency_penalty: Option<Toggle<f32>>,
    #[serde(default)]
    pub mirostat: Option<Toggle<u8>>,
    #[serde(default)]
    pub mirostat_eta: Option<Toggle<f32>>,
    #[serde(default)]
    pub mirostat_tau: Option<Toggle<f32>>,
    #[serde(default)]
    pub seed: Option<Toggle<i64>>,
    #[serde(default)]
    pub stop: Option<Toggle<Vec<String>>>,
}

impl OllamaOptions {
    pub fn enabled(&self) -> Option<InferenceOptions> {
        let mut out = Map::new();
        put(&mut out, "temperature", &self.temperature);
        put(&mut out, "top_p", &self.top_p);
        put(&mut out, "top_k", &self.top_k);
        put(&mut out, "min_p", &self.min_p);
        put(&mut out, "typical_p", &self.typical_p);
        put(&mut out, "tfs_z", &self.tfs_z);
        put(&mut out, "num_ctx", &self.num_ctx);
        put(&mut out, "num_predict", &self.num_predict);
        put(&mut out, "num_keep", &self.num_keep);
        put(&mut out, "repeat_penalty", &self.repeat_penalty);
        put(&mut out, "repeat_last_n", &self.repeat_last_n);
        put(&mut out, "presence_penalty", &self.presence_penalty);
        put(&mut out, "frequency_penalty", &self.frequency_penalty);
        put(&mut out, "mirostat", &self.mirostat);
        put(&mut out, "mirostat_eta", &self.mirostat_eta);
        put(&mut out, "mirostat_tau", &self.mirostat_tau);
        put(&mut out, "seed", &self.seed);
        put(&mut out, "stop", &self.stop);
        InferenceOptions(out).into_option()
    }
}

fn put<T: Serialize>(out: &mut Map<String, Value>, name: &str, toggle: &Option<Toggle<T>>) {
    let Some(t) = toggle else {
        return;
    };
    if !t.enabled {
        return;
    }
    // Values that do not serialize to JSON (NaN floats) are dropped.
    if let Ok(v) = serde_json::to_value(&t.value) {
        if !v.is_null() {
            out.insert(name.to_string(), v);
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn sample() -> RawOptions {
        RawOptions::from_iter([
            ("enable_temperature", json!(true)),
            ("temperature", json!(0.7)),
            ("enable_top_p", json!(false)),
            ("top_p", json!(0.9)),
        ])
    }

    #[test]
    fn keeps_only_enabled_options() {
        let opts = sample().filter().expect("filter").expect("some");
        assert_eq!(opts.len(), 1);
        assert_eq!(opts.get("temperature"), Some(&json!(0.7)));
        assert_eq!(opts.get("top_p"), None);
    }

    #[test]
    fn empty_or_absent_is_none() {
        assert_eq!(filter_options(None).expect("none"), None);
        assert_eq!(filter_options(Some(&RawOptions::new())).expect("empty"), None);
    }

    #[test]
    fn nothing_enabled_is_none() {
        let raw = RawOptions::from_iter([("enable_top_k", json!(false)), ("top_k", json!(40))]);
        assert_eq!(raw.filter().expect("filter"), None);
    }

    #[test]
    fn truthy_non_bool_flag_is_not_enabled() {
        let raw = RawOptions::from_iter([("enable_seed", json!(1)), ("seed", json!(42))]);
        assert_eq!(raw.filter().expect("filter"), None);
    }

    #[test]
    fn enabled_flag_without_value_fails() {
        let raw = RawOptions::from_iter([("enable_num_ctx", json!(true))]);
        match raw.filter() {
            Err(PipelineError::MissingOptionKey(name)) => assert_eq!(name, "num_ctx"),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn only_leading_enable_prefix_is_stripped() {
        let raw = RawOptions::from_iter([
            ("enable_enable_x", json!(true)),
            ("enable_x", json!("flag value")),
            ("x", json!("plain value")),
        ]);
        let opts = raw.filter().expect("filter").expect("some");
        assert_eq!(opts.get("enable_x"), Some(&json!("flag value")));
        assert_eq!(opts.get("x"), None);
    }

    #[test]
    fn raw_options_parse_from_toml_table() {
        let raw: RawOptions = toml::from_str(
            "enable_temperature = true\ntemperature = 0.25\nenable_stop = true\nstop = [\"###\"]\n",
        )
        .expect("toml");
        let opts = raw.filter().expect("filter").expect("some");
        assert_eq!(opts.get("temperature"), Some(&json!(0.25)));
        assert_eq!(opts.get("stop"), Some(&json!(["###"])));
    }

    #[test]
    fn typed_options_skip_disabled_toggles() {
        let opts = OllamaOptions {
            temperature: Some(Toggle::on(0.5)),
            top_p: Some(Toggle::off(0.9)),
            num_ctx: Some(Toggle::on(8192)),
            ..Default::default()
        };
        let enabled = opts.enabled().expect("some");
        assert_eq!(enabled.len(), 2);
        assert_eq!(enabled.get("temperature"), Some(&json!(0.5)));
        assert_eq!(enabled.get("num_ctx"), Some(&json!(8192)));
        assert_eq!(OllamaOptions::default().enabled(), None);
    }
}
