//! How the translator presents itself to a node-based workflow host.

use serde::Serialize;
use serde_json::{json, Value};

use crate::pipeline::{
    CHUNK_SIZE_STEP, DEFAULT_CHUNK_SIZE, DEFAULT_INPUT_FILE, DEFAULT_OUTPUT_FILE,
    DEFAULT_SYSTEM_PROMPT, MAX_CHUNK_SIZE, MIN_CHUNK_SIZE,
};

pub const NODE_NAME: &str = "TranslateLargeFile";
pub const DISPLAY_NAME: &str = "Translate Large Text File (Ollama Connectivity)";
pub const CATEGORY: &str = "Text / Translation";
pub const CONNECTIVITY_TYPE: &str = "OLLAMA_CONNECTIVITY";
pub const OPTIONS_TYPE: &str = "OLLAMA_OPTIONS";

#[derive(Clone, Debug, Serialize)]
pub struct NodeInput {
    pub name: &'static str,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub required: bool,
    /// Widget metadata: default, bounds, tooltip.
    pub widget: Value,
}

#[derive(Clone, Debug, Serialize)]
pub struct NodeDescriptor {
    pub name: &'static str,
    pub display_name: &'static str,
    pub category: &'static str,
    pub inputs: Vec<NodeInput>,
    pub return_types: Vec<&'static str>,
    pub return_names: Vec<&'static str>,
}

impl NodeDescriptor {
    pub fn translate_large_file() -> Self {
        Self {
            name: NODE_NAME,
            display_name: DISPLAY_NAME,
            category: CATEGORY,
            inputs: vec![
                NodeInput {
                    name: "input_file",
                    kind: "STRING",
                    required: true,
                    widget: json!({ "default": DEFAULT_INPUT_FILE }),
                },
                NodeInput {
                    name: "output_file",
                    kind: "STRING",
                    required: true,
                    widget: json!({ "default": DEFAULT_OUTPUT_FILE }),
                },
                NodeInput {
                    name: "chunk_size",
                    kind: "INT",
                    required: true,
                    widget: json!({
                        "default": DEFAULT_CHUNK_SIZE,
                        "min": MIN_CHUNK_SIZE,
                        "max": MAX_CHUNK_SIZE,
                        "step": CHUNK_SIZE_STEP,
                    }),
                },
                NodeInput {
                    name: "system_prompt",
                    kind: "STRING",
                    required: true,
                    widget: json!({ "multiline": true, "default": DEFAULT_SYSTEM_PROMPT }),
                },
                NodeInput {
                    name: "connectivity",
                    kind: CONNECTIVITY_TYPE,
                    required: false,
                    widget: json!({ "forceInput": true, "tooltip": "Подключение Ollama Connectivity" }),
                },
                NodeInput {
                    name: "options",
                    kind: OPTIONS_TYPE,
                    required: false,
                    widget: json!({
                        "forceInput": false,
                        "tooltip": "Ollama Options (temperature, top_p, etc.)",
                    }),
                },
            ],
            return_types: vec!["STRING"],
            return_names: vec!["output_path"],
        }
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
