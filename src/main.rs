use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use large_file_translator::node::NodeDescriptor;
use large_file_translator::pipeline::{init_default_config, Overrides, PipelineConfig};
use large_file_translator::progress::ConsoleProgress;
use large_file_translator::TranslationPipeline;

#[derive(Parser, Debug)]
#[command(name = "large-file-translator")]
#[command(about = "Translate a large text file chunk by chunk through an Ollama server", long_about = None)]
struct Args {
    /// Generate default config + prompt files, then exit
    #[arg(long)]
    init_config: bool,

    /// Directory to write config/prompt files (default: current directory)
    #[arg(long, value_name = "DIR")]
    init_config_dir: Option<PathBuf>,

    /// Overwrite existing config/prompt files when used with --init-config
    #[arg(long)]
    force: bool,

    /// Print the node descriptor (inputs, defaults, bounds) as JSON, then exit
    #[arg(long)]
    describe: bool,

    /// Input text file (default: novel_output.txt)
    #[arg(value_name = "INPUT")]
    input: Option<PathBuf>,

    /// Output text file (default: novel_output_russian.txt)
    #[arg(short, long, value_name = "OUTPUT")]
    output: Option<PathBuf>,

    /// Characters per chunk (500..=8000, step 100)
    #[arg(long)]
    chunk_size: Option<usize>,

    /// Prompt template file; every `{text}` is replaced with the chunk
    #[arg(long, value_name = "FILE")]
    system_prompt_file: Option<PathBuf>,

    /// Config file path (default: search for large-file-translator.toml upwards)
    #[arg(long, env = "LARGE_FILE_TRANSLATOR_CONFIG")]
    config: Option<PathBuf>,

    /// Ollama server URL
    #[arg(long)]
    url: Option<String>,

    /// Model name on the Ollama server
    #[arg(long)]
    model: Option<String>,

    /// How long the server keeps the model loaded
    #[arg(long, allow_negative_numbers = true)]
    keep_alive: Option<i64>,

    /// Unit for --keep-alive: "minutes", anything else means hours
    #[arg(long)]
    keep_alive_unit: Option<String>,

    /// Write each chunk's prompt and response to the trace dir
    #[arg(long)]
    trace_prompts: bool,

    /// Client-side request timeout in seconds (default: none)
    #[arg(long)]
    request_timeout_secs: Option<u64>,

    /// Suppress progress lines
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new("large_file_translator=info")
        }))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();

    if args.init_config {
        let dir = args
            .init_config_dir
            .clone()
            .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));
        let cfg_path = init_default_config(&dir, args.force).context("init default config")?;
        eprintln!("Wrote config: {}", cfg_path.display());
        return Ok(());
    }

    if args.describe {
        let json = NodeDescriptor::translate_large_file()
            .to_json_pretty()
            .context("serialize node descriptor")?;
        println!("{json}");
        return Ok(());
    }

    let overrides = Overrides {
        input_file: args.input,
        output_file: args.output,
        chunk_size: args.chunk_size,
        system_prompt_file: args.system_prompt_file,
        url: args.url,
        model: args.model,
        keep_alive: args.keep_alive,
        keep_alive_unit: args.keep_alive_unit,
        trace_prompts: args.trace_prompts.then_some(true),
        request_timeout_secs: args.request_timeout_secs,
    };
    let cfg = PipelineConfig::from_file_and_overrides(args.config, overrides)
        .context("build config")?;

    let progress = ConsoleProgress::new(!args.quiet);
    let mut pipeline = TranslationPipeline::connect(cfg, progress)?;
    let output = pipeline.run()?;
    println!("{}", output.display());
    Ok(())
}
