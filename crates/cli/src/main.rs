use anyhow::Result;
use clap::{Parser, Subcommand};
use ffi_lens::commands::{
    annotate_command, evaluate_command, extract_command, slices_command, AnnotateOptions,
};
use ffi_lens_core::model::SourceLanguage;
use ffi_lens_core::slicer::DEFAULT_MAX_FUNCS_PER_BATCH;

/// Rust/C FFI attack-classification toolkit.
///
/// This CLI is a thin wrapper around `ffi-lens-core` (exposed in code as `ffi_lens_core`).
#[derive(Parser, Debug)]
#[command(
    name = "ffi-lens",
    version,
    about = "Extract, classify and evaluate Rust/C FFI functions",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable debug logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log only warnings and errors.
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Extract functions, extern blocks and unsafe blocks from a source tree.
    ///
    /// Writes one JSON array per language.
    Extract {
        /// Source directory to walk.
        #[arg(long)]
        src: String,

        /// Output JSON for Rust items.
        #[arg(long, default_value = "rust_snippets.json")]
        rust_out: String,

        /// Output JSON for C items.
        #[arg(long, default_value = "c_snippets.json")]
        c_out: String,
    },

    /// List the function slices the annotator would send.
    Slices {
        /// Source file to slice.
        #[arg(long)]
        code: String,

        /// Language of the source file (`c` or `rust`).
        #[arg(long)]
        language: SourceLanguage,

        /// Maximum functions per batch.
        #[arg(long, default_value_t = DEFAULT_MAX_FUNCS_PER_BATCH)]
        max_funcs: usize,

        /// Emit JSON instead of human-readable text.
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Classify functions with a language model and write annotated code plus CSV.
    Annotate {
        /// Parser JSON produced by `extract`.
        #[arg(long)]
        parser_json: String,

        /// Source file to classify.
        #[arg(long)]
        code: String,

        /// Language of the source file (`c` or `rust`).
        #[arg(long)]
        language: SourceLanguage,

        /// API key; defaults to the environment variable named in the config (OPENAI_API_KEY).
        #[arg(long)]
        api_key: Option<String>,

        /// Model name (default: gpt-4o-mini).
        #[arg(long)]
        model: Option<String>,

        /// YAML or JSON annotator config.
        #[arg(long)]
        config: Option<String>,

        /// File name for the annotated code (placed in the output dir).
        #[arg(long)]
        output: Option<String>,

        /// File name for the CSV report (placed in the output dir).
        #[arg(long)]
        csv_output: Option<String>,

        /// Skip writing the annotated source file.
        #[arg(long, default_value_t = false)]
        no_annotate: bool,

        /// Maximum functions sent in one request.
        #[arg(long)]
        max_funcs: Option<usize>,

        /// Output directory (default: llm_output).
        #[arg(long)]
        output_dir: Option<String>,
    },

    /// Score predictions against ground truth.
    Evaluate {
        /// Ground-truth CSV.
        #[arg(long)]
        ground_truth: String,

        /// Predictions CSV (`function_name,attack_type`).
        #[arg(long)]
        predictions: String,

        /// Also write the ground-truth rows that were evaluated to this CSV.
        #[arg(long)]
        save_subset: Option<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if cli.quiet {
        builder.filter_level(log::LevelFilter::Warn);
    } else if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.target(env_logger::Target::Stderr).init();

    match cli.command {
        Command::Extract { src, rust_out, c_out } => extract_command(&src, &rust_out, &c_out)?,
        Command::Slices { code, language, max_funcs, json } => {
            slices_command(&code, language, max_funcs, json)?
        }
        Command::Annotate {
            parser_json,
            code,
            language,
            api_key,
            model,
            config,
            output,
            csv_output,
            no_annotate,
            max_funcs,
            output_dir,
        } => {
            let options = AnnotateOptions {
                parser_json,
                code,
                language: Some(language),
                api_key,
                model,
                config,
                output,
                csv_output,
                no_annotate,
                max_funcs,
                output_dir,
            };
            annotate_command(&options)?;
        }
        Command::Evaluate { ground_truth, predictions, save_subset } => {
            evaluate_command(&ground_truth, &predictions, save_subset.as_deref())?
        }
    }

    Ok(())
}
