//! Front-ends shared by the `volcaerase`, `volcaload` and `volcamatic` binaries
//!
//! Progress is printed to stdout line by line; internal diagnostics go
//! through `tracing` to stderr.

pub mod args;

use std::io::{self, IsTerminal, Write};
use std::path::Path;
use std::process::ExitCode;

use anyhow::Context;

pub use args::{CliArgs, Tool};

use crate::encoder::StreamEncoder;
use crate::loader::LoadReport;
use crate::pipeline::{PipelineConfig, PreparedBatch};
use crate::slots::{parse_selection, ConflictPolicy, SampleEncoding, SlotGrid, SlotTable};
use crate::VolcaError;

/// How a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    /// Output written
    Success,
    /// Nothing written; the reason was printed
    Failure,
}

impl From<RunStatus> for ExitCode {
    fn from(status: RunStatus) -> Self {
        match status {
            RunStatus::Success => ExitCode::SUCCESS,
            RunStatus::Failure => ExitCode::FAILURE,
        }
    }
}

/// Entry point used by the binaries
pub fn main(tool: Tool) -> ExitCode {
    let args = CliArgs::parse(tool);
    init_tracing(args.verbose);

    if args.show_help {
        CliArgs::print_help(tool);
        return ExitCode::FAILURE;
    }

    match run(&args) {
        Ok(status) => status.into(),
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// Install the stderr diagnostics subscriber (WARN, or DEBUG when verbose)
pub fn init_tracing(verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    // A subscriber may already be installed (tests); keep the existing one
    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

/// Run with the encoder this build was compiled for
pub fn run(args: &CliArgs) -> anyhow::Result<RunStatus> {
    #[cfg(feature = "korg-sdk")]
    let mut encoder = crate::encoder::KorgSyroEncoder::new();

    #[cfg(not(feature = "korg-sdk"))]
    let mut encoder = {
        tracing::warn!("built without the korg-sdk feature; the output is a preview, not a Syro stream");
        crate::encoder::PreviewEncoder::new()
    };

    run_with(args, &mut encoder)
}

/// Run the front-end described by `args` against `encoder`
///
/// Invalid erase selections, an empty batch, an encoder that fails to start
/// and an unwritable output all end the run with a failure code. Sample files
/// that fail to load are reported and skipped.
pub fn run_with<E: StreamEncoder + ?Sized>(
    args: &CliArgs,
    encoder: &mut E,
) -> anyhow::Result<RunStatus> {
    let policy = if args.strict {
        ConflictPolicy::Strict
    } else {
        ConflictPolicy::LastWins
    };
    let mut table = SlotTable::with_policy(policy);

    let encoding = match args.compress.map(SampleEncoding::compressed).transpose() {
        Ok(encoding) => encoding.unwrap_or_default(),
        Err(e) => {
            println!("error! {}", e);
            return Ok(RunStatus::Failure);
        }
    };

    let selections: &[String] = match args.tool {
        Tool::Erase => &args.inputs,
        Tool::Combined => &args.erase,
        Tool::Load => &[],
    };
    for arg in selections {
        let marked = parse_selection(arg).and_then(|selection| table.mark_selection(&selection));
        if let Err(e) = marked {
            println!("{}", selection_error(arg, &e));
            return Ok(RunStatus::Failure);
        }
    }

    let mut report = LoadReport::default();
    if args.tool.loads_files() {
        for path in &args.inputs {
            let path = Path::new(path);
            print!(
                "loading {}... ",
                path.file_name().unwrap_or(path.as_os_str()).to_string_lossy()
            );
            io::stdout().flush().context("Failed to flush stdout")?;

            let outcome = report.load(&mut table, path, encoding);
            match &outcome.result {
                Ok(loaded) => println!("ok! [{} bytes] [N={}]", loaded.bytes, loaded.slot),
                Err(e) => println!("error! {}", e),
            }
        }
        if !report.all_loaded() {
            tracing::debug!(skipped = report.failed().count(), "some samples were skipped");
        }
    }

    if table.is_empty() {
        match args.tool {
            Tool::Erase => println!("nothing to erase here"),
            Tool::Load | Tool::Combined => println!("nothing to load here"),
        }
        return Ok(RunStatus::Failure);
    }

    if args.print_table {
        print!("{}", SlotGrid::new(&table).color(io::stdout().is_terminal()));
    }

    let config = PipelineConfig::default().output(&args.output);
    let batch = PreparedBatch::from_table(table).skipped(&report);

    let planned = batch.summary();
    if !planned.erased.is_empty() {
        println!("marking {} samples to be erased", planned.erased.len());
    }
    if !planned.loaded.is_empty() {
        println!(
            "found {} samples to load [{} bytes] [~{:.2}% memory]",
            planned.loaded.len(),
            planned.sample_bytes,
            planned.memory_percent
        );
    }

    print!("starting Syro stream conversion... ");
    io::stdout().flush().context("Failed to flush stdout")?;
    let rendered = match batch.render(encoder, &config) {
        Ok(rendered) => rendered,
        Err(e) => {
            println!("{}", e);
            return Ok(RunStatus::Failure);
        }
    };
    println!("ok!");

    print!("writing Syro output to {}... ", config.output.display());
    io::stdout().flush().context("Failed to flush stdout")?;
    let summary = match rendered.write(&config) {
        Ok(summary) => summary,
        Err(e) => {
            println!("{}", e);
            return Ok(RunStatus::Failure);
        }
    };
    println!("ok!");

    if args.json {
        let json = serde_json::to_string_pretty(&summary)
            .context("Failed to serialize batch summary")?;
        println!("{}", json);
    }

    Ok(RunStatus::Success)
}

/// Diagnostic for an erase selection that could not be applied
fn selection_error(arg: &str, err: &VolcaError) -> String {
    match err {
        // Already names the argument
        VolcaError::InvalidArgumentSyntax(_) => err.to_string(),
        _ => format!("invalid input: {} ({})", arg, err),
    }
}
