//! Command-line argument parsing for the volca tools.
//!
//! All three front-ends share one argument model:
//! - Positional arguments (slot selections for the eraser, sample files otherwise)
//! - Output path and table printing
//! - Strict duplicate handling, compression depth and JSON summaries
//! - Help text generation

use std::env;
use std::fmt;
use std::path::PathBuf;

use crate::pipeline::DEFAULT_OUTPUT;

/// Which front-end is running.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tool {
    /// Erase slots given as numbers or intervals
    Erase,
    /// Load sample files into the slots named by their prefixes
    Load,
    /// Load sample files and erase selections in one stream
    Combined,
}

impl Tool {
    /// Binary name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Tool::Erase => "volcaerase",
            Tool::Load => "volcaload",
            Tool::Combined => "volcamatic",
        }
    }

    /// Whether positional arguments are sample files.
    pub fn loads_files(&self) -> bool {
        !matches!(self, Tool::Erase)
    }
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parsed command-line arguments.
#[derive(Debug)]
pub struct CliArgs {
    /// Front-end the arguments were parsed for
    pub tool: Tool,
    /// Output WAV path
    pub output: PathBuf,
    /// Print the 10x10 slot map before converting
    pub print_table: bool,
    /// Whether help was requested (or the arguments were unusable)
    pub show_help: bool,
    /// Enable debug diagnostics
    pub verbose: bool,
    /// Reject a slot claimed twice instead of keeping the later claim
    pub strict: bool,
    /// Print the batch summary as JSON when done
    pub json: bool,
    /// Compression depth for loaded samples (None = linear 16-bit)
    pub compress: Option<u8>,
    /// Erase selections given with `-e` (combined tool)
    pub erase: Vec<String>,
    /// Positional arguments
    pub inputs: Vec<String>,
}

impl CliArgs {
    /// Defaults for `tool`.
    pub fn new(tool: Tool) -> Self {
        Self {
            tool,
            output: PathBuf::from(DEFAULT_OUTPUT),
            print_table: false,
            show_help: false,
            verbose: false,
            strict: false,
            json: false,
            compress: None,
            erase: Vec::new(),
            inputs: Vec::new(),
        }
    }

    /// Parse arguments from command line.
    pub fn parse(tool: Tool) -> Self {
        Self::parse_from(tool, env::args().skip(1))
    }

    /// Parse arguments from any iterator (program name excluded).
    pub fn parse_from<I, S>(tool: Tool, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut parsed = Self::new(tool);
        let mut iter = args.into_iter().map(Into::into);
        let mut positional_only = false;

        while let Some(arg) = iter.next() {
            if positional_only {
                parsed.inputs.push(arg);
                continue;
            }

            match arg.as_str() {
                "--" => positional_only = true,
                "-h" | "--help" => parsed.show_help = true,
                "-t" | "--table" => parsed.print_table = true,
                "-v" | "--verbose" => parsed.verbose = true,
                "--strict" => parsed.strict = true,
                "--json" => parsed.json = true,
                "-o" | "--output" => match iter.next() {
                    Some(value) => parsed.output = PathBuf::from(value),
                    None => parsed.missing_value(&arg),
                },
                "-c" | "--compress" if tool.loads_files() => match iter.next() {
                    Some(value) => parsed.set_compress(&value),
                    None => parsed.missing_value(&arg),
                },
                "-e" | "--erase" if tool == Tool::Combined => match iter.next() {
                    Some(value) => parsed.erase.push(value),
                    None => parsed.missing_value(&arg),
                },
                _ if arg.starts_with("--output=") => {
                    parsed.output = PathBuf::from(&arg["--output=".len()..]);
                }
                _ if arg.starts_with("--compress=") && tool.loads_files() => {
                    parsed.set_compress(&arg["--compress=".len()..]);
                }
                _ if arg.starts_with("--erase=") && tool == Tool::Combined => {
                    parsed.erase.push(arg["--erase=".len()..].to_string());
                }
                // Negative numbers are slot selections (rejected later as out of range)
                _ if tool == Tool::Erase && looks_numeric(&arg) => parsed.inputs.push(arg),
                _ if arg.starts_with('-') && arg.len() > 1 => {
                    eprintln!("Unknown flag: {}", arg);
                    parsed.show_help = true;
                }
                _ => parsed.inputs.push(arg),
            }
        }

        parsed
    }

    fn missing_value(&mut self, flag: &str) {
        eprintln!("{} requires an argument", flag);
        self.show_help = true;
    }

    fn set_compress(&mut self, value: &str) {
        match value.parse::<u8>() {
            Ok(bits) => self.compress = Some(bits),
            Err(_) => {
                eprintln!("Invalid compression depth: {}", value);
                self.show_help = true;
            }
        }
    }

    /// Help text for `tool`.
    pub fn help_text(tool: Tool) -> String {
        let mut text = match tool {
            Tool::Erase => format!(
                "Usage: {} [OPTIONS] samples...\n\
                 Sample eraser for Korg Volca Sample\n\n\
                 Samples are slot numbers (0-99) or intervals, e.g. 5, 10-19, 42-40\n",
                tool
            ),
            Tool::Load | Tool::Combined => format!(
                "Usage: {} [OPTIONS] sample1 sample2 ...\n\
                 Sample uploader for Korg Volca Sample\n\n\
                 Sample names must begin with a number from 0 to 99 to be used as\n\
                 the sample number, e.g., 001_kick.wav, 02-fx.wav, 5-hihat.wav\n",
                tool
            ),
        };

        text.push_str(
            "\nOptional arguments:\n\
             \x20 -o, --output FILE    specify the output file name (default: \"syro.wav\")\n\
             \x20 -t, --table          print a table with the samples to modify\n",
        );
        if tool == Tool::Combined {
            text.push_str(
                "\x20 -e, --erase SLOTS    erase a slot or interval (repeatable)\n",
            );
        }
        if tool.loads_files() {
            text.push_str(
                "\x20 -c, --compress BITS  store samples compressed to BITS bits (8-16)\n",
            );
        }
        text.push_str(
            "\x20     --strict         reject slots claimed more than once\n\
             \x20     --json           print a JSON summary of the batch\n\
             \x20 -v, --verbose        print debug diagnostics to stderr\n\
             \x20 -h, --help           print this help message\n",
        );
        text
    }

    /// Print help text to stdout.
    pub fn print_help(tool: Tool) {
        println!("\n{}", Self::help_text(tool));
    }
}

fn looks_numeric(arg: &str) -> bool {
    arg.strip_prefix('-')
        .and_then(|rest| rest.chars().next())
        .is_some_and(|c| c.is_ascii_digit())
}
