//! `volcamatic`: load samples and erase slots in a single Syro stream

use std::process::ExitCode;

use volcamatic::cli::{self, Tool};

fn main() -> ExitCode {
    cli::main(Tool::Combined)
}
