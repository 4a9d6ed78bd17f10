//! `volcaload`: sample uploader for the Korg Volca Sample

use std::process::ExitCode;

use volcamatic::cli::{self, Tool};

fn main() -> ExitCode {
    cli::main(Tool::Load)
}
