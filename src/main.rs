use clap::Parser;
use kumo::cli::{run, Cli};

fn main() -> std::process::ExitCode {
    run(Cli::parse())
}
