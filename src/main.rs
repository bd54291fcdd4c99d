use clap::Parser;
use niftyshop::cli::{run, Cli};

fn main() -> std::process::ExitCode {
    run(Cli::parse())
}
