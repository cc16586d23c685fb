use clap::Parser;
use strategraph::cli::{run, Cli};

fn main() -> std::process::ExitCode {
    run(Cli::parse())
}
