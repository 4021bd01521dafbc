use clap::Parser;
use std::process::ExitCode;

mod args;
mod call;
mod platform;
mod printer;

pub(crate) use self::args::*;
pub(crate) use self::call::*;
pub(crate) use self::platform::*;
pub(crate) use self::printer::*;

#[derive(clap::Parser)]
#[clap(version)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Show the platform of this host.
    Platform,
    /// Show local files and packages in the order they are tried.
    Candidates(ResolverArgs),
    /// Load the native module and show where it was loaded from.
    Resolve(ResolverArgs),
    /// Load the native module and call one of its operations.
    Call(CallArgs),
}

fn main() -> ExitCode {
    do_main()
        .inspect_err(|e| eprintln!("{e}"))
        .unwrap_or(ExitCode::FAILURE)
}

fn do_main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let args = Args::parse();
    env_logger::init();
    match args.command {
        Command::Platform => platform()?,
        Command::Candidates(args) => candidates(args)?,
        Command::Resolve(args) => resolve(args)?,
        Command::Call(args) => call(args)?,
    }
    Ok(ExitCode::SUCCESS)
}
