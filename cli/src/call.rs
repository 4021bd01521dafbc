use native_binding::NativeBinding;
use native_binding::Tier;
use native_binding::ToolOptions;

use crate::Printer;
use crate::ResolverArgs;

#[derive(thiserror::Error, Debug)]
pub enum CallError {
    #[error("`async_fib` thread panicked")]
    ThreadPanicked,
}

#[derive(clap::Args)]
pub struct CallArgs {
    #[clap(flatten)]
    resolver: ResolverArgs,

    #[command(subcommand)]
    operation: Operation,
}

#[derive(clap::Subcommand)]
enum Operation {
    /// Add two numbers.
    Sum { a: i32, b: i32 },
    /// Subtract two numbers.
    Sub { a: i32, b: i32 },
    /// Concatenate two strings.
    ConcatStr { a: String, b: String },
    /// Pass options through the module.
    GetOptions { id: i32, name: String },
    /// Compute Fibonacci number in a separate thread.
    AsyncFib {
        n: u32,

        /// Memoize intermediate results.
        #[clap(action, long = "use-cache")]
        use_cache: bool,
    },
    /// Print every value the module sends to the callback.
    CallThreadsafeFunction,
}

pub fn resolve(args: ResolverArgs) -> Result<(), Box<dyn std::error::Error>> {
    let resolver = args.new_resolver();
    let mut printer = Printer::new();
    let result = resolver.resolve_inspect(|candidate, attempt| {
        let tier = match attempt.tier {
            Tier::Local => "local file",
            Tier::Package => "package",
        };
        match attempt.outcome {
            Ok(ref binding) => printer.ok(format_args!("{} ({tier})", binding.path().display())),
            Err(ref e) => printer.failed(format_args!("{} ({tier}): {e}", candidate.package_name)),
        }
    });
    printer.flush()?;
    result?;
    Ok(())
}

pub fn call(args: CallArgs) -> Result<(), Box<dyn std::error::Error>> {
    let binding: NativeBinding = args.resolver.new_resolver().resolve()?;
    let mut printer = Printer::new();
    match args.operation {
        Operation::Sum { a, b } => printer.line(binding.sum(a, b)),
        Operation::Sub { a, b } => printer.line(binding.sub(a, b)),
        Operation::ConcatStr { a, b } => printer.line(binding.concat_str(&a, &b)?),
        Operation::GetOptions { id, name } => {
            let options = binding.get_options(&ToolOptions { id, name })?;
            printer.kv("id", options.id);
            printer.kv("name", options.name);
        }
        Operation::AsyncFib { n, use_cache } => {
            let value = binding
                .async_fib(n, use_cache)
                .join()
                .map_err(|_| CallError::ThreadPanicked)?;
            printer.line(value);
        }
        Operation::CallThreadsafeFunction => {
            binding.call_threadsafe_function(|value| println!("{value}"));
        }
    }
    printer.flush()?;
    Ok(())
}
