use bento::cli::commands::{CompileOptions, cmd_banks, cmd_compile, cmd_validate};
use bento::cli::config::{Cli, Commands, load_config};
use clap::Parser;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let config = load_config(cli.config.as_deref());

    match cli.command {
        Commands::Compile {
            descriptor,
            output,
            format,
            trace,
            strict,
        } => {
            // Resolve settings: CLI > config > defaults
            let options = CompileOptions {
                output: output.or(config.output.path),
                format: format.unwrap_or(config.output.format),
                trace,
                strict: strict || config.compile.strict,
                grid: config.grid,
            };
            cmd_compile(&descriptor, &options)?;
        }
        Commands::Validate { descriptor } => {
            if !cmd_validate(&descriptor)? {
                std::process::exit(1);
            }
        }
        Commands::Banks => cmd_banks(),
    }

    Ok(())
}

/// Log to stderr; `RUST_LOG` wins over the `-v` count.
fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
