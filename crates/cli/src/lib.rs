//! Command-line surface for hookgen.

use clap::{CommandFactory, Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

mod commands;

#[derive(Parser, Debug)]
#[command(
    name = "hookgen",
    version,
    about = "Generate TanStack Query hooks from an OpenAPI document"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate the client and hook modules
    Generate(commands::generate::GenerateArgs),
    /// List the routes a document produces
    Routes(commands::routes::RoutesArgs),
}

/// Parse `args` (program name first), run the command and return the exit code.
pub fn run_cli(args: Vec<String>) -> i32 {
    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(err) => {
            eprintln!("Failed to create tokio runtime: {err}");
            return 1;
        }
    };

    runtime.block_on(run_cli_async(args))
}

async fn run_cli_async(args: Vec<String>) -> i32 {
    match Cli::try_parse_from(args) {
        Ok(cli) => match cli.command {
            Some(Commands::Generate(args)) => commands::generate::run(args).await,
            Some(Commands::Routes(args)) => commands::routes::run(args).await,
            None => {
                let mut cmd = Cli::command();
                let _ = cmd.print_help();
                println!();
                0
            }
        },
        Err(e) => {
            let code = e.exit_code();
            let _ = e.print();
            code
        }
    }
}

/// Install the stderr subscriber.
///
/// `HOOKGEN_LOG` takes a plain level ("debug") applied to the hookgen crates,
/// or a full filter spec like "hookgen_core=trace,reqwest=debug".
pub fn init_tracing() {
    let filter = match std::env::var("HOOKGEN_LOG") {
        Ok(level) if is_plain_level(&level) => crate_filter(&level),
        Ok(spec) => spec,
        Err(_) => crate_filter("warn"),
    };

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_filter(EnvFilter::new(filter));

    if tracing_subscriber::registry()
        .with(fmt_layer)
        .try_init()
        .is_err()
    {
        eprintln!("Warning: tracing subscriber already initialized");
    }
}

fn crate_filter(level: &str) -> String {
    format!("hookgen_core={level},hookgen_cli={level}")
}

fn is_plain_level(s: &str) -> bool {
    matches!(
        s.to_ascii_lowercase().as_str(),
        "trace" | "debug" | "info" | "warn" | "error"
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args.iter().map(|arg| (*arg).to_string())).unwrap()
    }

    #[test]
    fn test_parse_generate_flags() {
        let cli = parse(&[
            "hookgen",
            "generate",
            "--input",
            "openapi.yaml",
            "--grouping",
            "tag",
            "--check",
        ]);
        let Some(Commands::Generate(args)) = cli.command else {
            unreachable!("expected generate");
        };
        assert_eq!(args.source.input.as_deref(), Some("openapi.yaml"));
        assert_eq!(args.grouping, Some(hookgen_core::Grouping::Tag));
        assert!(args.check);
        assert!(!args.strict);
    }

    #[test]
    fn test_unknown_grouping_is_rejected() {
        let err = Cli::try_parse_from(["hookgen", "generate", "--grouping", "path"]).unwrap_err();
        assert!(err.to_string().contains("unknown grouping `path`"));
    }

    #[test]
    fn test_plain_levels() {
        assert!(is_plain_level("DEBUG"));
        assert!(!is_plain_level("hookgen_core=debug"));
        assert_eq!(crate_filter("info"), "hookgen_core=info,hookgen_cli=info");
    }
}
