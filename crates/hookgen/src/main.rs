//! `hookgen` executable.

fn main() {
    hookgen_cli::init_tracing();
    let code = hookgen_cli::run_cli(std::env::args().collect());
    std::process::exit(code);
}
