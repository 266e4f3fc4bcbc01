//! `score-drift` binary entry point.

use clap::Parser;
use tracing::error;

use sd_core::cli::Cli;
use sd_core::logging::init_logging;
use sd_core::ExitCode;

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.verbose, cli.quiet);

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let code = match cli.execute(&mut out) {
        Ok(code) => code,
        Err(err) => {
            error!(code = err.code(), "{err}");
            eprintln!("score-drift: {err}");
            ExitCode::from(&err)
        }
    };
    std::process::ExitCode::from(code.as_i32() as u8)
}
