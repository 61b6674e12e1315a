#![allow(clippy::print_stderr)]

use anyhow::Context;
use clap::Parser;
use std::io::Write;

use trc_cli::args::{CliArgs, ReportFormat};
use trc_cli::driver;
use trc_cli::{tracing_config, watch};

fn main() {
    tracing_config::init_tracing();
    let args = CliArgs::parse();

    let code = match run(&args) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            driver::exit_code_for_error(&err)
        }
    };
    std::process::exit(code);
}

fn run(args: &CliArgs) -> anyhow::Result<i32> {
    let cwd = std::env::current_dir().context("failed to resolve current directory")?;

    // Text reports go with other human output on stderr; machine formats
    // go to stdout so they can be piped.
    let code = if args.format == ReportFormat::Text {
        let mut stderr = std::io::stderr().lock();
        dispatch(args, &cwd, &mut stderr)?
    } else {
        let mut stdout = std::io::stdout().lock();
        let code = dispatch(args, &cwd, &mut stdout)?;
        stdout.flush().context("failed to flush report")?;
        code
    };
    Ok(code)
}

fn dispatch(args: &CliArgs, cwd: &std::path::Path, out: &mut dyn Write) -> anyhow::Result<i32> {
    if args.watch {
        watch::run(args, cwd, out)
    } else {
        driver::run(args, cwd, out)
    }
}
