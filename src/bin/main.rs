use std::{fs, path::PathBuf, process::ExitCode};

use clap::Parser;
use tav::{
    session::{self, Options},
    util::fmt::report::Reporter,
};

#[derive(Parser)]
#[command(name = "tavc", version, about = "The tav compiler front end")]
struct Cli {
    /// Source file to compile.
    #[arg(value_name = "FILE")]
    input: PathBuf,

    /// Artifact printed to standard output.
    #[arg(long, value_enum, default_value_t = Emit::Ir)]
    emit: Emit,

    /// Raises the log level; repeat for more detail. `RUST_LOG` still applies.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Copy, Clone, PartialEq, Eq, clap::ValueEnum)]
#[clap(rename_all = "snake_case")]
enum Emit {
    Tokens,
    Ast,
    Ir,
}

impl From<Emit> for session::Emit {
    fn from(value: Emit) -> Self {
        match value {
            Emit::Tokens => session::Emit::Tokens,
            Emit::Ast => session::Emit::Ast,
            Emit::Ir => session::Emit::Ir,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    let src = match fs::read_to_string(&cli.input) {
        Ok(src) => src,
        Err(error) => {
            eprintln!("failed to read {}: {error}", cli.input.display());
            return ExitCode::FAILURE;
        }
    };

    let options = Options {
        file_name: cli.input.display().to_string(),
        emit: cli.emit.into(),
    };
    let reporter = Reporter::new(&options.file_name, &src);

    match session::compile(&src, &options) {
        Ok(output) => {
            for warning in &output.warnings {
                eprintln!("{}\n", reporter.render(warning));
            }
            print!("{}", output.artifact);
            ExitCode::SUCCESS
        }
        Err(error) => {
            eprintln!("{}", error.render(&reporter));
            let code = u8::try_from(error.exit_code()).unwrap_or(u8::MAX);
            ExitCode::from(code)
        }
    }
}

fn setup_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}
