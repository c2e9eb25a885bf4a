use std::{path::PathBuf, process::ExitCode};

use clap::Parser;

mod assembler;
mod common;
mod compiler;
mod fileio;
mod pipeline;
mod translator;

/// Jack-to-Hack toolchain: compiles `.jack` classes to VM code, translates
/// VM code to assembly, and assembles it into `.hack` binary images.
#[derive(Parser)]
#[clap(version, about)]
struct Args {
    /// Source file (`.jack`, `.vm` or `.asm`) or a directory of sources.
    path: PathBuf,

    /// Reject unknown C-instruction mnemonics instead of encoding them
    /// as zero bits.
    #[clap(long)]
    strict: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();

    match pipeline::run(&args.path, args.strict) {
        Ok(artifacts) => {
            for artifact in artifacts {
                println!("generated `{}`", artifact.display());
            }
            ExitCode::SUCCESS
        }
        Err(error) => {
            report(&error);
            ExitCode::FAILURE
        }
    }
}

fn report(error: &pipeline::Error) {
    match error {
        pipeline::Error::Io(error) => eprintln!("io error: {error}"),
        pipeline::Error::NoSources(path) => {
            eprintln!("no source files found in `{}`", path.display());
        }
        pipeline::Error::UnsupportedInput(path) => {
            eprintln!(
                "`{}` is not a supported input (expected `.jack`, `.vm` or `.asm`)",
                path.display()
            );
        }
        pipeline::Error::Compile { source, error } => {
            error_report::display(&source.path().to_string_lossy(), source.content(), error);
        }
        pipeline::Error::Translate(error) => eprintln!("translation error: {error}"),
        pipeline::Error::Assemble(error) => eprintln!("assembly error: {error}"),
    }
}

mod error_report {
    use ariadne::{Label, Report, ReportKind, Source};

    use crate::compiler::error::Error;

    pub fn display(file_path: &str, file_content: &str, error: &Error) {
        match error {
            Error::Lex(errors) => {
                for error in errors {
                    print_report(file_path, file_content, error.span(), &error.to_string());
                }
            }
            Error::Syntax(error) => {
                print_report(
                    file_path,
                    file_content,
                    error.span.clone(),
                    &error.to_string(),
                );
            }
        }
    }

    fn print_report(
        file_path: &str,
        file_content: &str,
        span: std::ops::Range<usize>,
        message: &str,
    ) {
        let result = Report::build(ReportKind::Error, file_path, span.start)
            .with_message("Compilation error")
            .with_label(Label::new((file_path, span)).with_message(message))
            .finish()
            .eprint((file_path, Source::from(file_content)));

        if let Err(error) = result {
            eprintln!("{file_path}: {message} (report rendering failed: {error})");
        }
    }
}
