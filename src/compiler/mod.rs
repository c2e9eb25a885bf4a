//! Stage 1: compiling Jack source to Hack VM code, one class per file.

use crate::fileio::{input::SourceFile, output::OutputFile};

mod context;
mod engine;
pub mod error;
mod symbols;
pub mod tokenizer;

/// Compile one Jack compilation unit into its `.vm` output.
pub fn compile(source_file: &SourceFile) -> Result<OutputFile, error::Error> {
    let tokens = tokenizer::tokenize(source_file.content()).map_err(error::Error::Lex)?;

    let context = engine::Engine::new(&tokens)
        .compile_class()
        .map_err(error::Error::Syntax)?;

    Ok(OutputFile::new(
        source_file.unit_name(),
        context.output.compile(),
    ))
}
