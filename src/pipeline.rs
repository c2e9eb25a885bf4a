//! Driving the three stages over concrete files on disk.
//!
//! The input path decides where the pipeline starts: `.jack` sources run
//! the full chain, `.vm` units skip straight to translation, a `.asm`
//! file only gets assembled. Every stage's textual artifact is written
//! as a sibling of the input before the next stage consumes it.

use std::{
    io,
    path::{Path, PathBuf},
};

use crate::{
    assembler::{self, AssembleError},
    compiler,
    fileio::{
        input::{self, SourceFile},
        output::{self, OutputFile},
    },
    translator::{self, TranslateError},
};

#[derive(Debug)]
pub enum Error {
    Io(io::Error),
    /// The input path is a directory with no usable source files in it.
    NoSources(PathBuf),
    /// The input file's extension does not match any pipeline stage.
    UnsupportedInput(PathBuf),
    Compile {
        source: SourceFile,
        error: compiler::error::Error,
    },
    Translate(TranslateError),
    Assemble(AssembleError),
}

impl From<io::Error> for Error {
    fn from(error: io::Error) -> Self {
        Self::Io(error)
    }
}

/// Run the pipeline over `path`, returning the paths of every artifact
/// written, in generation order.
pub fn run(path: &Path, strict: bool) -> Result<Vec<PathBuf>, Error> {
    if path.is_dir() {
        let jack_sources = input::collect_sources(path, "jack")?;
        if !jack_sources.is_empty() {
            return run_from_jack(path, jack_sources, strict);
        }

        let vm_sources = input::collect_sources(path, "vm")?;
        if !vm_sources.is_empty() {
            return run_from_vm(path, vm_sources, strict);
        }

        return Err(Error::NoSources(path.to_path_buf()));
    }

    match path.extension().and_then(|ext| ext.to_str()) {
        Some("jack") => run_from_jack(path, vec![SourceFile::load(path)?], strict),
        Some("vm") => run_from_vm(path, vec![SourceFile::load(path)?], strict),
        Some("asm") => {
            let source = SourceFile::load(path)?;
            run_from_asm(path, source.content(), strict, Vec::new())
        }
        _ => Err(Error::UnsupportedInput(path.to_path_buf())),
    }
}

/// Stages 1–3: compile every class, then hand the `.vm` units on.
fn run_from_jack(
    path: &Path,
    sources: Vec<SourceFile>,
    strict: bool,
) -> Result<Vec<PathBuf>, Error> {
    let mut artifacts = Vec::new();
    let mut units = Vec::new();

    for source in sources {
        let (source, output_file) = compile_source(source)?;

        artifacts.push(output::generate_sibling(
            source.path(),
            output_file.content(),
            "vm",
        )?);
        units.push(output_file);
    }

    run_translation(path, &units, strict, artifacts)
}

/// Stages 2–3 over already-compiled `.vm` units.
fn run_from_vm(
    path: &Path,
    sources: Vec<SourceFile>,
    strict: bool,
) -> Result<Vec<PathBuf>, Error> {
    let units: Vec<_> = sources
        .iter()
        .map(|source| OutputFile::new(source.unit_name(), source.content().to_string()))
        .collect();

    run_translation(path, &units, strict, Vec::new())
}

fn run_translation(
    path: &Path,
    units: &[OutputFile],
    strict: bool,
    mut artifacts: Vec<PathBuf>,
) -> Result<Vec<PathBuf>, Error> {
    let assembly = translator::translate(units.iter().map(|unit| (unit.name(), unit.content())))
        .map_err(Error::Translate)?;

    let asm_path = output::generate_sibling(path, &assembly, "asm")?;
    artifacts.push(asm_path);

    run_from_asm(path, &assembly, strict, artifacts)
}

/// Stage 3 alone.
fn run_from_asm(
    path: &Path,
    assembly: &str,
    strict: bool,
    mut artifacts: Vec<PathBuf>,
) -> Result<Vec<PathBuf>, Error> {
    let binary = assembler::assemble(assembly, strict).map_err(Error::Assemble)?;

    artifacts.push(output::generate_sibling(path, &binary, "hack")?);

    Ok(artifacts)
}

/// Compile one class, keeping the source alongside the error so failed
/// compilations can be reported against their origin.
fn compile_source(source: SourceFile) -> Result<(SourceFile, OutputFile), Error> {
    match compiler::compile(&source) {
        Ok(output_file) => Ok((source, output_file)),
        Err(error) => Err(Error::Compile { source, error }),
    }
}
